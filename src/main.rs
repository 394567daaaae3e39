use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use chainwalk::config::{ValidatorConfig, parse_timeout, parse_upstream};
use chainwalk::dns::{enums::DNSResourceType, name::Name};
use chainwalk::error::ConfigError;
use chainwalk::http_server::HttpServer;
use chainwalk::metrics::ValidatorMetrics;
use chainwalk::session::validate_once;
use chainwalk::statlog::StatLog;

fn cli() -> Command {
    Command::new("chainwalk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Walk the DNSSEC chain of trust from the root down to one RRset")
        .subcommand_required(true)
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("ADDRESS[:PORT]")
                .help("Upstream resolver, '@' prefix accepted")
                .global(true),
        )
        .arg(
            Arg::new("trust-anchor")
                .long("trust-anchor")
                .value_name("DS")
                .help("Root DS as '<keytag> <alg> <digesttype> <hex>'")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Per-query timeout")
                .global(true),
        )
        .arg(
            Arg::new("http-bind")
                .long("http-bind")
                .value_name("ADDRESS:PORT")
                .help("Status server address for 'serve'")
                .global(true),
        )
        .arg(
            Arg::new("stats-file")
                .long("stats-file")
                .value_name("PATH")
                .help("Append one line per upstream query to this file")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log the walk step by step")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate one name and type, then exit")
                .arg(Arg::new("name").required(true).value_name("NAME"))
                .arg(
                    Arg::new("type")
                        .value_name("TYPE")
                        .default_value("A"),
                ),
        )
        .subcommand(Command::new("serve").about("Run the HTTP status server until ctrl-c"))
}

/// Environment first, then command line flags on top
fn load_config(matches: &ArgMatches) -> Result<ValidatorConfig, ConfigError> {
    let mut config = ValidatorConfig::from_env()?;

    if let Some(server) = matches.get_one::<String>("server") {
        config.upstream = parse_upstream(server)?;
    }
    if let Some(anchor) = matches.get_one::<String>("trust-anchor") {
        config.trust_anchor = anchor.parse()?;
    }
    if let Some(timeout) = matches.get_one::<String>("timeout") {
        config.query_timeout = parse_timeout(timeout)?;
    }
    if let Some(bind) = matches.get_one::<String>("http-bind") {
        config.http_bind = Some(
            bind.parse()
                .map_err(|_| ConfigError::InvalidHttpBindAddress(bind.clone()))?,
        );
    }
    if let Some(path) = matches.get_one::<String>("stats-file") {
        config.stats_file = Some(PathBuf::from(path));
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&matches)?;
    let metrics = Arc::new(ValidatorMetrics::new()?);
    let statlog = config
        .stats_file
        .as_ref()
        .map(StatLog::open)
        .transpose()?
        .map(Arc::new);

    match matches.subcommand() {
        Some(("validate", sub)) => {
            let name: Name = sub
                .get_one::<String>("name")
                .map(String::as_str)
                .unwrap_or_default()
                .parse()?;
            let rtype: DNSResourceType = sub
                .get_one::<String>("type")
                .map(String::as_str)
                .unwrap_or("A")
                .parse()?;

            let validation = validate_once(&config, &metrics, statlog.as_ref(), &name, rtype).await?;
            println!("end state {}", validation.state);
            if let Some(reason) = &validation.reason {
                println!("reason: {}", reason);
            }
            if let Some(rrset) = &validation.rrset {
                for line in rrset.presentation() {
                    println!("{}", line);
                }
            }
        }
        Some(("serve", _)) => {
            let bind_addr = config
                .http_bind
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));
            let server = HttpServer::new(Arc::new(config), metrics, statlog, bind_addr);
            server.start().await?;
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
