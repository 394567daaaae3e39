use crate::dnssec::{DEFAULT_EDNS_PAYLOAD, TrustAnchor};
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Recursive resolver the walk sends its queries to (over TCP)
    pub upstream: SocketAddr,

    /// DS record the chain of trust starts from
    pub trust_anchor: TrustAnchor,

    /// Per-query timeout, covering connect, write and read
    pub query_timeout: Duration,

    /// EDNS UDP payload size advertised in queries
    pub edns_payload: u16,

    /// HTTP status server bind address (None = disabled)
    pub http_bind: Option<SocketAddr>,

    /// Per-query statistics file (None = disabled)
    pub stats_file: Option<PathBuf>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            upstream: SocketAddr::from(([127, 0, 0, 1], 53)),
            trust_anchor: TrustAnchor::root_default(),
            query_timeout: Duration::from_secs(5),
            edns_payload: DEFAULT_EDNS_PAYLOAD,
            http_bind: None,
            stats_file: None,
        }
    }
}

impl ValidatorConfig {
    /// Create a ValidatorConfig from environment variables
    /// Returns Err if any variable present is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(upstream) = lookup("CHAINWALK_UPSTREAM") {
            config.upstream = parse_upstream(&upstream)?;
        }

        if let Some(anchor) = lookup("CHAINWALK_TRUST_ANCHOR") {
            config.trust_anchor = anchor.parse()?;
        }

        if let Some(timeout_str) = lookup("CHAINWALK_QUERY_TIMEOUT") {
            config.query_timeout = parse_timeout(&timeout_str)?;
        }

        if let Some(payload) = lookup("CHAINWALK_EDNS_PAYLOAD") {
            config.edns_payload = payload
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPayloadSize(payload.clone()))?;
        }

        // HTTP server configuration
        if let Some(http_bind) = lookup("CHAINWALK_HTTP_BIND") {
            config.http_bind = parse_optional(&http_bind)
                .map(|addr| {
                    addr.parse()
                        .map_err(|_| ConfigError::InvalidHttpBindAddress(http_bind.clone()))
                })
                .transpose()?;
        }

        if let Some(stats_file) = lookup("CHAINWALK_STATS_FILE") {
            config.stats_file = parse_optional(&stats_file).map(PathBuf::from);
        }

        // Validate the final configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        // Timeout must be reasonable
        if self.query_timeout.as_secs() > 300 {
            return Err(ConfigError::InvalidTimeout(
                "Timeout too large (max 300 seconds)".to_string(),
            ));
        }

        if self.edns_payload < 512 {
            return Err(ConfigError::InvalidPayloadSize(format!(
                "{} is below the 512 byte minimum",
                self.edns_payload
            )));
        }

        if !self.trust_anchor.is_supported() {
            return Err(ConfigError::InvalidTrustAnchor(format!(
                "unsupported algorithm or digest type in {}",
                self.trust_anchor
            )));
        }

        Ok(())
    }
}

/// Parse an upstream address. Accepts `@addr` like dig and a bare IP (port 53).
pub fn parse_upstream(s: &str) -> Result<SocketAddr, ConfigError> {
    let trimmed = s.trim().trim_start_matches('@');
    if let Ok(addr) = trimmed.parse::<SocketAddr>() {
        return Ok(addr);
    }
    trimmed
        .parse::<std::net::IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ConfigError::InvalidUpstreamServer(s.to_string()))
}

/// Parse a whole number of seconds greater than zero
pub fn parse_timeout(s: &str) -> Result<Duration, ConfigError> {
    let timeout_secs = s
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTimeout(s.to_string()))?;
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout(
            "Timeout must be greater than 0".to_string(),
        ));
    }
    Ok(Duration::from_secs(timeout_secs))
}

/// `none`, `disabled` or an empty string switch a sink off
fn parse_optional(s: &str) -> Option<&str> {
    let s = s.trim();
    match s.to_lowercase().as_str() {
        "" | "none" | "disabled" => None,
        _ => Some(s),
    }
}
