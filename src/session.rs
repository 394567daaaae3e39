use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ValidatorConfig;
use crate::dns::{enums::DNSResourceType, name::Name};
use crate::dnssec::{ChainValidator, Validation, ValidationState};
use crate::error::Result;
use crate::metrics::ValidatorMetrics;
use crate::statlog::StatLog;
use crate::transport::{ObservedUpstream, TcpTransport};

/// Run one complete walk over its own upstream connection and count the outcome.
///
/// A walk that fails with an error is counted as Indeterminate.
pub async fn validate_once(
    config: &ValidatorConfig,
    metrics: &Arc<ValidatorMetrics>,
    statlog: Option<&Arc<StatLog>>,
    name: &Name,
    rtype: DNSResourceType,
) -> Result<Validation> {
    let result = walk(config, metrics, statlog, name, rtype).await;
    match &result {
        Ok(validation) => {
            info!("{} {}: end state {}", name, rtype, validation.state);
            metrics.record_validation(validation.state);
        }
        Err(e) => {
            warn!("{} {}: walk failed ({}): {}", name, rtype, e.kind(), e);
            metrics.record_validation(ValidationState::Indeterminate);
        }
    }
    result
}

async fn walk(
    config: &ValidatorConfig,
    metrics: &Arc<ValidatorMetrics>,
    statlog: Option<&Arc<StatLog>>,
    name: &Name,
    rtype: DNSResourceType,
) -> Result<Validation> {
    let transport =
        TcpTransport::connect(config.upstream, config.query_timeout, config.edns_payload).await?;
    let upstream = ObservedUpstream::new(transport, Arc::clone(metrics), statlog.cloned());
    ChainValidator::new(upstream, config.trust_anchor.clone())
        .validate(name, rtype)
        .await
}
