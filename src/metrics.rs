use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder,
    opts, proto::MetricType,
};
use serde_json::{Map, Value};

use crate::dns::enums::DNSResourceType;
use crate::dnssec::ValidationState;

/// Prometheus registry and collectors for the validator
pub struct ValidatorMetrics {
    registry: Registry,

    validations: IntCounterVec,
    upstream_queries: IntCounterVec,
    upstream_errors: IntCounter,
    upstream_latency: HistogramVec,
}

impl ValidatorMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let validations = IntCounterVec::new(
            opts!(
                "chainwalk_validations_total",
                "Completed validation walks by end state"
            ),
            &["state"],
        )?;

        let upstream_queries = IntCounterVec::new(
            opts!(
                "chainwalk_upstream_queries_total",
                "Queries sent to the upstream resolver by type"
            ),
            &["qtype"],
        )?;

        let upstream_errors = IntCounter::with_opts(opts!(
            "chainwalk_upstream_errors_total",
            "Upstream queries that failed in transport or decoding"
        ))?;

        let upstream_latency = HistogramVec::new(
            HistogramOpts::new(
                "chainwalk_upstream_latency_seconds",
                "Round trip time of upstream queries",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["qtype"],
        )?;

        registry.register(Box::new(validations.clone()))?;
        registry.register(Box::new(upstream_queries.clone()))?;
        registry.register(Box::new(upstream_errors.clone()))?;
        registry.register(Box::new(upstream_latency.clone()))?;

        // every state shows up in /stats from the start, even at zero
        for state in ValidationState::ALL {
            validations.with_label_values(&[state.as_str()]);
        }

        Ok(Self {
            registry,
            validations,
            upstream_queries,
            upstream_errors,
            upstream_latency,
        })
    }

    /// Count a finished walk. Walks that ended in an error count as Indeterminate.
    pub fn record_validation(&self, state: ValidationState) {
        self.validations.with_label_values(&[state.as_str()]).inc();
    }

    pub fn record_upstream_query(&self, qtype: DNSResourceType, elapsed: Duration, ok: bool) {
        let qtype = qtype.to_string();
        self.upstream_queries.with_label_values(&[qtype.as_str()]).inc();
        self.upstream_latency
            .with_label_values(&[qtype.as_str()])
            .observe(elapsed.as_secs_f64());
        if !ok {
            self.upstream_errors.inc();
        }
    }

    pub fn validations(&self, state: ValidationState) -> u64 {
        self.validations.with_label_values(&[state.as_str()]).get()
    }

    pub fn upstream_errors(&self) -> u64 {
        self.upstream_errors.get()
    }

    /// Flatten counters into `name.labelvalue` keys, e.g.
    /// `chainwalk_validations_total.Secure`. Histograms contribute their sample count.
    pub fn json_counters(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for family in self.registry.gather() {
            let name = family.name();
            for metric in family.get_metric() {
                let mut key = name.to_string();
                for label in metric.get_label() {
                    key.push('.');
                    key.push_str(label.value());
                }
                let value = match family.get_field_type() {
                    MetricType::COUNTER => metric.get_counter().value() as u64,
                    MetricType::HISTOGRAM => {
                        key.push_str(".count");
                        metric.get_histogram().get_sample_count()
                    }
                    _ => continue,
                };
                out.insert(key, Value::from(value));
            }
        }
        out
    }

    /// Export metrics in Prometheus text format
    pub fn prometheus_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_flatten_to_json() {
        let metrics = ValidatorMetrics::new().unwrap();
        metrics.record_validation(ValidationState::Secure);
        metrics.record_validation(ValidationState::Secure);
        metrics.record_upstream_query(DNSResourceType::DNSKEY, Duration::from_millis(3), true);
        metrics.record_upstream_query(DNSResourceType::DS, Duration::from_millis(3), false);

        let json = metrics.json_counters();
        assert_eq!(json["chainwalk_validations_total.Secure"], 2);
        assert_eq!(json["chainwalk_validations_total.Bogus"], 0);
        assert_eq!(json["chainwalk_upstream_queries_total.DNSKEY"], 1);
        assert_eq!(json["chainwalk_upstream_errors_total"], 1);
        assert_eq!(json["chainwalk_upstream_latency_seconds.DS.count"], 1);
    }

    #[test]
    fn test_prometheus_text_export() {
        let metrics = ValidatorMetrics::new().unwrap();
        metrics.record_validation(ValidationState::Bogus);
        let text = metrics.prometheus_text().unwrap();
        assert!(text.contains("chainwalk_validations_total{state=\"Bogus\"} 1"));
        assert!(text.contains("# TYPE chainwalk_upstream_errors_total counter"));
    }
}
