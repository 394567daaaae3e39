pub mod algorithm;
pub mod denial;
pub mod digest;
pub mod key_tag;
pub mod reason;
pub mod records;
pub mod trust_anchor;
pub mod verifier;
pub mod walker;

use std::fmt;

pub use algorithm::DnsSecAlgorithm;
pub use denial::{Nsec3Proof, classify, nsec3_hash};
pub use digest::{DigestType, dnskey_digest, ds_matches_key};
pub use key_tag::calculate_key_tag;
pub use reason::BogusReason;
pub use records::{RRset, RecordStore};
pub use trust_anchor::TrustAnchor;
pub use verifier::{signed_message, verify, verify_rrsig};
pub use walker::{ChainValidator, ZoneKeys};

/// Maximum iterations for NSEC3 (RFC 5155 10.3 with RFC 9276 in mind)
pub const MAX_NSEC3_ITERATIONS: u16 = 2500;

/// EDNS payload advertised on validator queries
pub const DEFAULT_EDNS_PAYLOAD: u16 = 2800;

/// DNSSEC validation state (RFC 4033 5)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ValidationState {
    /// Not evaluated yet, or the walk ended in an error
    #[default]
    Indeterminate,
    /// Unbroken chain from the trust anchor
    Secure,
    /// Provably outside DNSSEC coverage
    Insecure,
    /// Coverage expected but verification failed
    Bogus,
}

impl ValidationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationState::Indeterminate => "Indeterminate",
            ValidationState::Secure => "Secure",
            ValidationState::Insecure => "Insecure",
            ValidationState::Bogus => "Bogus",
        }
    }

    pub const ALL: [ValidationState; 4] = [
        ValidationState::Indeterminate,
        ValidationState::Secure,
        ValidationState::Insecure,
        ValidationState::Bogus,
    ];
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub state: ValidationState,
    /// Set only for a Secure positive answer
    pub rrset: Option<RRset>,
    /// Set only for Bogus
    pub reason: Option<BogusReason>,
}

impl Validation {
    pub fn secure(rrset: Option<RRset>) -> Self {
        Self {
            state: ValidationState::Secure,
            rrset,
            reason: None,
        }
    }

    pub fn insecure() -> Self {
        Self {
            state: ValidationState::Insecure,
            rrset: None,
            reason: None,
        }
    }

    pub fn bogus(reason: BogusReason) -> Self {
        Self {
            state: ValidationState::Bogus,
            rrset: None,
            reason: Some(reason),
        }
    }
}
