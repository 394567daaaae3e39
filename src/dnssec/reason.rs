use thiserror::Error;

use crate::dns::name::Name;

/// Why a walk ended Bogus. Carried in the verdict, never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BogusReason {
    #[error("no DNSKEY at {zone} could be authenticated")]
    NoTrustedKeys { zone: Name },

    #[error("DS RRset at {name} has no valid signature")]
    DsSignatureInvalid { name: Name },

    #[error("NSEC3 proves a DS at {name} exists but none was validated")]
    DsProvenButUnverified { name: Name },

    #[error("NSEC3 records returned for {name} prove nothing")]
    AmbiguousDenial { name: Name },

    #[error("{name} is signed below a delegation proven insecure")]
    SignedUnderInsecureDelegation { name: Name },

    #[error("no valid signature over {name}")]
    TargetSignatureInvalid { name: Name },

    #[error("absence of {name} is not proven")]
    UnprovenNonExistence { name: Name },

    #[error("opt-out cannot prove absence of non-DS data at {name}")]
    OptOutNotApplicable { name: Name },
}
