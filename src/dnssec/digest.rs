use std::fmt;

use ring::digest;

use crate::dns::name::Name;
use crate::dns::rdata::{Dnskey, Ds};

/// DS digest type algorithms (RFC 4034, 4509, 5933, 6605)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DigestType {
    /// SHA-1 (RFC 3658)
    Sha1 = 1,
    /// SHA-256 (RFC 4509)
    Sha256 = 2,
    /// GOST R 34.11-94 (RFC 5933)
    Gost94 = 3,
    /// SHA-384 (RFC 6605)
    Sha384 = 4,
}

impl DigestType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Sha1),
            2 => Some(Self::Sha256),
            3 => Some(Self::Gost94),
            4 => Some(Self::Sha384),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    fn ring_algorithm(&self) -> Option<&'static digest::Algorithm> {
        match self {
            Self::Sha1 => Some(&digest::SHA1_FOR_LEGACY_USE_ONLY),
            Self::Sha256 => Some(&digest::SHA256),
            Self::Sha384 => Some(&digest::SHA384),
            Self::Gost94 => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.ring_algorithm().is_some()
    }

    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 | Self::Gost94 => 32,
            Self::Sha384 => 48,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Option<Vec<u8>> {
        let alg = self.ring_algorithm()?;
        Some(digest::digest(alg, data).as_ref().to_vec())
    }
}

impl fmt::Display for DigestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Gost94 => write!(f, "GOST94"),
            Self::Sha384 => write!(f, "SHA384"),
        }
    }
}

/// Digest of `owner | DNSKEY RDATA` as published in the parent's DS (RFC 4034 5.1.4).
pub fn dnskey_digest(owner: &Name, key: &Dnskey, digest_type: DigestType) -> Option<Vec<u8>> {
    let mut data = owner.to_wire();
    data.extend_from_slice(&key.to_wire());
    digest_type.digest(&data)
}

/// True when `ds` authenticates `key` at `owner`.
///
/// Tag and algorithm only narrow the candidates; the digest bytes decide.
pub fn ds_matches_key(owner: &Name, ds: &Ds, key: &Dnskey) -> bool {
    if ds.key_tag != key.key_tag() || ds.algorithm != key.algorithm {
        return false;
    }
    let Some(digest_type) = DigestType::from_u8(ds.digest_type) else {
        return false;
    };
    match dnskey_digest(owner, key, digest_type) {
        Some(computed) => computed == ds.digest,
        None => false,
    }
}

/// A DS is usable when both its key algorithm and digest type are supported.
pub fn ds_is_supported(ds: &Ds) -> bool {
    let alg = super::DnsSecAlgorithm::from_u8(ds.algorithm).is_some_and(|a| a.is_supported());
    let digest = DigestType::from_u8(ds.digest_type).is_some_and(|d| d.is_supported());
    alg && digest
}
