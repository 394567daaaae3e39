use std::fmt;
use std::str::FromStr;

use super::digest::{DigestType, ds_is_supported};
use crate::dns::name::Name;
use crate::dns::rdata::Ds;
use crate::error::ConfigError;

/// Root KSK-2024 (key tag 20326), published by IANA
pub const ROOT_TRUST_ANCHOR: &str =
    "20326 8 2 E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D";

/// The one unconditionally trusted fact: a DS for the root zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pub zone: Name,
    pub ds: Ds,
}

impl TrustAnchor {
    pub fn root_default() -> Self {
        Self {
            zone: Name::root(),
            ds: Ds {
                key_tag: 20326,
                algorithm: 8,
                digest_type: 2,
                digest: vec![
                    0xE0, 0x6D, 0x44, 0xB8, 0x0B, 0x8F, 0x1D, 0x39, 0xA9, 0x5C, 0x0B, 0x0D, 0x7C,
                    0x65, 0xD0, 0x84, 0x58, 0xE8, 0x80, 0x40, 0x9B, 0xBC, 0x68, 0x34, 0x57, 0x10,
                    0x42, 0x37, 0xC7, 0xF8, 0xEC, 0x8D,
                ],
            },
        }
    }
}

impl Default for TrustAnchor {
    fn default() -> Self {
        Self::root_default()
    }
}

impl FromStr for TrustAnchor {
    type Err = ConfigError;

    /// `<keytag> <algorithm> <digesttype> <hex-digest>` for the root zone.
    /// The digest may be split by whitespace, as in zone files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| ConfigError::InvalidTrustAnchor(format!("{}: {}", why, s.trim()));
        let mut fields = s.split_whitespace();

        let key_tag = fields
            .next()
            .and_then(|f| f.parse::<u16>().ok())
            .ok_or_else(|| invalid("bad key tag"))?;
        let algorithm = fields
            .next()
            .and_then(|f| f.parse::<u8>().ok())
            .ok_or_else(|| invalid("bad algorithm"))?;
        let digest_type = fields
            .next()
            .and_then(|f| f.parse::<u8>().ok())
            .ok_or_else(|| invalid("bad digest type"))?;
        let digest_hex: String = fields.collect();
        let digest = hex::decode(&digest_hex).map_err(|_| invalid("bad digest"))?;

        if let Some(dt) = DigestType::from_u8(digest_type) {
            if digest.len() != dt.digest_len() {
                return Err(invalid("digest length does not match digest type"));
            }
        } else if digest.is_empty() {
            return Err(invalid("empty digest"));
        }

        Ok(Self {
            zone: Name::root(),
            ds: Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
            },
        })
    }
}

impl TrustAnchor {
    /// False when the anchor names an algorithm or digest this build cannot check.
    pub fn is_supported(&self) -> bool {
        ds_is_supported(&self.ds)
    }
}

impl fmt::Display for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.ds.key_tag,
            self.ds.algorithm,
            self.ds.digest_type,
            hex::encode_upper(&self.ds.digest)
        )
    }
}
