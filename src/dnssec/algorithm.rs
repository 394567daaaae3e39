use std::fmt;

use ring::signature::{self, RsaParameters, RsaPublicKeyComponents, UnparsedPublicKey};

/// DNSSEC algorithm numbers (RFC 4034, 5155, 5702, 6605, 8080, 8624)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DnsSecAlgorithm {
    /// RSA/MD5 (deprecated)
    RsaMd5 = 1,
    /// DSA/SHA1 (RFC 2536)
    DSA = 3,
    /// RSA/SHA-1 (RFC 3110)
    RsaSha1 = 5,
    /// DSA-NSEC3-SHA1 (RFC 5155)
    DsaNsec3Sha1 = 6,
    /// RSASHA1-NSEC3-SHA1 (RFC 5155)
    RsaSha1Nsec3Sha1 = 7,
    /// RSA/SHA-256 (RFC 5702)
    RsaSha256 = 8,
    /// RSA/SHA-512 (RFC 5702)
    RsaSha512 = 10,
    /// GOST R 34.10-2001 (RFC 5933)
    EccGost = 12,
    /// ECDSA Curve P-256 with SHA-256 (RFC 6605)
    EcdsaP256Sha256 = 13,
    /// ECDSA Curve P-384 with SHA-384 (RFC 6605)
    EcdsaP384Sha384 = 14,
    /// Ed25519 (RFC 8080)
    Ed25519 = 15,
    /// Ed448 (RFC 8080)
    Ed448 = 16,
}

impl DnsSecAlgorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::RsaMd5),
            3 => Some(Self::DSA),
            5 => Some(Self::RsaSha1),
            6 => Some(Self::DsaNsec3Sha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            12 => Some(Self::EccGost),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            16 => Some(Self::Ed448),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Check if algorithm is supported for validation
    pub fn is_supported(&self) -> bool {
        self.rsa_parameters().is_some()
            || matches!(
                self,
                Self::EcdsaP256Sha256 | Self::EcdsaP384Sha384 | Self::Ed25519
            )
    }

    fn rsa_parameters(&self) -> Option<&'static RsaParameters> {
        match self {
            Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 => {
                Some(&signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY)
            }
            Self::RsaSha256 => Some(&signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY),
            Self::RsaSha512 => Some(&signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY),
            _ => None,
        }
    }

    /// Check `sig` over `message` with a DNSKEY public key field.
    ///
    /// Malformed keys or signatures verify as false, never as an error.
    pub fn verify(&self, public_key: &[u8], message: &[u8], sig: &[u8]) -> bool {
        if let Some(params) = self.rsa_parameters() {
            return match split_rsa_key(public_key) {
                Some(components) => components.verify(params, message, sig).is_ok(),
                None => false,
            };
        }

        match self {
            Self::EcdsaP256Sha256 => verify_ecdsa(
                &signature::ECDSA_P256_SHA256_FIXED,
                64,
                public_key,
                message,
                sig,
            ),
            Self::EcdsaP384Sha384 => verify_ecdsa(
                &signature::ECDSA_P384_SHA384_FIXED,
                96,
                public_key,
                message,
                sig,
            ),
            Self::Ed25519 => UnparsedPublicKey::new(&signature::ED25519, public_key)
                .verify(message, sig)
                .is_ok(),
            _ => false,
        }
    }
}

/// DNSKEY ECDSA keys are bare X || Y; ring wants the uncompressed point.
fn verify_ecdsa(
    alg: &'static signature::EcdsaVerificationAlgorithm,
    point_len: usize,
    public_key: &[u8],
    message: &[u8],
    sig: &[u8],
) -> bool {
    if public_key.len() != point_len {
        return false;
    }
    let mut point = Vec::with_capacity(point_len + 1);
    point.push(0x04);
    point.extend_from_slice(public_key);
    UnparsedPublicKey::new(alg, &point)
        .verify(message, sig)
        .is_ok()
}

/// RFC 3110 2: exponent length (1 byte, or 0 then 2 bytes), exponent, modulus.
fn split_rsa_key(public_key: &[u8]) -> Option<RsaPublicKeyComponents<&[u8]>> {
    let (&first, rest) = public_key.split_first()?;
    let (exp_len, rest) = if first == 0 {
        let (len, rest) = rest.split_at_checked(2)?;
        (u16::from_be_bytes([len[0], len[1]]) as usize, rest)
    } else {
        (first as usize, rest)
    };

    let (e, n) = rest.split_at_checked(exp_len)?;
    if e.is_empty() || n.is_empty() {
        return None;
    }
    Some(RsaPublicKeyComponents { n, e })
}

impl fmt::Display for DnsSecAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RsaMd5 => "RSAMD5",
            Self::DSA => "DSA",
            Self::RsaSha1 => "RSASHA1",
            Self::DsaNsec3Sha1 => "DSA-NSEC3-SHA1",
            Self::RsaSha1Nsec3Sha1 => "RSASHA1-NSEC3-SHA1",
            Self::RsaSha256 => "RSASHA256",
            Self::RsaSha512 => "RSASHA512",
            Self::EccGost => "ECC-GOST",
            Self::EcdsaP256Sha256 => "ECDSAP256SHA256",
            Self::EcdsaP384Sha384 => "ECDSAP384SHA384",
            Self::Ed25519 => "ED25519",
            Self::Ed448 => "ED448",
        };
        write!(f, "{}", name)
    }
}
