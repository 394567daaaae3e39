use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::Engine;

use super::{ParseError, common::WireCursor, enums::DNSResourceType, name::Name};
use crate::dnssec::calculate_key_tag;

/// DNSKEY flag: the key is a zone key (RFC 4034 2.1.1)
pub const DNSKEY_FLAG_ZONE: u16 = 0x0100;
/// The only protocol value DNSSEC accepts
pub const DNSKEY_PROTOCOL: u8 = 3;
/// NSEC3 flag: opt-out (RFC 5155 3.1.2.1)
pub const NSEC3_FLAG_OPT_OUT: u8 = 0x01;

/// Record contents, one variant per kind the validator cares about.
///
/// Names inside RDATA are decompressed and lowercased on the way in,
/// so `to_wire` always yields the canonical form used for signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(Name),
    CNAME(Name),
    PTR(Name),
    MX { preference: u16, exchange: Name },
    SOA(Soa),
    DNSKEY(Dnskey),
    DS(Ds),
    RRSIG(Rrsig),
    NSEC3(Nsec3),
    NSEC3PARAM(Nsec3Param),
    Other(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: DNSResourceType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: Name,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec3 {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed_owner: Vec<u8>,
    /// Raw RFC 4034 4.1.2 window blocks
    pub type_bitmap: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec3Param {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

impl Dnskey {
    pub fn key_tag(&self) -> u16 {
        calculate_key_tag(self.flags, self.protocol, self.algorithm, &self.public_key)
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & DNSKEY_FLAG_ZONE != 0
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.public_key.len());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.push(self.protocol);
        out.push(self.algorithm);
        out.extend_from_slice(&self.public_key);
        out
    }
}

impl Ds {
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.digest.len());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        out.push(self.algorithm);
        out.push(self.digest_type);
        out.extend_from_slice(&self.digest);
        out
    }
}

impl Rrsig {
    /// RDATA without the signature field, as it enters the signed data.
    pub fn write_unsigned(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.type_covered.to_u16().to_be_bytes());
        out.push(self.algorithm);
        out.push(self.labels);
        out.extend_from_slice(&self.original_ttl.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.inception.to_be_bytes());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer_name.write_wire(out);
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(18 + self.signer_name.wire_len() + self.signature.len());
        self.write_unsigned(&mut out);
        out.extend_from_slice(&self.signature);
        out
    }
}

impl Nsec3 {
    pub fn opt_out(&self) -> bool {
        self.flags & NSEC3_FLAG_OPT_OUT != 0
    }

    pub fn has_type(&self, rtype: DNSResourceType) -> bool {
        bitmap_contains(&self.type_bitmap, rtype)
    }

    pub fn types(&self) -> Vec<DNSResourceType> {
        bitmap_types(&self.type_bitmap)
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.hash_algorithm);
        out.push(self.flags);
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.push(self.salt.len() as u8);
        out.extend_from_slice(&self.salt);
        out.push(self.next_hashed_owner.len() as u8);
        out.extend_from_slice(&self.next_hashed_owner);
        out.extend_from_slice(&self.type_bitmap);
        out
    }
}

impl Nsec3Param {
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.hash_algorithm);
        out.push(self.flags);
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.push(self.salt.len() as u8);
        out.extend_from_slice(&self.salt);
        out
    }
}

impl RData {
    pub fn rtype(&self) -> Option<DNSResourceType> {
        let rtype = match self {
            RData::A(_) => DNSResourceType::A,
            RData::AAAA(_) => DNSResourceType::AAAA,
            RData::NS(_) => DNSResourceType::NS,
            RData::CNAME(_) => DNSResourceType::CNAME,
            RData::PTR(_) => DNSResourceType::PTR,
            RData::MX { .. } => DNSResourceType::MX,
            RData::SOA(_) => DNSResourceType::SOA,
            RData::DNSKEY(_) => DNSResourceType::DNSKEY,
            RData::DS(_) => DNSResourceType::DS,
            RData::RRSIG(_) => DNSResourceType::RRSIG,
            RData::NSEC3(_) => DNSResourceType::NSEC3,
            RData::NSEC3PARAM(_) => DNSResourceType::NSEC3PARAM,
            RData::Other(_) => return None,
        };
        Some(rtype)
    }

    /// Canonical RDATA (RFC 4034 6.2): uncompressed, lowercase embedded names.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            RData::A(addr) => addr.octets().to_vec(),
            RData::AAAA(addr) => addr.octets().to_vec(),
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => name.to_wire(),
            RData::MX {
                preference,
                exchange,
            } => {
                let mut out = preference.to_be_bytes().to_vec();
                exchange.write_wire(&mut out);
                out
            }
            RData::SOA(soa) => {
                let mut out = Vec::new();
                soa.mname.write_wire(&mut out);
                soa.rname.write_wire(&mut out);
                for field in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                    out.extend_from_slice(&field.to_be_bytes());
                }
                out
            }
            RData::DNSKEY(key) => key.to_wire(),
            RData::DS(ds) => ds.to_wire(),
            RData::RRSIG(sig) => sig.to_wire(),
            RData::NSEC3(nsec3) => nsec3.to_wire(),
            RData::NSEC3PARAM(param) => param.to_wire(),
            RData::Other(bytes) => bytes.clone(),
        }
    }

    /// Decode `rdlength` bytes of RDATA at the cursor.
    pub fn read(
        rtype: DNSResourceType,
        rdlength: usize,
        cursor: &mut WireCursor<'_>,
    ) -> Result<Self, ParseError> {
        let start = cursor.position();
        let end = start + rdlength;
        if cursor.remaining() < rdlength {
            return Err(ParseError::Truncated {
                need: rdlength,
                have: cursor.remaining(),
            });
        }
        let invalid = || ParseError::InvalidRdata(rtype);

        let rdata = match rtype {
            DNSResourceType::A => {
                let b = cursor.read_bytes(rdlength)?;
                let octets: [u8; 4] = b.try_into().map_err(|_| invalid())?;
                RData::A(Ipv4Addr::from(octets))
            }
            DNSResourceType::AAAA => {
                let b = cursor.read_bytes(rdlength)?;
                let octets: [u8; 16] = b.try_into().map_err(|_| invalid())?;
                RData::AAAA(Ipv6Addr::from(octets))
            }
            DNSResourceType::NS => RData::NS(cursor.read_name()?),
            DNSResourceType::CNAME => RData::CNAME(cursor.read_name()?),
            DNSResourceType::PTR => RData::PTR(cursor.read_name()?),
            DNSResourceType::MX => RData::MX {
                preference: cursor.read_u16()?,
                exchange: cursor.read_name()?,
            },
            DNSResourceType::SOA => RData::SOA(Soa {
                mname: cursor.read_name()?,
                rname: cursor.read_name()?,
                serial: cursor.read_u32()?,
                refresh: cursor.read_u32()?,
                retry: cursor.read_u32()?,
                expire: cursor.read_u32()?,
                minimum: cursor.read_u32()?,
            }),
            DNSResourceType::DNSKEY => {
                if rdlength < 4 {
                    return Err(invalid());
                }
                RData::DNSKEY(Dnskey {
                    flags: cursor.read_u16()?,
                    protocol: cursor.read_u8()?,
                    algorithm: cursor.read_u8()?,
                    public_key: cursor.read_bytes(rdlength - 4)?.to_vec(),
                })
            }
            DNSResourceType::DS => {
                if rdlength < 4 {
                    return Err(invalid());
                }
                RData::DS(Ds {
                    key_tag: cursor.read_u16()?,
                    algorithm: cursor.read_u8()?,
                    digest_type: cursor.read_u8()?,
                    digest: cursor.read_bytes(rdlength - 4)?.to_vec(),
                })
            }
            DNSResourceType::RRSIG => {
                if rdlength < 19 {
                    return Err(invalid());
                }
                let type_covered = cursor.read_u16()?.into();
                let algorithm = cursor.read_u8()?;
                let labels = cursor.read_u8()?;
                let original_ttl = cursor.read_u32()?;
                let expiration = cursor.read_u32()?;
                let inception = cursor.read_u32()?;
                let key_tag = cursor.read_u16()?;
                let signer_name = cursor.read_name()?;
                let used = cursor.position() - start;
                if used > rdlength {
                    return Err(invalid());
                }
                RData::RRSIG(Rrsig {
                    type_covered,
                    algorithm,
                    labels,
                    original_ttl,
                    expiration,
                    inception,
                    key_tag,
                    signer_name,
                    signature: cursor.read_bytes(rdlength - used)?.to_vec(),
                })
            }
            DNSResourceType::NSEC3 => {
                let hash_algorithm = cursor.read_u8()?;
                let flags = cursor.read_u8()?;
                let iterations = cursor.read_u16()?;
                let salt_len = cursor.read_u8()? as usize;
                let salt = cursor.read_bytes(salt_len)?.to_vec();
                let hash_len = cursor.read_u8()? as usize;
                let next_hashed_owner = cursor.read_bytes(hash_len)?.to_vec();
                let used = cursor.position() - start;
                if used > rdlength {
                    return Err(invalid());
                }
                RData::NSEC3(Nsec3 {
                    hash_algorithm,
                    flags,
                    iterations,
                    salt,
                    next_hashed_owner,
                    type_bitmap: cursor.read_bytes(rdlength - used)?.to_vec(),
                })
            }
            DNSResourceType::NSEC3PARAM => {
                let hash_algorithm = cursor.read_u8()?;
                let flags = cursor.read_u8()?;
                let iterations = cursor.read_u16()?;
                let salt_len = cursor.read_u8()? as usize;
                RData::NSEC3PARAM(Nsec3Param {
                    hash_algorithm,
                    flags,
                    iterations,
                    salt: cursor.read_bytes(salt_len)?.to_vec(),
                })
            }
            _ => RData::Other(cursor.read_bytes(rdlength)?.to_vec()),
        };

        if cursor.position() != end {
            return Err(invalid());
        }
        Ok(rdata)
    }
}

/// Build RFC 4034 4.1.2 window blocks from a list of types.
pub fn encode_type_bitmap(types: &[DNSResourceType]) -> Vec<u8> {
    let mut numbers: Vec<u16> = types.iter().map(|t| t.to_u16()).collect();
    numbers.sort_unstable();
    numbers.dedup();

    let mut out = Vec::new();
    let mut idx = 0;
    while idx < numbers.len() {
        let window = (numbers[idx] >> 8) as u8;
        let mut bitmap = [0u8; 32];
        let mut used = 0;
        while idx < numbers.len() && (numbers[idx] >> 8) as u8 == window {
            let low = (numbers[idx] & 0xFF) as usize;
            bitmap[low / 8] |= 0x80 >> (low % 8);
            used = low / 8 + 1;
            idx += 1;
        }
        out.push(window);
        out.push(used as u8);
        out.extend_from_slice(&bitmap[..used]);
    }
    out
}

pub fn bitmap_contains(bitmap: &[u8], rtype: DNSResourceType) -> bool {
    let number = rtype.to_u16();
    let (want_window, low) = ((number >> 8) as u8, (number & 0xFF) as usize);

    let mut pos = 0;
    while pos + 2 <= bitmap.len() {
        let window = bitmap[pos];
        let len = bitmap[pos + 1] as usize;
        let Some(block) = bitmap.get(pos + 2..pos + 2 + len) else {
            return false;
        };
        if window == want_window {
            return block
                .get(low / 8)
                .is_some_and(|byte| byte & (0x80 >> (low % 8)) != 0);
        }
        pos += 2 + len;
    }
    false
}

pub fn bitmap_types(bitmap: &[u8]) -> Vec<DNSResourceType> {
    let mut types = Vec::new();
    let mut pos = 0;
    while pos + 2 <= bitmap.len() {
        let window = bitmap[pos] as u16;
        let len = bitmap[pos + 1] as usize;
        let Some(block) = bitmap.get(pos + 2..pos + 2 + len) else {
            break;
        };
        for (byte_idx, byte) in block.iter().enumerate() {
            for bit in 0..8 {
                if byte & (0x80 >> bit) != 0 {
                    types.push(DNSResourceType::from(
                        (window << 8) | (byte_idx * 8 + bit) as u16,
                    ));
                }
            }
        }
        pos += 2 + len;
    }
    types
}

pub fn base32hex_encode(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648HexLower { padding: false }, bytes)
}

pub fn base32hex_decode(text: &str) -> Option<Vec<u8>> {
    base32::decode(
        base32::Alphabet::Rfc4648HexLower { padding: false },
        &text.to_ascii_lowercase(),
    )
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn salt_text(salt: &[u8]) -> String {
    if salt.is_empty() {
        "-".to_string()
    } else {
        hex::encode(salt)
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(addr) => write!(f, "{}", addr),
            RData::AAAA(addr) => write!(f, "{}", addr),
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => write!(f, "{}", name),
            RData::MX {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RData::SOA(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            RData::DNSKEY(key) => write!(
                f,
                "{} {} {} {}",
                key.flags,
                key.protocol,
                key.algorithm,
                b64(&key.public_key)
            ),
            RData::DS(ds) => write!(
                f,
                "{} {} {} {}",
                ds.key_tag,
                ds.algorithm,
                ds.digest_type,
                hex::encode_upper(&ds.digest)
            ),
            RData::RRSIG(sig) => write!(
                f,
                "{} {} {} {} {} {} {} {} {}",
                sig.type_covered,
                sig.algorithm,
                sig.labels,
                sig.original_ttl,
                sig.expiration,
                sig.inception,
                sig.key_tag,
                sig.signer_name,
                b64(&sig.signature)
            ),
            RData::NSEC3(nsec3) => {
                write!(
                    f,
                    "{} {} {} {} {}",
                    nsec3.hash_algorithm,
                    nsec3.flags,
                    nsec3.iterations,
                    salt_text(&nsec3.salt),
                    base32hex_encode(&nsec3.next_hashed_owner)
                )?;
                for rtype in nsec3.types() {
                    write!(f, " {}", rtype)?;
                }
                Ok(())
            }
            RData::NSEC3PARAM(param) => write!(
                f,
                "{} {} {} {}",
                param.hash_algorithm,
                param.flags,
                param.iterations,
                salt_text(&param.salt)
            ),
            RData::Other(bytes) => write!(f, "\\# {} {}", bytes.len(), hex::encode(bytes)),
        }
    }
}
