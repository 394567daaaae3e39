use std::fmt;
use std::str::FromStr;

use super::ParseError;

/// Record types the validator knows by name. Anything else is carried as `Unknown`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DNSResourceType {
    #[default]
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    OPT,
    DS,
    RRSIG,
    NSEC,
    DNSKEY,
    NSEC3,
    NSEC3PARAM,
    TLSA,
    HTTPS,
    CAA,
    Unknown(u16),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DNSResourceClass {
    #[default]
    IN,
    CS,
    CH,
    HS,
    Unknown(u16),
}

/// Section of a response a record was read from
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordPlace {
    Answer,
    Authority,
    Additional,
}

/// DNS response codes (RFC 1035 4.1.1)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    NoError = 0,
    FormatError = 1,
    ServerFailure = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,
}

impl ResponseCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NoError),
            1 => Some(Self::FormatError),
            2 => Some(Self::ServerFailure),
            3 => Some(Self::NameError),
            4 => Some(Self::NotImplemented),
            5 => Some(Self::Refused),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl From<u16> for DNSResourceClass {
    fn from(value: u16) -> Self {
        match value {
            1 => DNSResourceClass::IN,
            2 => DNSResourceClass::CS,
            3 => DNSResourceClass::CH,
            4 => DNSResourceClass::HS,
            x => DNSResourceClass::Unknown(x),
        }
    }
}

impl From<DNSResourceClass> for u16 {
    fn from(class: DNSResourceClass) -> Self {
        match class {
            DNSResourceClass::IN => 1,
            DNSResourceClass::CS => 2,
            DNSResourceClass::CH => 3,
            DNSResourceClass::HS => 4,
            DNSResourceClass::Unknown(x) => x,
        }
    }
}

impl From<u16> for DNSResourceType {
    fn from(value: u16) -> Self {
        match value {
            1 => DNSResourceType::A,
            2 => DNSResourceType::NS,
            5 => DNSResourceType::CNAME,
            6 => DNSResourceType::SOA,
            12 => DNSResourceType::PTR,
            15 => DNSResourceType::MX,
            16 => DNSResourceType::TXT,
            28 => DNSResourceType::AAAA,
            33 => DNSResourceType::SRV,
            41 => DNSResourceType::OPT,
            43 => DNSResourceType::DS,
            46 => DNSResourceType::RRSIG,
            47 => DNSResourceType::NSEC,
            48 => DNSResourceType::DNSKEY,
            50 => DNSResourceType::NSEC3,
            51 => DNSResourceType::NSEC3PARAM,
            52 => DNSResourceType::TLSA,
            65 => DNSResourceType::HTTPS,
            257 => DNSResourceType::CAA,
            x => DNSResourceType::Unknown(x),
        }
    }
}

impl From<DNSResourceType> for u16 {
    fn from(rtype: DNSResourceType) -> Self {
        match rtype {
            DNSResourceType::A => 1,
            DNSResourceType::NS => 2,
            DNSResourceType::CNAME => 5,
            DNSResourceType::SOA => 6,
            DNSResourceType::PTR => 12,
            DNSResourceType::MX => 15,
            DNSResourceType::TXT => 16,
            DNSResourceType::AAAA => 28,
            DNSResourceType::SRV => 33,
            DNSResourceType::OPT => 41,
            DNSResourceType::DS => 43,
            DNSResourceType::RRSIG => 46,
            DNSResourceType::NSEC => 47,
            DNSResourceType::DNSKEY => 48,
            DNSResourceType::NSEC3 => 50,
            DNSResourceType::NSEC3PARAM => 51,
            DNSResourceType::TLSA => 52,
            DNSResourceType::HTTPS => 65,
            DNSResourceType::CAA => 257,
            DNSResourceType::Unknown(x) => x,
        }
    }
}

const KNOWN_TYPES: [DNSResourceType; 19] = [
    DNSResourceType::A,
    DNSResourceType::NS,
    DNSResourceType::CNAME,
    DNSResourceType::SOA,
    DNSResourceType::PTR,
    DNSResourceType::MX,
    DNSResourceType::TXT,
    DNSResourceType::AAAA,
    DNSResourceType::SRV,
    DNSResourceType::OPT,
    DNSResourceType::DS,
    DNSResourceType::RRSIG,
    DNSResourceType::NSEC,
    DNSResourceType::DNSKEY,
    DNSResourceType::NSEC3,
    DNSResourceType::NSEC3PARAM,
    DNSResourceType::TLSA,
    DNSResourceType::HTTPS,
    DNSResourceType::CAA,
];

impl DNSResourceType {
    pub fn to_u16(self) -> u16 {
        self.into()
    }

    pub fn mnemonic(self) -> Option<&'static str> {
        let name = match self {
            DNSResourceType::A => "A",
            DNSResourceType::NS => "NS",
            DNSResourceType::CNAME => "CNAME",
            DNSResourceType::SOA => "SOA",
            DNSResourceType::PTR => "PTR",
            DNSResourceType::MX => "MX",
            DNSResourceType::TXT => "TXT",
            DNSResourceType::AAAA => "AAAA",
            DNSResourceType::SRV => "SRV",
            DNSResourceType::OPT => "OPT",
            DNSResourceType::DS => "DS",
            DNSResourceType::RRSIG => "RRSIG",
            DNSResourceType::NSEC => "NSEC",
            DNSResourceType::DNSKEY => "DNSKEY",
            DNSResourceType::NSEC3 => "NSEC3",
            DNSResourceType::NSEC3PARAM => "NSEC3PARAM",
            DNSResourceType::TLSA => "TLSA",
            DNSResourceType::HTTPS => "HTTPS",
            DNSResourceType::CAA => "CAA",
            DNSResourceType::Unknown(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for DNSResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "TYPE{}", self.to_u16()),
        }
    }
}

impl FromStr for DNSResourceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if let Some(number) = upper.strip_prefix("TYPE") {
            return number
                .parse::<u16>()
                .map(DNSResourceType::from)
                .map_err(|_| ParseError::UnknownType(s.to_string()));
        }

        KNOWN_TYPES
            .iter()
            .copied()
            .find(|t| t.mnemonic() == Some(upper.as_str()))
            .ok_or_else(|| ParseError::UnknownType(s.to_string()))
    }
}
