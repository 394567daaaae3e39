use super::ParseError;

/// DNSSEC OK bit in the OPT TTL flags (RFC 3225)
const DO_BIT: u16 = 0x8000;

/// EDNS0 OPT pseudo-record
/// RFC 6891: https://tools.ietf.org/html/rfc6891
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOpt {
    /// UDP payload size the sender can take
    pub udp_payload_size: u16,
    /// Extended RCODE (high 8 bits)
    pub extended_rcode: u8,
    pub version: u8,
    pub flags: u16,
    pub options: Vec<EdnsOption>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

impl Default for EdnsOpt {
    fn default() -> Self {
        Self::with_payload_size(crate::dnssec::DEFAULT_EDNS_PAYLOAD)
    }
}

impl EdnsOpt {
    pub fn with_payload_size(udp_payload_size: u16) -> Self {
        Self {
            udp_payload_size,
            extended_rcode: 0,
            version: 0,
            flags: 0,
            options: Vec::new(),
        }
    }

    /// Check if DNSSEC OK (DO) flag is set
    pub fn do_flag(&self) -> bool {
        self.flags & DO_BIT != 0
    }

    pub fn set_do_flag(&mut self, value: bool) {
        if value {
            self.flags |= DO_BIT;
        } else {
            self.flags &= !DO_BIT;
        }
    }

    /// Rebuild the OPT record from its overloaded CLASS and TTL fields.
    ///
    /// - CLASS: UDP payload size
    /// - TTL: extended RCODE (8) | version (8) | flags (16)
    /// - RDATA: sequence of (code, length, data) options
    pub fn parse_from_resource(class: u16, ttl: u32, rdata: &[u8]) -> Result<Self, ParseError> {
        let mut options = Vec::new();
        let mut pos = 0;

        while pos < rdata.len() {
            let header = rdata
                .get(pos..pos + 4)
                .ok_or(ParseError::InvalidAdditionalSection)?;
            let code = u16::from_be_bytes([header[0], header[1]]);
            let len = u16::from_be_bytes([header[2], header[3]]) as usize;
            pos += 4;

            let data = rdata
                .get(pos..pos + len)
                .ok_or(ParseError::InvalidAdditionalSection)?;
            pos += len;
            options.push(EdnsOption {
                code,
                data: data.to_vec(),
            });
        }

        Ok(EdnsOpt {
            udp_payload_size: class,
            extended_rcode: (ttl >> 24) as u8,
            version: (ttl >> 16) as u8,
            flags: ttl as u16,
            options,
        })
    }

    /// The (CLASS, TTL, RDATA) triple to put on the wire.
    pub fn to_resource_format(&self) -> (u16, u32, Vec<u8>) {
        let ttl = ((self.extended_rcode as u32) << 24)
            | ((self.version as u32) << 16)
            | (self.flags as u32);

        let mut rdata = Vec::new();
        for option in &self.options {
            rdata.extend_from_slice(&option.code.to_be_bytes());
            rdata.extend_from_slice(&(option.data.len() as u16).to_be_bytes());
            rdata.extend_from_slice(&option.data);
        }

        (self.udp_payload_size, ttl, rdata)
    }
}

impl std::fmt::Display for EdnsOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EDNS{}: payload_size={}, flags=0x{:04x}{}, options={}",
            self.version,
            self.udp_payload_size,
            self.flags,
            if self.do_flag() { " (DO)" } else { "" },
            self.options.len()
        )
    }
}
