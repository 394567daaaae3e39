pub mod common;
pub mod edns;
pub mod enums;
pub mod header;
pub mod name;
pub mod question;
pub mod rdata;
pub mod resource;

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use common::{PacketComponent, WireCursor};
use edns::EdnsOpt;
use enums::{DNSResourceClass, DNSResourceType, RecordPlace};
use header::DNSHeader;
use name::Name;
use question::DNSQuestion;
use resource::DNSResource;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
    /// EDNS0 OPT record if present (extracted from additional records)
    pub edns: Option<EdnsOpt>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid DNS header")]
    InvalidHeader,
    #[error("Invalid DNS label")]
    InvalidLabel,
    #[error("Invalid question section")]
    InvalidQuestionSection,
    #[error("Invalid answer section")]
    InvalidAnswerSection,
    #[error("Invalid authority section")]
    InvalidAuthoritySection,
    #[error("Invalid additional section")]
    InvalidAdditionalSection,
    #[error("Invalid bit stream: {0}")]
    InvalidBitStream(String),
    #[error("Truncated message: needed {need} bytes, {have} left")]
    Truncated { need: usize, have: usize },
    #[error("Malformed {0} record data")]
    InvalidRdata(DNSResourceType),
    #[error("Compression pointer loop")]
    CompressionLoop,
    #[error("Unknown record type: {0}")]
    UnknownType(String),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::InvalidBitStream(e.to_string())
    }
}

/// Header bits a query is sent with
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryFlags {
    pub recursion_desired: bool,
    pub checking_disabled: bool,
    pub authenticated_data: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EdnsOptions {
    pub udp_payload_size: u16,
    pub dnssec_ok: bool,
}

impl Default for EdnsOptions {
    fn default() -> Self {
        Self {
            udp_payload_size: crate::dnssec::DEFAULT_EDNS_PAYLOAD,
            dnssec_ok: true,
        }
    }
}

impl DNSPacket {
    /// A single-question query with an OPT record attached.
    pub fn query(
        id: u16,
        name: &Name,
        qtype: DNSResourceType,
        flags: QueryFlags,
        edns: EdnsOptions,
    ) -> Self {
        let mut opt = EdnsOpt::with_payload_size(edns.udp_payload_size);
        opt.set_do_flag(edns.dnssec_ok);

        DNSPacket {
            header: DNSHeader {
                id,
                rd: flags.recursion_desired,
                cd: flags.checking_disabled,
                ad: flags.authenticated_data,
                qdcount: 1,
                ..Default::default()
            },
            questions: vec![DNSQuestion {
                name: name.clone(),
                qtype,
                qclass: DNSResourceClass::IN,
            }],
            edns: Some(opt),
            ..Default::default()
        }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        trace!("Parsing DNS packet, size: {} bytes", buf.len());
        let mut cursor = WireCursor::new(buf);
        let header = DNSHeader::read(&mut cursor)?;
        debug!(
            "Parsed DNS header: id={}, rcode={}, an={}, ns={}, ar={}",
            header.id, header.rcode, header.ancount, header.nscount, header.arcount
        );

        let mut packet = DNSPacket {
            header,
            ..Default::default()
        };

        for _ in 0..packet.header.qdcount {
            packet.questions.push(DNSQuestion::read(&mut cursor)?);
        }
        for _ in 0..packet.header.ancount {
            let answer = DNSResource::read(&mut cursor).map_err(section_error(
                ParseError::InvalidAnswerSection,
            ))?;
            packet.answers.push(answer);
        }
        for _ in 0..packet.header.nscount {
            let authority = DNSResource::read(&mut cursor).map_err(section_error(
                ParseError::InvalidAuthoritySection,
            ))?;
            packet.authorities.push(authority);
        }
        for _ in 0..packet.header.arcount {
            let resource = DNSResource::read(&mut cursor).map_err(section_error(
                ParseError::InvalidAdditionalSection,
            ))?;

            if resource.rtype == DNSResourceType::OPT && resource.name.is_root() {
                let rdata = resource.rdata.to_wire();
                let opt =
                    EdnsOpt::parse_from_resource(resource.rclass.into(), resource.ttl, &rdata)?;
                trace!("Parsed {}", opt);
                packet.edns = Some(opt);
                continue;
            }
            packet.resources.push(resource);
        }

        Ok(packet)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ParseError> {
        let mut buf = Vec::new();
        let mut writer: BitWriter<&mut Vec<u8>, BigEndian> = BitWriter::new(&mut buf);

        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.resources.len() as u16 + self.edns.is_some() as u16;
        header.write(&mut writer)?;

        for question in &self.questions {
            question.write(&mut writer)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.resources)
        {
            record.write(&mut writer)?;
        }

        if let Some(edns) = &self.edns {
            let (udp_payload_size, ttl, rdata) = edns.to_resource_format();
            // root owner, then TYPE OPT with the payload size standing in for CLASS
            writer.write_var::<u8>(8, 0)?;
            writer.write_var::<u16>(16, DNSResourceType::OPT.into())?;
            writer.write_var::<u16>(16, udp_payload_size)?;
            writer.write_var::<u32>(32, ttl)?;
            writer.write_var::<u16>(16, rdata.len() as u16)?;
            writer.write_bytes(&rdata)?;
        }

        Ok(buf)
    }

    /// Every record of the three data sections, tagged with where it came from.
    pub fn records(&self) -> impl Iterator<Item = (RecordPlace, &DNSResource)> {
        self.answers
            .iter()
            .map(|r| (RecordPlace::Answer, r))
            .chain(self.authorities.iter().map(|r| (RecordPlace::Authority, r)))
            .chain(self.resources.iter().map(|r| (RecordPlace::Additional, r)))
    }

    /// Check if DNSSEC is requested (DO flag)
    pub fn dnssec_requested(&self) -> bool {
        self.edns.as_ref().is_some_and(|edns| edns.do_flag())
    }
}

fn section_error(fallback: ParseError) -> impl FnOnce(ParseError) -> ParseError {
    move |err| match err {
        // keep the precise cause when it says more than "bad section"
        ParseError::Truncated { .. } | ParseError::CompressionLoop | ParseError::InvalidRdata(_) => {
            err
        }
        _ => fallback,
    }
}
