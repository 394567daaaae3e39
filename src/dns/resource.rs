use bitstream_io::{BitWrite, BitWriter, Endianness};

use super::{
    ParseError,
    common::{PacketComponent, WireCursor},
    enums::{DNSResourceClass, DNSResourceType},
    name::Name,
    rdata::RData,
};

/// One resource record with decoded RDATA.
///
/// For OPT pseudo-records `rclass` carries the raw payload size through
/// `DNSResourceClass::Unknown` and `rdata` is `RData::Other`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DNSResource {
    pub name: Name,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdata: RData,
}

impl DNSResource {
    pub fn new(name: Name, ttl: u32, rdata: RData) -> Self {
        let rtype = rdata.rtype().unwrap_or_default();
        Self {
            name,
            rtype,
            rclass: DNSResourceClass::IN,
            ttl,
            rdata,
        }
    }
}

impl PacketComponent for DNSResource {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        let rdata = self.rdata.to_wire();
        self.write_name(writer, &self.name)?;
        writer.write_var::<u16>(16, self.rtype.into())?;
        writer.write_var::<u16>(16, self.rclass.into())?;
        writer.write_var::<u32>(32, self.ttl)?;
        writer.write_var::<u16>(16, rdata.len() as u16)?;
        writer.write_bytes(&rdata)?;
        Ok(())
    }

    fn read(cursor: &mut WireCursor<'_>) -> Result<Self, ParseError> {
        let name = cursor.read_name()?;
        let rtype: DNSResourceType = cursor.read_u16()?.into();
        let rclass = cursor.read_u16()?.into();
        let ttl = cursor.read_u32()?;
        let rdlength = cursor.read_u16()? as usize;
        let rdata = RData::read(rtype, rdlength, cursor)?;

        Ok(Self {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
        })
    }
}
