use bitstream_io::{BitWrite, BitWriter, Endianness};

use super::{
    ParseError,
    common::{PacketComponent, WireCursor},
    enums::{DNSResourceClass, DNSResourceType},
    name::Name,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSQuestion {
    pub name: Name,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl PacketComponent for DNSQuestion {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        self.write_name(writer, &self.name)?;
        writer.write_var::<u16>(16, self.qtype.into())?;
        writer.write_var::<u16>(16, self.qclass.into())?;
        Ok(())
    }

    fn read(cursor: &mut WireCursor<'_>) -> Result<Self, ParseError> {
        let name = cursor
            .read_name()
            .map_err(|_| ParseError::InvalidQuestionSection)?;
        let qtype = cursor.read_u16()?.into();
        let qclass = cursor.read_u16()?.into();
        Ok(DNSQuestion {
            name,
            qtype,
            qclass,
        })
    }
}
