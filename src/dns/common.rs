use bitstream_io::{BitWrite, BitWriter, Endianness};

use super::ParseError;
use super::name::Name;

/// Upper bound on compression pointers followed while reading one name
const MAX_POINTER_HOPS: usize = 64;

/// Read cursor over a whole packet.
///
/// Keeps the full buffer around so compression pointers can be resolved
/// from anywhere, including inside RDATA.
#[derive(Debug, Clone)]
pub struct WireCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < len {
            return Err(ParseError::Truncated {
                need: len,
                have: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a possibly compressed name and leave the cursor after it.
    pub fn read_name(&mut self) -> Result<Name, ParseError> {
        let mut labels: Vec<&[u8]> = Vec::new();
        let mut offset = self.pos;
        let mut resume_at: Option<usize> = None;
        let mut hops = 0;

        loop {
            let len = *self.buf.get(offset).ok_or(ParseError::Truncated {
                need: 1,
                have: 0,
            })? as usize;

            match len & 0xC0 {
                0x00 => {
                    offset += 1;
                    if len == 0 {
                        break;
                    }
                    let label = self
                        .buf
                        .get(offset..offset + len)
                        .ok_or(ParseError::InvalidLabel)?;
                    labels.push(label);
                    offset += len;
                }
                0xC0 => {
                    let low = *self.buf.get(offset + 1).ok_or(ParseError::Truncated {
                        need: 1,
                        have: 0,
                    })? as usize;
                    if resume_at.is_none() {
                        resume_at = Some(offset + 2);
                    }
                    hops += 1;
                    if hops > MAX_POINTER_HOPS {
                        return Err(ParseError::CompressionLoop);
                    }
                    offset = ((len & 0x3F) << 8) | low;
                }
                _ => return Err(ParseError::InvalidLabel),
            }
        }

        self.pos = resume_at.unwrap_or(offset);
        Name::from_labels(labels)
    }
}

/// A piece of a DNS message that knows its own wire encoding.
pub trait PacketComponent: Sized {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError>;

    fn read(cursor: &mut WireCursor<'_>) -> Result<Self, ParseError>;

    /// Names are always written uncompressed and in canonical case.
    fn write_name<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
        name: &Name,
    ) -> Result<(), ParseError> {
        writer.write_bytes(&name.to_wire())?;
        Ok(())
    }
}
