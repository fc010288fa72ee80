//! Big-endian cursor used by the built-in decoders.

use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use crate::resources::{
    error::DecodeError,
    ids::{AssetId, FourCC},
};

pub(crate) struct BigEndianReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BigEndianReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub(crate) fn len(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    pub(crate) fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Moves to an absolute offset, failing when it lies past the end.
    pub(crate) fn seek(&mut self, pos: u64) -> Result<(), DecodeError> {
        if pos > self.len() {
            return Err(DecodeError::Malformed(format!(
                "offset {pos:#X} is past the end ({:#X})",
                self.len()
            )));
        }
        self.cursor.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub(crate) fn skip(&mut self, count: u64) -> Result<(), DecodeError> {
        self.seek(self.position() + count)
    }

    /// Advances to the next multiple of `alignment`.
    pub(crate) fn align(&mut self, alignment: u64) -> Result<(), DecodeError> {
        let pos = self.position();
        let aligned = pos.div_ceil(alignment) * alignment;
        self.seek(aligned.min(self.len()))
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.cursor.read_u8()?)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(self.cursor.read_u16::<BigEndian>()?)
    }

    pub(crate) fn i16(&mut self) -> Result<i16, DecodeError> {
        Ok(self.cursor.read_i16::<BigEndian>()?)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    pub(crate) fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(self.cursor.read_f32::<BigEndian>()?)
    }

    pub(crate) fn vec3(&mut self) -> Result<[f32; 3], DecodeError> {
        Ok([self.f32()?, self.f32()?, self.f32()?])
    }

    pub(crate) fn asset_id(&mut self) -> Result<AssetId, DecodeError> {
        Ok(AssetId::from(self.u32()?))
    }

    pub(crate) fn fourcc(&mut self) -> Result<FourCC, DecodeError> {
        Ok(FourCC::from_u32(self.u32()?))
    }

    pub(crate) fn expect_magic(&mut self, expected: u32) -> Result<(), DecodeError> {
        let found = self.u32()?;
        if found != expected {
            return Err(DecodeError::BadMagic { expected, found });
        }
        Ok(())
    }

    /// Reads a `u32` element count and rejects counts the remaining bytes
    /// cannot possibly hold.
    pub(crate) fn count(&mut self, min_element_size: u64) -> Result<usize, DecodeError> {
        let count = self.u32()?;
        let remaining = self.len().saturating_sub(self.position());
        if u64::from(count) * min_element_size > remaining {
            return Err(DecodeError::Malformed(format!(
                "count {count} does not fit in the remaining {remaining} bytes"
            )));
        }
        Ok(count as usize)
    }
}
