//! Bounds-checked sequential reads over a borrowed byte slice, and the RIFF/WEBP envelope.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ContainerError, ValidationError};

/// Size of the `"RIFF" <size> "WEBP"` envelope that precedes the first chunk.
pub(crate) const RIFF_HEADER_SIZE: usize = 12;

/// A read-only view over the input plus a current offset.
///
/// Every read either succeeds and advances, or returns `None` and leaves the offset untouched.
/// The offset never exceeds the slice length.
#[derive(Clone)]
pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Creates a cursor that starts at `pos`, clamped to the end of `data`.
    pub(crate) fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Borrows the next `n` bytes and advances past them.
    pub(crate) fn take_slice(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Option<()> {
        self.take_slice(n).map(|_| ())
    }

    pub(crate) fn read_fourcc(&mut self) -> Option<[u8; 4]> {
        let mut fourcc = [0; 4];
        fourcc.copy_from_slice(self.take_slice(4)?);
        Some(fourcc)
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        self.take_slice(1).map(|b| b[0])
    }

    pub(crate) fn read_u16_le(&mut self) -> Option<u16> {
        self.take_slice(2).map(LittleEndian::read_u16)
    }

    pub(crate) fn read_u24_le(&mut self) -> Option<u32> {
        self.take_slice(3).map(LittleEndian::read_u24)
    }

    pub(crate) fn read_u32_le(&mut self) -> Option<u32> {
        self.take_slice(4).map(LittleEndian::read_u32)
    }
}

impl std::fmt::Debug for ByteCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteCursor")
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .finish()
    }
}

/// Reads the 12 bytes of the WebP file header and returns the declared RIFF size.
///
/// The size is informational: callers must still bound every read by the real buffer length.
pub(crate) fn read_riff_header(r: &mut ByteCursor) -> Result<u32, ValidationError> {
    if r.remaining() < RIFF_HEADER_SIZE {
        return Err(ContainerError::TooShort(r.remaining()).into());
    }

    let riff = r.read_fourcc().ok_or(ContainerError::TooShort(0))?;
    if &riff != b"RIFF" {
        return Err(ContainerError::RiffSignatureInvalid(riff).into());
    }

    let size = r.read_u32_le().ok_or(ContainerError::TooShort(4))?;

    let webp = r.read_fourcc().ok_or(ContainerError::TooShort(8))?;
    if &webp != b"WEBP" {
        return Err(ContainerError::WebpSignatureInvalid(webp).into());
    }

    Ok(size)
}
