//! Frame header of a VP8 (lossy) bitstream.
//!
//! Only the uncompressed data chunk at the start of a key frame is read: the 3 byte frame tag,
//! the start code and the two dimension words. Section 9.1 of RFC 6386 describes the layout.

use crate::cursor::ByteCursor;
use crate::error::HeaderError;

const VP8_MAGIC: [u8; 3] = [0x9d, 0x01, 0x2a];
const VP8_HEADER_SIZE: usize = 10;

/// Dimension words carry a 14-bit size and a 2-bit upscaling factor.
const DIMENSION_MASK: u16 = 0x3fff;
const SCALE_SHIFT: u16 = 14;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Vp8FrameHeader {
    pub(crate) keyframe: bool,
    pub(crate) version: u8,
    pub(crate) for_display: bool,
    pub(crate) first_partition_size: u32,

    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) horizontal_scale: u8,
    pub(crate) vertical_scale: u8,
}

pub(crate) fn read_frame_header(payload: &[u8]) -> Result<Vp8FrameHeader, HeaderError> {
    if payload.len() < VP8_HEADER_SIZE {
        return Err(HeaderError::Vp8TooShort(payload.len()));
    }

    let mut r = ByteCursor::new(payload);
    let too_short = || HeaderError::Vp8TooShort(payload.len());

    let tag = r.read_u24_le().ok_or_else(too_short)?;

    let keyframe = tag & 1 == 0;
    let version = ((tag >> 1) & 7) as u8;
    let for_display = (tag >> 4) & 1 != 0;
    let first_partition_size = tag >> 5;

    let mut magic = [0u8; 3];
    magic.copy_from_slice(r.take_slice(3).ok_or_else(too_short)?);
    if magic != VP8_MAGIC {
        return Err(HeaderError::Vp8MagicInvalid(magic));
    }

    if !keyframe {
        log::debug!("VP8 frame tag does not mark a key frame");
    }

    let w = r.read_u16_le().ok_or_else(too_short)?;
    let h = r.read_u16_le().ok_or_else(too_short)?;

    Ok(Vp8FrameHeader {
        keyframe,
        version,
        for_display,
        first_partition_size,
        width: w & DIMENSION_MASK,
        height: h & DIMENSION_MASK,
        horizontal_scale: (w >> SCALE_SHIFT) as u8,
        vertical_scale: (h >> SCALE_SHIFT) as u8,
    })
}
