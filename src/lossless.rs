//! Header of a VP8L (lossless) bitstream.

use crate::cursor::ByteCursor;
use crate::error::HeaderError;

const LOSSLESS_SIGNATURE: u8 = 0x2f;
const VP8L_HEADER_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LosslessHeader {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) alpha_is_used: bool,
    /// Read for completeness; only version 0 is defined but no other value is rejected
    pub(crate) version: u8,
}

/// Reads bits least significant first, as the VP8L bitstream packs them.
#[derive(Debug)]
pub(crate) struct BitReader<'a> {
    reader: ByteCursor<'a>,
    buffer: u64,
    nbits: u8,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(reader: ByteCursor<'a>) -> Self {
        Self {
            reader,
            buffer: 0,
            nbits: 0,
        }
    }

    pub(crate) fn read_bits(&mut self, num: u8) -> Option<u32> {
        debug_assert!(num <= 32);

        while self.nbits < num {
            self.buffer |= u64::from(self.reader.read_u8()?) << self.nbits;
            self.nbits += 8;
        }

        let value = (self.buffer & ((1 << num) - 1)) as u32;
        self.buffer >>= num;
        self.nbits -= num;

        Some(value)
    }
}

pub(crate) fn read_lossless_header(payload: &[u8]) -> Result<LosslessHeader, HeaderError> {
    if payload.len() < VP8L_HEADER_SIZE {
        return Err(HeaderError::Vp8lTooShort(payload.len()));
    }

    let mut bit_reader = BitReader::new(ByteCursor::new(payload));
    let too_short = || HeaderError::Vp8lTooShort(payload.len());

    let signature = bit_reader.read_bits(8).ok_or_else(too_short)? as u8;
    if signature != LOSSLESS_SIGNATURE {
        return Err(HeaderError::LosslessSignatureInvalid(signature));
    }

    // 14-bit fields, so the results fit in a u16 even after adding one
    let width = bit_reader.read_bits(14).ok_or_else(too_short)? as u16 + 1;
    let height = bit_reader.read_bits(14).ok_or_else(too_short)? as u16 + 1;

    let alpha_is_used = bit_reader.read_bits(1).ok_or_else(too_short)? != 0;
    let version = bit_reader.read_bits(3).ok_or_else(too_short)? as u8;
    if version != 0 {
        log::debug!("VP8L header declares unknown version {version}");
    }

    Ok(LosslessHeader {
        width,
        height,
        alpha_is_used,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(width: u32, height: u32, alpha: bool, version: u32) -> [u8; 5] {
        let bits = (width - 1) | (height - 1) << 14 | u32::from(alpha) << 28 | version << 29;
        let b = bits.to_le_bytes();
        [LOSSLESS_SIGNATURE, b[0], b[1], b[2], b[3]]
    }

    #[test]
    fn bit_reader_is_lsb_first() {
        let bytes = [0b1010_1100, 0b0000_0011];
        let mut br = BitReader::new(ByteCursor::new(&bytes));
        assert_eq!(br.read_bits(2), Some(0b00));
        assert_eq!(br.read_bits(3), Some(0b011));
        assert_eq!(br.read_bits(5), Some(0b11_101));
        assert_eq!(br.read_bits(6), Some(0));
        assert_eq!(br.read_bits(1), None);
    }

    #[test]
    fn reads_packed_header() {
        let header = read_lossless_header(&pack(400, 301, true, 0)).unwrap();
        assert_eq!(
            header,
            LosslessHeader {
                width: 400,
                height: 301,
                alpha_is_used: true,
                version: 0,
            }
        );
    }

    #[test]
    fn maximum_dimensions() {
        let header = read_lossless_header(&pack(1 << 14, 1 << 14, false, 0)).unwrap();
        assert_eq!((header.width, header.height), (16384, 16384));
        assert!(!header.alpha_is_used);
    }

    #[test]
    fn version_is_not_enforced() {
        let header = read_lossless_header(&pack(1, 1, false, 5)).unwrap();
        assert_eq!(header.version, 5);
    }

    #[test]
    fn bad_signature() {
        let mut payload = pack(1, 1, false, 0);
        payload[0] = 0x2e;
        assert_eq!(
            read_lossless_header(&payload),
            Err(HeaderError::LosslessSignatureInvalid(0x2e))
        );
    }

    #[test]
    fn short_payload() {
        assert_eq!(
            read_lossless_header(&[0x2f, 0, 0, 0]),
            Err(HeaderError::Vp8lTooShort(4))
        );
    }
}
