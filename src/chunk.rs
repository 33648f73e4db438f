//! Top-level RIFF chunk iteration.

use crate::cursor::{ByteCursor, RIFF_HEADER_SIZE};
use crate::error::ValidationError;

/// Tag plus size field that precede every chunk payload.
pub(crate) const CHUNK_HEADER_SIZE: usize = 8;

/// All chunk types a WebP file may contain
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum WebPRiffChunk {
    VP8,
    VP8L,
    VP8X,
    ANIM,
    ANMF,
    ALPH,
    ICCP,
    EXIF,
    XMP,
    Unknown([u8; 4]),
}

impl WebPRiffChunk {
    pub(crate) const fn from_fourcc(chunk_fourcc: [u8; 4]) -> Self {
        match &chunk_fourcc {
            b"VP8 " => Self::VP8,
            b"VP8L" => Self::VP8L,
            b"VP8X" => Self::VP8X,
            b"ANIM" => Self::ANIM,
            b"ANMF" => Self::ANMF,
            b"ALPH" => Self::ALPH,
            b"ICCP" => Self::ICCP,
            b"EXIF" => Self::EXIF,
            b"XMP " => Self::XMP,
            _ => Self::Unknown(chunk_fourcc),
        }
    }

    pub(crate) const fn to_fourcc(self) -> [u8; 4] {
        match self {
            Self::VP8 => *b"VP8 ",
            Self::VP8L => *b"VP8L",
            Self::VP8X => *b"VP8X",
            Self::ANIM => *b"ANIM",
            Self::ANMF => *b"ANMF",
            Self::ALPH => *b"ALPH",
            Self::ICCP => *b"ICCP",
            Self::EXIF => *b"EXIF",
            Self::XMP => *b"XMP ",
            Self::Unknown(fourcc) => fourcc,
        }
    }
}

/// One chunk borrowed from the input buffer.
///
/// `payload.len() == size` always holds; the padding byte, if any, is not part of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk<'a> {
    pub(crate) kind: WebPRiffChunk,
    pub(crate) size: u32,
    pub(crate) payload: &'a [u8],
    /// Offset of the chunk header within the whole buffer
    pub(crate) offset: usize,
}

/// Lazily yields the chunks that follow the RIFF envelope.
///
/// Stops cleanly once fewer than eight bytes remain. A chunk whose size field overruns the
/// buffer yields a single [`ValidationError::TruncatedChunk`] and then the walk ends, unless
/// an earlier chunk was already yielded and this one starts at or beyond the end declared by
/// the RIFF size, in which case it is trailing garbage and the walk ends without error.
#[derive(Debug, Clone)]
pub(crate) struct ChunkWalker<'a> {
    r: ByteCursor<'a>,
    riff_end: usize,
    yielded: bool,
    done: bool,
}

impl<'a> ChunkWalker<'a> {
    /// Starts a walk at the first chunk, right after the 12 byte envelope.
    pub(crate) fn new(data: &'a [u8], riff_size: u32) -> Self {
        // "RIFF" and the size field are not counted by the size field itself
        let riff_end = usize::try_from(riff_size)
            .ok()
            .and_then(|size| size.checked_add(CHUNK_HEADER_SIZE))
            .unwrap_or(usize::MAX);

        Self {
            r: ByteCursor::at(data, RIFF_HEADER_SIZE),
            riff_end,
            yielded: false,
            done: false,
        }
    }

    fn read_chunk(&mut self) -> Result<Option<Chunk<'a>>, ValidationError> {
        if self.r.remaining() < CHUNK_HEADER_SIZE {
            if self.r.remaining() > 0 {
                log::trace!("ignoring {} trailing bytes", self.r.remaining());
            }
            return Ok(None);
        }

        let offset = self.r.position();
        let (Some(fourcc), Some(size)) = (self.r.read_fourcc(), self.r.read_u32_le()) else {
            return Ok(None);
        };

        let payload = usize::try_from(size)
            .ok()
            .and_then(|len| self.r.take_slice(len));
        let Some(payload) = payload else {
            if self.yielded && offset >= self.riff_end {
                log::debug!(
                    "ignoring trailing data at offset {offset} past the declared RIFF end {}",
                    self.riff_end
                );
                return Ok(None);
            }
            return Err(ValidationError::TruncatedChunk {
                tag: fourcc,
                declared: size,
                available: self.r.remaining(),
            });
        };

        // RIFF chunks containing an uneven number of bytes append an extra 0x00 at the end of
        // the chunk. A missing pad byte at the very end of the buffer is tolerated.
        if size % 2 == 1 && self.r.skip(1).is_none() {
            log::trace!("missing pad byte after final chunk");
        }

        let kind = WebPRiffChunk::from_fourcc(fourcc);
        self.yielded = true;
        log::trace!("chunk {kind:?} at offset {offset}, {size} bytes");

        Ok(Some(Chunk {
            kind,
            size,
            payload,
            offset,
        }))
    }
}

impl<'a> Iterator for ChunkWalker<'a> {
    type Item = Result<Chunk<'a>, ValidationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for ChunkWalker<'_> {}
