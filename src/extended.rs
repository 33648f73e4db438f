use crate::chunk::{ChunkWalker, WebPRiffChunk};
use crate::cursor::ByteCursor;
use crate::error::{HeaderError, ValidationError};
use crate::lossless::read_lossless_header;
use crate::vp8::read_frame_header;

// Bit layout of the first VP8X byte, most significant first:
// |Rsv|I|L|E|X|A|R|
const RESERVED_HIGH_BITS: u8 = 0b1100_0000;
const ICC_PROFILE_BIT: u8 = 0b0010_0000;
const ALPHA_BIT: u8 = 0b0001_0000;
const EXIF_METADATA_BIT: u8 = 0b0000_1000;
const XMP_METADATA_BIT: u8 = 0b0000_0100;
const ANIMATION_BIT: u8 = 0b0000_0010;
const RESERVED_LOW_BIT: u8 = 0b0000_0001;

const VP8X_HEADER_SIZE: usize = 10;
const ANIM_HEADER_SIZE: usize = 6;
/// Offsets, dimensions, duration and flags that precede the frame data of an ANMF chunk
const ANMF_HEADER_SIZE: usize = 16;

/// Optional features declared by a `VP8X` chunk.
///
/// Reserved bits are ignored rather than validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureFlags {
    /// An `ICCP` color profile chunk is declared
    pub icc_profile: bool,
    /// Some image data carries transparency
    pub alpha: bool,
    /// An `EXIF` metadata chunk is declared
    pub exif_metadata: bool,
    /// An `XMP ` metadata chunk is declared
    pub xmp_metadata: bool,
    /// The image is an animation made of `ANMF` frames
    pub animation: bool,
}

impl FeatureFlags {
    /// Decodes the flags byte of a `VP8X` chunk.
    pub fn from_bits(bits: u8) -> Self {
        let reserved = bits & (RESERVED_HIGH_BITS | RESERVED_LOW_BIT);
        if reserved != 0 {
            log::debug!("ignoring reserved VP8X flag bits {reserved:#010b}");
        }

        Self {
            icc_profile: bits & ICC_PROFILE_BIT != 0,
            alpha: bits & ALPHA_BIT != 0,
            exif_metadata: bits & EXIF_METADATA_BIT != 0,
            xmp_metadata: bits & XMP_METADATA_BIT != 0,
            animation: bits & ANIMATION_BIT != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExtendedHeader {
    pub(crate) flags: FeatureFlags,
    pub(crate) canvas_width: u32,
    pub(crate) canvas_height: u32,
}

/// Parameters of the `ANIM` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationParams {
    /// Suggested canvas background, stored as `[blue, green, red, alpha]`
    pub background_color: [u8; 4],
    /// How often the animation repeats; zero means forever
    pub loop_count: u16,
}

/// What an animated image's chunks add up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnimationSummary {
    pub(crate) params: AnimationParams,
    pub(crate) num_frames: u32,
}

pub(crate) fn read_extended_header(payload: &[u8]) -> Result<ExtendedHeader, HeaderError> {
    if payload.len() < VP8X_HEADER_SIZE {
        return Err(HeaderError::Vp8xTooShort(payload.len()));
    }

    let mut r = ByteCursor::new(payload);
    let too_short = || HeaderError::Vp8xTooShort(payload.len());

    let flags = FeatureFlags::from_bits(r.read_u8().ok_or_else(too_short)?);
    // three reserved bytes
    r.skip(3).ok_or_else(too_short)?;

    // stored minus one in 24 bits
    let canvas_width = r.read_u24_le().ok_or_else(too_short)? + 1;
    let canvas_height = r.read_u24_le().ok_or_else(too_short)? + 1;

    if canvas_width.checked_mul(canvas_height).is_none() {
        return Err(HeaderError::CanvasTooLarge {
            width: canvas_width,
            height: canvas_height,
        });
    }

    Ok(ExtendedHeader {
        flags,
        canvas_width,
        canvas_height,
    })
}

pub(crate) fn read_anim_params(payload: &[u8]) -> Result<AnimationParams, HeaderError> {
    let mut r = ByteCursor::new(payload);
    let too_short = || HeaderError::AnimTooShort(payload.len());

    let mut background_color = [0; 4];
    background_color.copy_from_slice(r.take_slice(4).ok_or_else(too_short)?);
    let loop_count = r.read_u16_le().ok_or_else(too_short)?;

    if payload.len() > ANIM_HEADER_SIZE {
        log::trace!("ANIM chunk has {} extra bytes", payload.len() - ANIM_HEADER_SIZE);
    }

    Ok(AnimationParams {
        background_color,
        loop_count,
    })
}

/// Walks the chunks after `VP8X` so that truncation anywhere in the file is reported, and
/// tallies the animation if `header` declares one.
///
/// A still image must carry exactly one `VP8 ` or `VP8L` chunk, whose bitstream header is
/// checked. Its dimensions are not reported; the canvas size is authoritative. `EXIF` and
/// `XMP ` chunks must be present when flagged, a missing `ICCP` is tolerated.
///
/// Frames are only counted, never decoded; an `ANIM` chunk followed by no `ANMF` at all is a
/// valid animation with zero frames.
pub(crate) fn read_extended_chunks(
    chunks: &mut ChunkWalker<'_>,
    header: &ExtendedHeader,
) -> Result<Option<AnimationSummary>, ValidationError> {
    let mut params: Option<AnimationParams> = None;
    let mut num_frames = 0u32;
    let mut image_chunk: Option<WebPRiffChunk> = None;
    let mut has_exif = false;
    let mut has_xmp = false;

    for chunk in chunks {
        let chunk = chunk?;
        match chunk.kind {
            WebPRiffChunk::ANIM if header.flags.animation => {
                if params.is_none() {
                    params = Some(read_anim_params(chunk.payload)?);
                } else {
                    log::debug!("ignoring duplicate ANIM chunk at offset {}", chunk.offset);
                }
            }
            WebPRiffChunk::ANMF if header.flags.animation => {
                if params.is_none() {
                    return Err(HeaderError::FrameBeforeAnim.into());
                }
                if chunk.payload.len() < ANMF_HEADER_SIZE {
                    return Err(HeaderError::AnmfTooShort(chunk.payload.len()).into());
                }
                num_frames = num_frames.saturating_add(1);
            }
            kind @ (WebPRiffChunk::VP8 | WebPRiffChunk::VP8L) if !header.flags.animation => {
                if image_chunk.replace(kind).is_some() {
                    return Err(HeaderError::MultipleImageChunks.into());
                }
                let (width, height) = if kind == WebPRiffChunk::VP8 {
                    let frame = read_frame_header(chunk.payload)?;
                    (frame.width, frame.height)
                } else {
                    let frame = read_lossless_header(chunk.payload)?;
                    (frame.width, frame.height)
                };
                if (u32::from(width), u32::from(height))
                    != (header.canvas_width, header.canvas_height)
                {
                    log::debug!(
                        "{kind:?} bitstream is {width}x{height}, canvas is {}x{}",
                        header.canvas_width,
                        header.canvas_height
                    );
                }
            }
            WebPRiffChunk::EXIF => has_exif = true,
            WebPRiffChunk::XMP => has_xmp = true,
            kind => log::trace!("skipping {kind:?} chunk of {} bytes", chunk.size),
        }
    }

    if header.flags.exif_metadata && !has_exif {
        return Err(HeaderError::MetadataChunkMissing(*b"EXIF").into());
    }
    if header.flags.xmp_metadata && !has_xmp {
        return Err(HeaderError::MetadataChunkMissing(*b"XMP ").into());
    }

    if !header.flags.animation {
        if image_chunk.is_none() {
            return Err(HeaderError::ImageChunkMissing.into());
        }
        return Ok(None);
    }

    let params = params.ok_or(HeaderError::AnimChunkMissing)?;
    if num_frames == 0 {
        log::debug!("animated image contains no frames");
    }

    Ok(Some(AnimationSummary { params, num_frames }))
}
