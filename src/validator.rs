use crate::chunk::{ChunkWalker, WebPRiffChunk};
use crate::cursor::{read_riff_header, ByteCursor};
use crate::error::ValidationError;
use crate::extended::{
    read_extended_chunks, read_extended_header, AnimationParams, FeatureFlags,
};
use crate::lossless::read_lossless_header;
use crate::vp8::read_frame_header;

/// Which of the three WebP layouts the file uses, decided by its first chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// A single `VP8 ` chunk
    Lossy,
    /// A single `VP8L` chunk
    Lossless,
    /// A `VP8X` chunk followed by image, animation and metadata chunks
    Extended,
}

/// The declared properties of a structurally valid WebP file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebpInfo {
    /// Image width, or canvas width for extended files
    pub width: u32,
    /// Image height, or canvas height for extended files
    pub height: u32,
    /// Whether the image declares transparency
    pub has_alpha: bool,
    /// Whether the `VP8X` animation flag is set
    pub is_animated: bool,
    /// Number of `ANMF` chunks; zero for still images
    pub num_frames: u32,
    /// Layout named by the first chunk
    pub format: ImageFormat,
    /// Feature flags of the `VP8X` chunk, for extended files only
    pub features: Option<FeatureFlags>,
    /// Contents of the `ANIM` chunk, for animated files only
    pub animation: Option<AnimationParams>,
}

impl WebpInfo {
    fn still(format: ImageFormat, width: u32, height: u32, has_alpha: bool) -> Self {
        WebpInfo {
            width,
            height,
            has_alpha,
            is_animated: false,
            num_frames: 0,
            format,
            features: None,
            animation: None,
        }
    }
}

/// Checks that `data` is a structurally valid WebP file and returns its declared properties.
///
/// Pixel data is never decoded. Every read is bounded by `data.len()`, whatever sizes the
/// file declares, so any input either yields `Ok` or a [`ValidationError`].
pub fn inspect(data: &[u8]) -> Result<WebpInfo, ValidationError> {
    if data.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let mut r = ByteCursor::new(data);
    let riff_size = read_riff_header(&mut r)?;
    if usize::try_from(riff_size).map_or(true, |size| size.saturating_add(8) != data.len()) {
        log::debug!(
            "RIFF header declares {} bytes but the buffer holds {}",
            u64::from(riff_size) + 8,
            data.len()
        );
    }

    let mut chunks = ChunkWalker::new(data, riff_size);
    let first = chunks.next().transpose()?;

    let info = match first {
        Some(chunk) if chunk.kind == WebPRiffChunk::VP8 => {
            let header = read_frame_header(chunk.payload)?;
            WebpInfo::still(
                ImageFormat::Lossy,
                header.width.into(),
                header.height.into(),
                false,
            )
        }
        Some(chunk) if chunk.kind == WebPRiffChunk::VP8L => {
            let header = read_lossless_header(chunk.payload)?;
            WebpInfo::still(
                ImageFormat::Lossless,
                header.width.into(),
                header.height.into(),
                header.alpha_is_used,
            )
        }
        Some(chunk) if chunk.kind == WebPRiffChunk::VP8X => {
            let header = read_extended_header(chunk.payload)?;
            let animation = read_extended_chunks(&mut chunks, &header)?;

            WebpInfo {
                width: header.canvas_width,
                height: header.canvas_height,
                has_alpha: header.flags.alpha,
                is_animated: animation.is_some(),
                num_frames: animation.map_or(0, |a| a.num_frames),
                format: ImageFormat::Extended,
                features: Some(header.flags),
                animation: animation.map(|a| a.params),
            }
        }
        Some(chunk) => {
            return Err(ValidationError::UnrecognizedFormat(Some(
                chunk.kind.to_fourcc(),
            )))
        }
        None => return Err(ValidationError::UnrecognizedFormat(None)),
    };

    log::debug!(
        "{:?} WebP {}x{}, alpha: {}, frames: {}",
        info.format,
        info.width,
        info.height,
        info.has_alpha,
        info.num_frames
    );

    Ok(info)
}

/// Validates WebP image format, describing any failure as text.
pub fn validate_webp(data: &[u8]) -> Result<WebpInfo, String> {
    inspect(data).map_err(|e| format!("webp format validation failed: {e}"))
}
