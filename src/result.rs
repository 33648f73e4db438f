use crate::error::ValidationError;
use crate::validator::{inspect, WebpInfo};

/// Flat validation record handed to callers that cannot consume a `Result`.
///
/// When the buffer is valid all properties are populated and [`error`](Self::error) is `None`.
/// Otherwise every numeric field is zero, every flag is false and the error text is non-empty,
/// so an invalid file is never confused with a valid but empty animation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationResult {
    width: u32,
    height: u32,
    has_alpha: bool,
    is_animated: bool,
    num_frames: u32,
    error: Option<String>,
}

impl ValidationResult {
    /// Whether the buffer is a structurally valid WebP file.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Image or canvas width, zero if invalid.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image or canvas height, zero if invalid.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the image declares transparency, false if invalid.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Whether the image is animated, false if invalid.
    pub fn is_animated(&self) -> bool {
        self.is_animated
    }

    /// Number of animation frames, zero if invalid or still.
    pub fn num_frames(&self) -> u32 {
        self.num_frames
    }

    /// Human readable diagnosis, present if and only if the buffer is invalid.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Takes the error text out of the record.
    pub fn into_error(self) -> Option<String> {
        self.error
    }
}

impl From<WebpInfo> for ValidationResult {
    fn from(info: WebpInfo) -> Self {
        ValidationResult {
            width: info.width,
            height: info.height,
            has_alpha: info.has_alpha,
            is_animated: info.is_animated,
            num_frames: info.num_frames,
            error: None,
        }
    }
}

impl From<ValidationError> for ValidationResult {
    fn from(err: ValidationError) -> Self {
        ValidationResult {
            width: 0,
            height: 0,
            has_alpha: false,
            is_animated: false,
            num_frames: 0,
            error: Some(err.to_string()),
        }
    }
}

impl From<Result<WebpInfo, ValidationError>> for ValidationResult {
    fn from(result: Result<WebpInfo, ValidationError>) -> Self {
        match result {
            Ok(info) => info.into(),
            Err(err) => err.into(),
        }
    }
}

/// Validates `data` and flattens the outcome into a [`ValidationResult`].
pub fn validate(data: &[u8]) -> ValidationResult {
    inspect(data).into()
}
