//! Structural validation of WebP images
//!
//! Walks the RIFF container of a WebP file and reports its declared dimensions, alpha,
//! animation and frame count without decoding any pixel data. Input is treated as untrusted:
//! every read is bounded by the buffer, whatever sizes the file claims.
//!
//! ```
//! let result = webp_validator::validate(b"RIFF\x04\x00\x00\x00WEBP");
//! assert!(!result.is_valid());
//! assert!(result.error().is_some());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub use self::error::{ContainerError, ErrorKind, HeaderError, ValidationError};
pub use self::extended::{AnimationParams, FeatureFlags};
pub use self::result::{validate, ValidationResult};
pub use self::validator::{inspect, validate_webp, ImageFormat, WebpInfo};

mod chunk;
mod cursor;
mod error;
mod extended;
mod lossless;
mod result;
mod validator;
mod vp8;

#[cfg(feature = "ffi")]
#[allow(unsafe_code)]
pub mod ffi;
