//! C ABI, declared in `include/webp_validator.h`.
//!
//! The error text of a [`WebpValidationResult`] is a heap allocation owned by the caller. It
//! does not borrow the input buffer and must be released with [`free_error_message`] exactly
//! once.

use std::ffi::CString;
use std::os::raw::c_char;

use crate::result::{validate, ValidationResult};

/// C-compatible WebP validation result
#[repr(C)]
#[derive(Debug)]
pub struct WebpValidationResult {
    /// Whether the data is a valid WebP file
    pub is_valid: bool,
    /// Image width, zero if invalid
    pub width: u32,
    /// Image height, zero if invalid
    pub height: u32,
    /// Whether the image has an alpha channel
    pub has_alpha: bool,
    /// Whether the image is animated
    pub is_animated: bool,
    /// Number of frames of an animated image
    pub num_frames: u32,
    /// Null when `is_valid` is true, otherwise a NUL terminated message
    pub error_message: *mut c_char,
}

impl WebpValidationResult {
    fn invalid(message: &str) -> Self {
        WebpValidationResult {
            is_valid: false,
            width: 0,
            height: 0,
            has_alpha: false,
            is_animated: false,
            num_frames: 0,
            error_message: into_c_message(message),
        }
    }
}

impl From<ValidationResult> for WebpValidationResult {
    fn from(result: ValidationResult) -> Self {
        WebpValidationResult {
            is_valid: result.is_valid(),
            width: result.width(),
            height: result.height(),
            has_alpha: result.has_alpha(),
            is_animated: result.is_animated(),
            num_frames: result.num_frames(),
            error_message: match result.error() {
                Some(message) => into_c_message(message),
                None => std::ptr::null_mut(),
            },
        }
    }
}

fn into_c_message(message: &str) -> *mut c_char {
    let message = CString::new(message)
        .or_else(|_| CString::new("error message contained a NUL byte"))
        .unwrap_or_default();
    message.into_raw()
}

/// Validate WebP file via FFI
///
/// # Safety
/// Caller must ensure:
/// 1. `data` is either null or a valid pointer to a byte array of length `len`
/// 2. a non-null `error_message` of the result is freed using `free_error_message`
#[no_mangle]
pub unsafe extern "C" fn validate_webp_ffi(data: *const u8, len: usize) -> WebpValidationResult {
    if data.is_null() {
        return WebpValidationResult::invalid("data pointer is null");
    }

    let slice = unsafe { std::slice::from_raw_parts(data, len) };
    validate(slice).into()
}

/// Free error message memory allocated by `validate_webp_ffi`
///
/// # Safety
/// Caller must ensure:
/// 1. `error_message` is null or was returned by `validate_webp_ffi`
/// 2. This function is called only once per pointer
#[no_mangle]
pub unsafe extern "C" fn free_error_message(error_message: *mut c_char) {
    if !error_message.is_null() {
        drop(unsafe { CString::from_raw(error_message) });
    }
}
