#![no_main]

use libfuzzer_sys::fuzz_target;
use webp_validator::ffi::{free_error_message, validate_webp_ffi};

fuzz_target!(|input: &[u8]| {
    let result = unsafe { validate_webp_ffi(input.as_ptr(), input.len()) };
    assert_eq!(result.is_valid, result.error_message.is_null());
    unsafe { free_error_message(result.error_message) };
});
