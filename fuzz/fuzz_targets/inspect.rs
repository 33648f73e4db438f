#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &[u8]| {
    let first = webp_validator::inspect(input);
    if let Ok(info) = &first {
        assert!(info.num_frames == 0 || info.is_animated);
    }
    assert_eq!(first, webp_validator::inspect(input));
});
