use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use webp_validator::{inspect, validate, ErrorKind, ImageFormat, ValidationError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Writes a chunk and returns the offset of its size field.
fn push_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) -> usize {
    out.extend_from_slice(fourcc);
    let size_offset = out.len();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    size_offset
}

/// Builds a RIFF/WEBP file and returns it along with the offsets of every size field.
fn riff(chunks: &[(&[u8; 4], Vec<u8>)]) -> (Vec<u8>, Vec<usize>) {
    let mut out = b"RIFF\0\0\0\0WEBP".to_vec();
    let mut size_fields = vec![4];
    for (fourcc, payload) in chunks {
        size_fields.push(push_chunk(&mut out, fourcc, payload));
    }
    let riff_size = (out.len() - 8) as u32;
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());
    (out, size_fields)
}

fn vp8_payload(width: u16, height: u16) -> Vec<u8> {
    let mut payload = vec![0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a];
    payload.extend_from_slice(&width.to_le_bytes());
    payload.extend_from_slice(&height.to_le_bytes());
    // a few bytes standing in for the first partition
    payload.extend_from_slice(&[0; 6]);
    payload
}

fn vp8l_payload(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let bits = (width - 1) | (height - 1) << 14 | u32::from(alpha) << 28;
    let mut payload = vec![0x2f];
    payload.extend_from_slice(&bits.to_le_bytes());
    payload.extend_from_slice(&[0; 3]);
    payload
}

fn vp8x_payload(flags: u8, width: u32, height: u32) -> Vec<u8> {
    let mut payload = vec![flags, 0, 0, 0];
    payload.extend_from_slice(&(width - 1).to_le_bytes()[..3]);
    payload.extend_from_slice(&(height - 1).to_le_bytes()[..3]);
    payload
}

fn anmf_payload(frame: &[u8]) -> Vec<u8> {
    // x, y, width - 1, height - 1, duration, flags
    let mut payload = vec![0, 0, 0, 0, 0, 0, 9, 0, 0, 9, 0, 0, 100, 0, 0, 0];
    push_chunk(&mut payload, b"VP8L", frame);
    payload
}

const ALPHA: u8 = 0x10;
const ANIMATION: u8 = 0x02;

fn lossy() -> (Vec<u8>, Vec<usize>) {
    riff(&[(b"VP8 ", vp8_payload(100, 50))])
}

fn lossless() -> (Vec<u8>, Vec<usize>) {
    riff(&[(b"VP8L", vp8l_payload(640, 480, true))])
}

fn extended_alpha() -> (Vec<u8>, Vec<usize>) {
    riff(&[
        (b"VP8X", vp8x_payload(ALPHA, 256, 256)),
        (b"ALPH", vec![0; 7]),
        (b"VP8 ", vp8_payload(256, 256)),
    ])
}

fn animated() -> (Vec<u8>, Vec<usize>) {
    let frame = vp8l_payload(10, 10, true);
    riff(&[
        (b"VP8X", vp8x_payload(ANIMATION | ALPHA, 400, 300)),
        (b"ANIM", vec![0xff, 0xff, 0xff, 0xff, 0, 0]),
        (b"ANMF", anmf_payload(&frame)),
        (b"ANMF", anmf_payload(&frame)),
        (b"ANMF", anmf_payload(&frame)),
    ])
}

fn animated_without_frames() -> (Vec<u8>, Vec<usize>) {
    riff(&[
        (b"VP8X", vp8x_payload(ANIMATION, 32, 32)),
        (b"ANIM", vec![0, 0, 0, 0, 2, 0]),
    ])
}

fn extended_with_metadata() -> (Vec<u8>, Vec<usize>) {
    riff(&[
        (b"VP8X", vp8x_payload(0x20 | 0x08 | 0x04, 640, 480)),
        (b"ICCP", vec![1; 33]),
        (b"VP8L", vp8l_payload(640, 480, false)),
        (b"EXIF", b"Exif\0\0MM".to_vec()),
        (b"XMP ", b"<x:xmpmeta/>".to_vec()),
    ])
}

/// (width, height, has_alpha, is_animated, num_frames)
type Expected = (u32, u32, bool, bool, u32);

fn check(data: &[u8], expected: Expected) {
    init_logging();
    let result = validate(data);
    assert!(result.is_valid(), "{:?}", result.error());
    assert_eq!(result.error(), None);
    assert_eq!(
        (
            result.width(),
            result.height(),
            result.has_alpha(),
            result.is_animated(),
            result.num_frames()
        ),
        expected
    );
}

macro_rules! valid_case {
    ($($name:ident => $expected:expr),+ $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<valid_ $name>]() {
                    check(&$name().0, $expected);
                }
            }
        )+
    };
}

valid_case!(
    lossy => (100, 50, false, false, 0),
    lossless => (640, 480, true, false, 0),
    extended_alpha => (256, 256, true, false, 0),
    animated => (400, 300, true, true, 3),
    animated_without_frames => (32, 32, false, true, 0),
    extended_with_metadata => (640, 480, false, false, 0),
);

#[test]
fn rich_info_for_animations() {
    let info = inspect(&animated().0).unwrap();
    assert_eq!(info.format, ImageFormat::Extended);
    let features = info.features.unwrap();
    assert!(features.animation && features.alpha);
    assert!(!features.icc_profile && !features.exif_metadata && !features.xmp_metadata);
    let animation = info.animation.unwrap();
    assert_eq!(animation.background_color, [0xff; 4]);
    assert_eq!(animation.loop_count, 0);
}

#[test]
fn metadata_flags_are_reported() {
    let info = inspect(&extended_with_metadata().0).unwrap();
    let features = info.features.unwrap();
    assert!(features.icc_profile && features.exif_metadata && features.xmp_metadata);
    assert_eq!(info.animation, None);
}

#[test]
fn short_inputs_never_pass() {
    init_logging();
    let (data, _) = lossy();
    for len in 0..12 {
        let err = inspect(&data[..len]).unwrap_err();
        let expected = if len == 0 {
            ErrorKind::EmptyInput
        } else {
            ErrorKind::BadContainer
        };
        assert_eq!(err.kind(), expected, "length {len}");
    }
}

#[test]
fn every_prefix_is_handled() {
    for (data, _) in [lossy(), lossless(), extended_alpha(), animated()] {
        for len in 0..data.len() {
            let result = validate(&data[..len]);
            assert_eq!(result.is_valid(), result.error().is_none());
        }
    }
}

#[test]
fn wrong_envelope_is_rejected() {
    let (mut data, _) = lossy();
    data[0..4].copy_from_slice(b"RIFX");
    assert_eq!(inspect(&data).unwrap_err().kind(), ErrorKind::BadContainer);

    let (mut data, _) = lossy();
    data[8..12].copy_from_slice(b"WAVE");
    assert_eq!(inspect(&data).unwrap_err().kind(), ErrorKind::BadContainer);
}

#[test]
fn jpeg_is_rejected_with_message() {
    let mut jpeg = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
    jpeg.extend_from_slice(b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00");
    let result = validate(&jpeg);
    assert!(!result.is_valid());
    assert!(!result.error().unwrap().is_empty());
}

#[test]
fn declared_riff_size_is_informational() {
    let (mut data, _) = extended_alpha();
    data[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
    check(&data, (256, 256, true, false, 0));

    let (mut data, _) = extended_alpha();
    data.extend_from_slice(b"\0\0\0");
    check(&data, (256, 256, true, false, 0));
}

#[test]
fn truncated_frame_is_reported() {
    let (mut data, _) = animated();
    data.truncate(data.len() - 4);
    let err = inspect(&data).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::TruncatedChunk { tag, .. } if &tag == b"ANMF"
    ));
}

#[test]
fn bad_bitstream_signatures() {
    let mut payload = vp8_payload(1, 1);
    payload[5] = 0x2b;
    let err = validate(&riff(&[(b"VP8 ", payload)]).0);
    assert!(err.error().unwrap().starts_with("invalid VP8 bitstream"));

    let mut payload = vp8l_payload(1, 1, false);
    payload[0] = 0x2e;
    let err = validate(&riff(&[(b"VP8L", payload)]).0);
    assert!(err.error().unwrap().starts_with("invalid VP8L bitstream"));

    let err = validate(&riff(&[(b"VP8X", vec![0; 8])]).0);
    assert!(err.error().unwrap().starts_with("malformed VP8X header"));
}

#[test]
fn unrecognized_first_chunk() {
    let (data, _) = riff(&[(b"EXIF", vec![0; 4]), (b"VP8 ", vp8_payload(1, 1))]);
    assert_eq!(
        inspect(&data).unwrap_err().kind(),
        ErrorKind::UnrecognizedFormat
    );
}

#[test]
fn size_field_mutations_never_panic() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0x5745_4250);

    for (data, size_fields) in [
        lossy(),
        lossless(),
        extended_alpha(),
        animated(),
        animated_without_frames(),
        extended_with_metadata(),
    ] {
        for _ in 0..500 {
            let mut mutated = data.clone();
            let field = size_fields[rng.gen_range(0..size_fields.len())];
            let index = field + rng.gen_range(0..4);
            mutated[index] ^= rng.gen_range(1..=u8::MAX);

            let result = validate(&mutated);
            assert_eq!(result, validate(&mutated));
            if let Err(err) = inspect(&mutated) {
                assert!(
                    matches!(
                        err.kind(),
                        ErrorKind::TruncatedChunk | ErrorKind::MalformedHeader
                    ),
                    "unexpected {err:?} after mutating byte {index}"
                );
                assert!(!err.to_string().is_empty());
            }
        }
    }
}

#[test]
fn random_garbage_never_panics() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..2000 {
        let len = rng.gen_range(0..64);
        let mut data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        if len >= 12 && rng.gen_bool(0.5) {
            data[0..4].copy_from_slice(b"RIFF");
            data[8..12].copy_from_slice(b"WEBP");
        }
        let result = validate(&data);
        assert_eq!(result.is_valid(), result.error().is_none());
    }
}

#[test]
fn extended_still_without_image_chunk() {
    let (data, _) = riff(&[(b"VP8X", vp8x_payload(ALPHA, 256, 256))]);
    let result = validate(&data);
    assert!(!result.is_valid());
    assert_eq!(result.width(), 0);
    assert_eq!(
        result.error(),
        Some("malformed VP8X header: missing image chunk")
    );
}

#[test]
fn extended_still_with_corrupt_bitstream() {
    let mut payload = vp8_payload(256, 256);
    payload[3..6].copy_from_slice(&[0xde, 0xad, 0xbe]);
    let (data, _) = riff(&[
        (b"VP8X", vp8x_payload(ALPHA, 256, 256)),
        (b"VP8 ", payload),
    ]);
    let err = inspect(&data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedHeader);
    assert!(err.to_string().starts_with("invalid VP8 bitstream"));
}

#[test]
fn flagged_metadata_without_chunk() {
    for (flag, fourcc) in [(0x08, "EXIF"), (0x04, "XMP ")] {
        let (data, _) = riff(&[
            (b"VP8X", vp8x_payload(flag, 640, 480)),
            (b"VP8L", vp8l_payload(640, 480, false)),
        ]);
        let err = inspect(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);
        assert!(err.to_string().contains(fourcc), "{err}");
    }
}

#[test]
fn understated_riff_size_still_reports_truncation() {
    let (mut data, _) = lossy();
    data[4..8].copy_from_slice(&4u32.to_le_bytes());
    data.truncate(data.len() - 4);
    assert_eq!(inspect(&data).unwrap_err().kind(), ErrorKind::TruncatedChunk);
}
