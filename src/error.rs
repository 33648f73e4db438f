use thiserror::Error;

/// All the ways a buffer can fail WebP validation.
///
/// Every variant is terminal for the call that produced it: the whole buffer is
/// one unit of validation and nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// The input buffer had zero length
    #[error("data is empty")]
    EmptyInput,

    /// The outer RIFF envelope is missing or malformed
    #[error("not a RIFF/WEBP container: {0}")]
    BadContainer(ContainerError),

    /// The first chunk is not `VP8 `, `VP8L` or `VP8X`, or there are no chunks at all
    #[error("unrecognized WebP format: {}", describe_first_chunk(.0))]
    UnrecognizedFormat(Option<[u8; 4]>),

    /// A chunk declares more payload than the buffer holds
    #[error(
        "truncated {} chunk: declares {declared} bytes but only {available} remain",
        printable(.tag)
    )]
    TruncatedChunk {
        /// FourCC of the offending chunk
        tag: [u8; 4],
        /// Size field as stored in the chunk header
        declared: u32,
        /// Bytes actually left in the buffer after the chunk header
        available: usize,
    },

    /// A format specific header is present but too short or fails a signature check
    #[error(transparent)]
    MalformedHeader(#[from] HeaderError),
}

/// Fieldless discriminant of [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// See [`ValidationError::EmptyInput`]
    EmptyInput,
    /// See [`ValidationError::BadContainer`]
    BadContainer,
    /// See [`ValidationError::UnrecognizedFormat`]
    UnrecognizedFormat,
    /// See [`ValidationError::TruncatedChunk`]
    TruncatedChunk,
    /// See [`ValidationError::MalformedHeader`]
    MalformedHeader,
}

impl ValidationError {
    /// Returns which of the error kinds this is, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::BadContainer(_) => ErrorKind::BadContainer,
            Self::UnrecognizedFormat(_) => ErrorKind::UnrecognizedFormat,
            Self::TruncatedChunk { .. } => ErrorKind::TruncatedChunk,
            Self::MalformedHeader(_) => ErrorKind::MalformedHeader,
        }
    }
}

/// Why the 12 byte RIFF/WEBP envelope was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContainerError {
    /// Fewer than 12 bytes, so there is no room for the envelope
    #[error("{0} bytes is shorter than the 12 byte RIFF header")]
    TooShort(usize),

    /// RIFF's "RIFF" signature not found
    #[error("invalid RIFF signature {}", printable(.0))]
    RiffSignatureInvalid([u8; 4]),

    /// WebP's "WEBP" form type not found
    #[error("invalid form type {}", printable(.0))]
    WebpSignatureInvalid([u8; 4]),
}

/// Faults inside the VP8X, ANIM, ANMF, VP8 and VP8L headers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HeaderError {
    /// VP8X payload cannot hold the flags and canvas size
    #[error("malformed VP8X header: {0} bytes, expected at least 10")]
    Vp8xTooShort(usize),

    /// Product of canvas dimensions cannot be larger than u32 max
    #[error("malformed VP8X header: canvas {width}x{height} is too large")]
    #[allow(missing_docs)]
    CanvasTooLarge { width: u32, height: u32 },

    /// ANIM payload cannot hold the background color and loop count
    #[error("malformed ANIM chunk: {0} bytes, expected at least 6")]
    AnimTooShort(usize),

    /// The VP8X animation flag is set but no ANIM chunk follows
    #[error("malformed ANIM chunk: animated image has no ANIM chunk")]
    AnimChunkMissing,

    /// An ANMF chunk was found before the ANIM chunk
    #[error("malformed ANIM chunk: ANMF frame precedes the ANIM chunk")]
    FrameBeforeAnim,

    /// A still VP8X image has no `VP8 ` or `VP8L` chunk
    #[error("malformed VP8X header: missing image chunk")]
    ImageChunkMissing,

    /// A still VP8X image has more than one `VP8 ` or `VP8L` chunk
    #[error("malformed VP8X header: more than one image chunk")]
    MultipleImageChunks,

    /// The VP8X flags declare an `EXIF` or `XMP ` chunk that is not present
    #[error("malformed VP8X header: flags declare a {} chunk but none is present", printable(.0))]
    MetadataChunkMissing([u8; 4]),

    /// ANMF payload cannot hold the frame header
    #[error("malformed ANMF chunk: {0} bytes, expected at least 16")]
    AnmfTooShort(usize),

    /// VP8 payload cannot hold the frame tag, start code and dimensions
    #[error("invalid VP8 bitstream: {0} bytes, expected at least 10")]
    Vp8TooShort(usize),

    /// VP8's `[0x9D, 0x01, 0x2A]` magic not found
    #[error("invalid VP8 bitstream: start code {0:02x?}")]
    Vp8MagicInvalid([u8; 3]),

    /// VP8L payload cannot hold the signature and packed header
    #[error("invalid VP8L bitstream: {0} bytes, expected at least 5")]
    Vp8lTooShort(usize),

    /// Signature of 0x2f not found
    #[error("invalid VP8L bitstream: signature {0:#04x}")]
    LosslessSignatureInvalid(u8),
}

impl From<ContainerError> for ValidationError {
    fn from(err: ContainerError) -> Self {
        ValidationError::BadContainer(err)
    }
}

/// Renders a FourCC with non-printable bytes escaped, e.g. `"VP8 "` or `"\x00\x01ab"`.
pub(crate) fn printable(tag: &[u8; 4]) -> String {
    let escaped: String = tag
        .iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect();
    format!("\"{escaped}\"")
}

fn describe_first_chunk(tag: &Option<[u8; 4]>) -> String {
    match tag {
        Some(tag) => format!("first chunk is {}", printable(tag)),
        None => "no chunks after the RIFF header".to_owned(),
    }
}
