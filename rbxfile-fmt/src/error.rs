use rbxfile_base::ByteStr;
use std::fmt;

/// Any way a place file can fail to decode. Decoding aborts on the first
/// error; no partial file is ever returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The file does not start with the `<roblox!` signature.
    BadMagic,
    /// A read ran off the end of the input or of a decompressed record.
    UnexpectedEnd,
    /// A record tag was not the expected one. During the property-record
    /// loop this is the normal termination condition, not a failure.
    WrongTag { expected: [u8; 4], got: [u8; 4] },
    /// The reserved word of a record header was not zero.
    CorruptChunkHeader,
    /// The LZ4 payload of a record did not inflate to its declared size.
    DecompressFailed,
    /// A byte region that must hold whole 32-bit words (or a fixed multiple
    /// of the instance count) had a stray length.
    BadLength,
    /// A property record named a class id past the declared class count.
    UnknownClass(u32),
    /// A rotation header byte outside the known encodings.
    BadCFrameTag(u8),
    /// A parent record with a version byte we do not understand.
    UnsupportedPrntVersion(u8),
    /// A count cross-check failed: header totals vs. streamed records,
    /// or a referent outside the file's referent space.
    CountMismatch { expected: i64, got: i64 },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::BadMagic => write!(f, "bad file signature"),
            DecodeError::UnexpectedEnd => write!(f, "unexpected end of input"),
            DecodeError::WrongTag { expected, got } => write!(
                f,
                "wrong record tag: expected {:?}, got {:?}",
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(got)
            ),
            DecodeError::CorruptChunkHeader => write!(f, "corrupt record header"),
            DecodeError::DecompressFailed => write!(f, "record payload failed to decompress"),
            DecodeError::BadLength => write!(f, "byte region has a bad length"),
            DecodeError::UnknownClass(id) => write!(f, "property record names unknown class {}", id),
            DecodeError::BadCFrameTag(tag) => write!(f, "bad coordinate-frame rotation tag {:#04x}", tag),
            DecodeError::UnsupportedPrntVersion(v) => {
                write!(f, "unsupported parent record version {}", v)
            }
            DecodeError::CountMismatch { expected, got } => {
                write!(f, "count mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Recoverable oddities met while decoding. These never abort the decode;
/// they are collected in order on the returned file and also emitted as
/// `tracing` warnings as they are found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// A property column with a reserved or unknown value-kind tag. The
    /// payload is preserved opaquely on the property's values.
    ReservedKind { prop: ByteStr, kind: u8 },
    /// A coordinate frame using a short-form rotation tag. The axis-aligned
    /// orientation table is not wired up, so the rotation was decoded as
    /// identity.
    ShortRotation { prop: ByteStr, tag: u8 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ReservedKind { prop, kind } => write!(
                f,
                "property '{}' has reserved value kind {:#04x}; kept as opaque bytes",
                prop, kind
            ),
            Warning::ShortRotation { prop, tag } => write!(
                f,
                "property '{}' uses short rotation form {:#04x}; decoded as identity",
                prop, tag
            ),
        }
    }
}
