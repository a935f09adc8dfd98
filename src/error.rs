use crate::compress::CompressionError;
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// The first byte of the buffer wasn't the ISON document header. `found` is `None` if the
    /// buffer was empty.
    NotAnIsonDocument { found: Option<u8> },
    /// A read went past the end of the buffer. `offset` is where the read started.
    BufferUnderrun { offset: usize, step: &'static str },
    /// Structural failure: unmatched start/end markers, a key-value marker outside of an object,
    /// a non-string key, invalid UTF-8, or the depth limit was exceeded.
    MalformedDocument(String),
    /// The document terminator was missing and the decoder was in strict mode.
    TruncatedDocument { offset: usize },
    /// A container declared a compressed length that doesn't fit in its capacity.
    CorruptContainer { declared: usize, capacity: usize },
    /// A container buffer didn't match the capacity of the profile used to read or write it.
    CapacityMismatch { expected: usize, actual: usize },
    /// The compressed payload plus its length prefix doesn't fit in the container.
    PayloadTooLarge { capacity: usize, actual: usize },
    /// Failure within the compression layer.
    Compression(CompressionError),
    /// A version profile couldn't be built from the supplied settings.
    BadConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NotAnIsonDocument { found: Some(tag) } => write!(
                f,
                "Not an ISON document: expected header tag, found 0x{:02x}",
                tag
            ),
            Error::NotAnIsonDocument { found: None } => {
                f.write_str("Not an ISON document: buffer is empty")
            }
            Error::BufferUnderrun { offset, step } => write!(
                f,
                "Buffer ended early at offset {} on step [{}]",
                offset, step
            ),
            Error::MalformedDocument(ref err) => write!(f, "Malformed document: {}", err),
            Error::TruncatedDocument { offset } => write!(
                f,
                "Document terminator missing at offset {}",
                offset
            ),
            Error::CorruptContainer { declared, capacity } => write!(
                f,
                "Container declares {} compressed bytes, but only {} fit in its capacity",
                declared,
                capacity.saturating_sub(2)
            ),
            Error::CapacityMismatch { expected, actual } => write!(
                f,
                "Container buffer is {} bytes, profile capacity is {}",
                actual, expected
            ),
            Error::PayloadTooLarge { capacity, actual } => write!(
                f,
                "Compressed payload needs {} bytes, container capacity is {}",
                actual, capacity
            ),
            Error::Compression(ref err) => write!(f, "Compression failure: {}", err),
            Error::BadConfig(ref err) => write!(f, "Bad profile configuration: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Compression(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<CompressionError> for Error {
    fn from(e: CompressionError) -> Self {
        Self::Compression(e)
    }
}
