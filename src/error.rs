//! Error types for the read and write entry points.

use thiserror::Error;

/// Failures surfaced when reading or writing the binary formats.
///
/// Out-of-bounds accesses are programming bugs and panic instead, the way
/// slice indexing does.
#[derive(Debug, Error)]
pub enum Error {
    /// The source did not start with the expected magic number.
    #[error("bad magic number: {0:#018x}")]
    BadMagic(u64),

    /// An encoding tag byte was not one this reader understands.
    #[error("unknown encoding tag: {0}")]
    UnknownTag(u8),

    /// A byte dictionary declared more entries than the format allows.
    #[error("dictionary too large: {0} entries")]
    DictionaryTooLarge(usize),

    /// An encoded index pointed past the end of its dictionary.
    #[error("dictionary index out of range: {0}")]
    BadDictionaryIndex(u8),

    /// A string payload does not fit its 16-bit length prefix.
    #[error("string too long to encode: {0} bytes")]
    StringTooLong(usize),

    /// String bytes were not valid modified UTF-8.
    #[error("malformed string bytes")]
    MalformedString,

    /// An error from the underlying source or sink, passed through.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized result type for bonsai operations.
pub type Result<T> = std::result::Result<T, Error>;
