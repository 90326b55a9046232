//! Error taxonomy shared by every decoding stage.
//!
//! Every variant is terminal for the operation that raised it: a container
//! either decodes completely or not at all.

use std::io;
use thiserror::Error;

use crate::value::ValueType;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No cipher method produced the directory signature.
    #[error("Unsupported package version: no cipher method matched the directory signature")]
    UnsupportedVersion,

    #[error("Container header field {field} is negative: {value}")]
    NegativeHeaderField { field: &'static str, value: i32 },

    #[error("Directory truncated: needed {needed} bytes, {available} available")]
    TruncatedDirectory { needed: usize, available: usize },

    #[error("Offset table position {0} out of range")]
    InvalidTableLocation(u32),

    #[error("Offset table marker not found (expected 7, found {0})")]
    TableMarkerNotFound(u8),

    #[error("Invalid string index: {0}")]
    InvalidStringIndex(i32),

    #[error("Invalid string offset: {0}")]
    InvalidStringOffset(i32),

    #[error("Unexpected value type: expected {expected}, found {found}")]
    UnexpectedType { expected: ValueType, found: u8 },

    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(u8),

    /// Wrong terminator tag, or the block ended inside the hash (`None`).
    #[error("Unterminated hash (terminator tag {0:?})")]
    UnterminatedHash(Option<u8>),

    #[error("Unterminated array (terminator tag {0:?})")]
    UnterminatedArray(Option<u8>),

    #[error("Hash declares zero entries")]
    EmptyHash,

    #[error("Invalid {kind}: {text:?}")]
    NumericParseError { kind: ValueType, text: String },

    #[error("Value tree nested deeper than {0} levels")]
    DepthExceeded(usize),

    /// The root hash has no usable `"files"` array.
    #[error("No files found in package directory")]
    MissingFiles,
}

pub type Result<T> = std::result::Result<T, PackError>;
