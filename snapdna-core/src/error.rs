use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapError {
    #[error("malformed container at byte {offset}: {msg}")]
    MalformedContainer { msg: &'static str, offset: usize },

    #[error("unsupported format version: {version}")]
    UnsupportedVersion { version: u16 },

    #[error("malformed markup in {segment} segment: {msg}")]
    MalformedMarkup { segment: &'static str, msg: String },

    #[error("malformed segment (type {type_code}): {msg}")]
    MalformedSegment { type_code: u8, msg: &'static str },

    #[error("segment (type {type_code}) is too large to frame: {len} bytes")]
    SegmentTooLarge { type_code: u8, len: usize },

    #[error("{name} encoder received a payload of another segment type")]
    CodecMismatch { name: &'static str },

    #[error("segment type {type_code} is kept as raw bytes and cannot be edited")]
    NotDecoded { type_code: u8 },

    #[error("no {kind} named '{name}'")]
    NotFound { kind: &'static str, name: String },

    #[error("document was not read from a file; an output path is required")]
    MissingOutputPath,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl SnapError {
    pub(crate) fn markup(segment: &'static str, msg: impl ToString) -> Self {
        SnapError::MalformedMarkup {
            segment,
            msg: msg.to_string(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: &str) -> Self {
        SnapError::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}

pub type SnapResult<T> = Result<T, SnapError>;
