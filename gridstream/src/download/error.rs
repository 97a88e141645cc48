//! Error types for download streams.
//!
//! Callers branch on [`DownloadError`]; the [`CorruptReason`] payload exists
//! for diagnostics and for tests that need to assert on the exact defect.

use std::error::Error as StdError;
use std::io;

use bson::spec::ElementType;
use thiserror::Error;

/// Result type for download stream operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors surfaced by a [`Downloader`](super::Downloader).
#[derive(Debug, Error)]
pub enum DownloadError {
    /// `read()` was called after `close()`.
    #[error("the download stream is not open")]
    IsClosed,

    /// The stored file is inconsistent with its own metadata.
    ///
    /// Always fatal: retrying reproduces the same inconsistency.
    #[error("the stored file is in an invalid or inconsistent state: {0}")]
    CorruptData(#[from] CorruptReason),

    /// The chunk cursor failed while advancing.
    ///
    /// The collaborator's error is carried unchanged and can be recovered
    /// with `downcast_ref`.
    #[error("chunk cursor error: {0}")]
    Cursor(#[source] Box<dyn StdError + Send + Sync>),
}

impl DownloadError {
    /// Returns true for any form of data corruption.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::CorruptData(_))
    }

    /// The corruption reason, if this is a corruption error.
    pub fn corrupt_reason(&self) -> Option<&CorruptReason> {
        match self {
            Self::CorruptData(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<DownloadError> for io::Error {
    fn from(err: DownloadError) -> Self {
        let kind = match err {
            DownloadError::CorruptData(_) => io::ErrorKind::InvalidData,
            DownloadError::IsClosed | DownloadError::Cursor(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Structured description of a corruption defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptReason {
    /// The cursor ran out before every declared chunk was seen.
    #[error(
        "expected file to have {expected} chunk(s), but the chunk query ran out at chunk #{missing}"
    )]
    TooFewChunks { expected: i32, missing: i32 },

    /// A chunk field is missing or has the wrong BSON type.
    #[error("chunk #{chunk}: expected to find field \"{field}\" with type {expected:?}, found {}", describe_found(.found))]
    BadField {
        chunk: i32,
        field: &'static str,
        expected: ElementType,
        found: Option<ElementType>,
    },

    /// A chunk arrived out of sequence (duplicate, skipped or reordered).
    #[error("expected chunk #{expected}, but found chunk #{found}")]
    BadSequence { expected: i32, found: i32 },

    /// The chunk index would overflow on the next increment.
    #[error("chunk #{chunk}: file has too many chunks")]
    IndexOverflow { chunk: i32 },

    /// A chunk payload has the wrong size for its position.
    #[error("chunk #{chunk}: expected size of chunk to be {expected} bytes, but actual size of chunk is {actual} bytes")]
    BadSize {
        chunk: i32,
        expected: usize,
        actual: usize,
    },

    /// The declared length and chunk size imply more chunks than fit an `i32`.
    #[error("file has {chunks} chunks, which exceeds maximum of {}", i32::MAX)]
    ChunkCountOverflow { chunks: u64 },

    /// The declared chunk size is unusable.
    #[error("files document contains unexpected chunk size {chunk_size}; value must be positive and at most {max}")]
    InvalidChunkSize { chunk_size: i64, max: i64 },

    /// The declared length is missing, wrongly typed or negative.
    #[error("files document contains invalid \"length\": {detail}")]
    InvalidLength { detail: String },

    /// The resume offset lies beyond the first chunk's payload.
    #[error("byte offset {offset} is out of bounds of chunk #{chunk} ({len} bytes)")]
    ByteOffsetOutOfRange { chunk: i32, offset: usize, len: usize },
}

fn describe_found(found: &Option<ElementType>) -> String {
    match found {
        Some(element_type) => format!("{:?}", element_type),
        None => "nothing".to_string(),
    }
}
