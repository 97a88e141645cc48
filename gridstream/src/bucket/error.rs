//! Error types for bucket operations.

use std::io;

use bson::Bson;
use thiserror::Error;

use crate::download::{CorruptReason, DownloadError};
use crate::store::StoreError;

/// Result type for bucket operations.
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur while opening or draining a download stream.
#[derive(Debug, Error)]
pub enum BucketError {
    /// No files document has the requested `_id`.
    #[error("file not found: {id}")]
    NotFound { id: Bson },

    /// The files document is inconsistent.
    #[error("the stored file is in an invalid or inconsistent state: {0}")]
    CorruptData(#[from] CorruptReason),

    /// The requested `[start, end)` range does not lie within the file.
    #[error("invalid byte range: {0}")]
    InvalidByteRange(String),

    /// The download stream failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The chunk store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing the downloaded bytes failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BucketError {
    /// True when the stored file itself is corrupt, whether detected from
    /// the files document or while reading chunks.
    pub fn is_corrupt_data(&self) -> bool {
        match self {
            Self::CorruptData(_) => true,
            Self::Download(e) => e.is_corrupt_data(),
            _ => false,
        }
    }

    /// The corruption reason, wherever it was detected.
    pub fn corrupt_reason(&self) -> Option<&CorruptReason> {
        match self {
            Self::CorruptData(reason) => Some(reason),
            Self::Download(e) => e.corrupt_reason(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corruption_is_detected_through_download_errors() {
        let reason = CorruptReason::IndexOverflow { chunk: 4 };

        assert!(BucketError::CorruptData(reason.clone()).is_corrupt_data());
        assert!(BucketError::from(DownloadError::from(reason.clone())).is_corrupt_data());
        assert_eq!(
            BucketError::from(DownloadError::from(reason.clone())).corrupt_reason(),
            Some(&reason)
        );
        assert!(!BucketError::from(DownloadError::IsClosed).is_corrupt_data());
    }

    #[test]
    fn test_not_found_display() {
        let err = BucketError::NotFound {
            id: Bson::String("report.pdf".to_string()),
        };
        assert_eq!(err.to_string(), "file not found: \"report.pdf\"");
    }
}
