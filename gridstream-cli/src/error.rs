//! CLI error types.

use std::fmt;
use std::io;

use gridstream::checksum::ChecksumError;
use gridstream::config::ConfigError;
use gridstream::{BucketError, DownloadError, StoreError};

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or missing configuration.
    Config(String),

    /// Invalid command-line arguments.
    InvalidArgument(String),

    /// Loading the dump failed.
    Store(StoreError),

    /// Opening or reading a file from the bucket failed.
    Bucket(BucketError),

    /// Content hashed to something other than the expected digest.
    ChecksumMismatch { expected: String, actual: String },

    /// Writing output failed.
    Io(io::Error),

    /// Serializing output failed.
    Serialize(String),

    /// Setting up logging failed.
    Logging(String),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Corrupt stored data and checksum mismatches exit with 2 so scripts can
    /// tell a damaged file apart from a usage or I/O problem.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Bucket(e) if e.is_corrupt_data() => 2,
            CliError::ChecksumMismatch { .. } => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Store(e) => write!(f, "Failed to load dump: {}", e),
            CliError::Bucket(e) => write!(f, "Download failed: {}", e),
            CliError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "Checksum mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Serialize(msg) => write!(f, "Failed to serialize output: {}", msg),
            CliError::Logging(msg) => write!(f, "Failed to initialize logging: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Store(e) => Some(e),
            CliError::Bucket(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<BucketError> for CliError {
    fn from(e: BucketError) -> Self {
        CliError::Bucket(e)
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        CliError::Bucket(BucketError::Download(e))
    }
}

impl From<ChecksumError> for CliError {
    fn from(e: ChecksumError) -> Self {
        match e {
            ChecksumError::Mismatch { expected, actual } => {
                CliError::ChecksumMismatch { expected, actual }
            }
            ChecksumError::Read(e) => CliError::from(e),
        }
    }
}

impl From<io::Error> for CliError {
    /// Download errors surfaced through `io::Read` are unwrapped so that
    /// corruption keeps its exit code.
    fn from(e: io::Error) -> Self {
        let wraps_download = e
            .get_ref()
            .is_some_and(|inner| inner.is::<DownloadError>());
        if !wraps_download {
            return CliError::Io(e);
        }

        match e.into_inner().map(|inner| inner.downcast::<DownloadError>()) {
            Some(Ok(download)) => CliError::from(*download),
            Some(Err(inner)) => CliError::Io(io::Error::other(inner)),
            None => CliError::Io(io::Error::other("unknown I/O error")),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialize(e.to_string())
    }
}
