//! SHA-256 checksums over byte streams.
//!
//! Used to fingerprint downloaded files, typically by passing a
//! [`Downloader`](crate::download::Downloader) straight in as the reader.

use std::io::{self, Read};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Buffer size for reading streams during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Errors from checksum verification.
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// Reading the stream failed.
    #[error("failed to read stream: {0}")]
    Read(#[from] io::Error),

    /// The digest does not match.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },
}

/// A digest and the number of bytes it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDigest {
    /// Lowercase hexadecimal SHA-256.
    pub sha256: String,
    /// Bytes read from the stream.
    pub bytes: u64,
}

/// Calculate the SHA-256 of everything `reader` yields.
pub fn sha256_digest<R: Read>(mut reader: R) -> io::Result<StreamDigest> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut bytes = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        hasher.update(&buffer[..bytes_read]);
        bytes += bytes_read as u64;
    }

    Ok(StreamDigest {
        sha256: format!("{:x}", hasher.finalize()),
        bytes,
    })
}

/// Calculate the SHA-256 of `reader` as lowercase hex.
pub fn sha256_hex<R: Read>(reader: R) -> io::Result<String> {
    sha256_digest(reader).map(|digest| digest.sha256)
}

/// Verify that `reader` hashes to `expected` (hex, case-insensitive).
pub fn verify_sha256<R: Read>(reader: R, expected: &str) -> Result<StreamDigest, ChecksumError> {
    let digest = sha256_digest(reader)?;
    if !digest.sha256.eq_ignore_ascii_case(expected.trim()) {
        return Err(ChecksumError::Mismatch {
            expected: expected.to_string(),
            actual: digest.sha256,
        });
    }
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let checksum = sha256_hex(&b"hello world"[..]).unwrap();

        // SHA-256 of "hello world"
        assert_eq!(
            checksum,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_empty_stream() {
        let digest = sha256_digest(io::empty()).unwrap();

        // SHA-256 of empty string
        assert_eq!(
            digest.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(digest.bytes, 0);
    }

    #[test]
    fn test_large_stream_counts_bytes() {
        let data = vec![0xABu8; 100_000];
        let digest = sha256_digest(&data[..]).unwrap();
        assert_eq!(digest.bytes, 100_000);
        assert_eq!(digest, sha256_digest(&data[..]).unwrap());
    }

    #[test]
    fn test_verify_sha256() {
        let ok = verify_sha256(
            &b"hello world"[..],
            "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9",
        );
        assert!(ok.is_ok());

        let mismatch = verify_sha256(&b"hello world"[..], "wrong_checksum");
        match mismatch {
            Err(ChecksumError::Mismatch { expected, .. }) => assert_eq!(expected, "wrong_checksum"),
            other => panic!("Expected Mismatch error, got {:?}", other),
        }
    }
}
