//! File metadata: the descriptor of one stored file.
//!
//! A stored file is a files document (`length`, `chunkSize` plus arbitrary
//! fields) and `ceil(length / chunkSize)` chunk documents.

use bson::{Bson, Document};

use crate::download::CorruptReason;

/// Largest chunk size accepted from a files document (16 MiB).
///
/// Each chunk has to fit in a single document.
pub const MAX_CHUNK_SIZE: i64 = 16 * 1024 * 1024;

/// Compute `ceil(file_length / chunk_size)`.
///
/// Returns 0 when `chunk_size` is not positive. Fails if the count does not
/// fit an `i32`.
pub fn compute_total_chunk_count(file_length: u64, chunk_size: i32) -> Result<i32, CorruptReason> {
    if chunk_size <= 0 {
        return Ok(0);
    }

    let chunks = file_length.div_ceil(chunk_size as u64);

    i32::try_from(chunks).map_err(|_| CorruptReason::ChunkCountOverflow { chunks })
}

/// Descriptor of one stored file.
///
/// Immutable once captured.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    files_document: Document,
    file_length: u64,
    chunk_size: i32,
}

impl FileMetadata {
    /// Create metadata from already-validated values.
    pub fn new(files_document: Document, file_length: u64, chunk_size: i32) -> Self {
        Self {
            files_document,
            file_length,
            chunk_size,
        }
    }

    /// Parse `length` and `chunkSize` out of a files document.
    ///
    /// Both fields must be `int32` or `int64`. `length` must be
    /// non-negative; `chunkSize` must be positive and at most
    /// [`MAX_CHUNK_SIZE`].
    pub fn from_files_document(files_document: Document) -> Result<Self, CorruptReason> {
        let raw_length = match read_integral_field(&files_document, "length") {
            Ok(value) => value,
            Err(detail) => return Err(CorruptReason::InvalidLength { detail }),
        };
        let file_length = u64::try_from(raw_length).map_err(|_| CorruptReason::InvalidLength {
            detail: format!("unexpected negative value {}", raw_length),
        })?;

        let raw_chunk_size = match read_integral_field(&files_document, "chunkSize") {
            Ok(value) => value,
            Err(_) => {
                return Err(CorruptReason::InvalidChunkSize {
                    chunk_size: 0,
                    max: MAX_CHUNK_SIZE,
                })
            }
        };
        if raw_chunk_size <= 0 || raw_chunk_size > MAX_CHUNK_SIZE {
            return Err(CorruptReason::InvalidChunkSize {
                chunk_size: raw_chunk_size,
                max: MAX_CHUNK_SIZE,
            });
        }

        Ok(Self::new(files_document, file_length, raw_chunk_size as i32))
    }

    /// The full files document.
    pub fn files_document(&self) -> &Document {
        &self.files_document
    }

    /// Total byte size of the reconstructed file.
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Bytes per chunk, except possibly the last.
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Expected number of chunk documents.
    pub fn total_chunk_count(&self) -> Result<i32, CorruptReason> {
        compute_total_chunk_count(self.file_length, self.chunk_size)
    }

    /// Expected payload size of chunk `n` in a file of `total_chunk_count` chunks.
    pub fn expected_chunk_len(&self, n: i32, total_chunk_count: i32) -> usize {
        let chunk_size = self.chunk_size.max(0) as usize;

        if n < total_chunk_count - 1 {
            return chunk_size;
        }

        match self.file_length % chunk_size.max(1) as u64 {
            0 => chunk_size,
            remainder => remainder as usize,
        }
    }
}

/// Read an `int32` or `int64` field, describing the problem on failure.
fn read_integral_field(doc: &Document, name: &str) -> Result<i64, String> {
    match doc.get(name) {
        Some(Bson::Int32(value)) => Ok(i64::from(*value)),
        Some(Bson::Int64(value)) => Ok(*value),
        Some(other) => Err(format!(
            "expected field \"{}\" with type Int32 or Int64 but got type {:?}",
            name,
            other.element_type()
        )),
        None => Err(format!("expected field \"{}\" with type Int32 or Int64", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use proptest::prelude::*;

    #[test]
    fn test_total_chunk_count_rounds_up() {
        assert_eq!(compute_total_chunk_count(25, 10), Ok(3));
        assert_eq!(compute_total_chunk_count(20, 10), Ok(2));
        assert_eq!(compute_total_chunk_count(5, 10), Ok(1));
        assert_eq!(compute_total_chunk_count(0, 10), Ok(0));
    }

    #[test]
    fn test_total_chunk_count_without_chunk_size() {
        assert_eq!(compute_total_chunk_count(0, 0), Ok(0));
        assert_eq!(compute_total_chunk_count(0, -4), Ok(0));
    }

    #[test]
    fn test_total_chunk_count_overflow() {
        let result = compute_total_chunk_count(u64::MAX / 2, 1);
        assert!(matches!(result, Err(CorruptReason::ChunkCountOverflow { .. })));

        let boundary = compute_total_chunk_count(i32::MAX as u64, 1);
        assert_eq!(boundary, Ok(i32::MAX));
    }

    #[test]
    fn test_expected_chunk_len() {
        let metadata = FileMetadata::new(Document::new(), 25, 10);
        assert_eq!(metadata.expected_chunk_len(0, 3), 10);
        assert_eq!(metadata.expected_chunk_len(1, 3), 10);
        assert_eq!(metadata.expected_chunk_len(2, 3), 5);

        let exact = FileMetadata::new(Document::new(), 20, 10);
        assert_eq!(exact.expected_chunk_len(1, 2), 10);
    }

    #[test]
    fn test_from_files_document_accepts_int32_and_int64() {
        let metadata =
            FileMetadata::from_files_document(doc! { "length": 19_i64, "chunkSize": 4_i32 })
                .unwrap();
        assert_eq!(metadata.file_length(), 19);
        assert_eq!(metadata.chunk_size(), 4);

        let metadata =
            FileMetadata::from_files_document(doc! { "length": 7_i32, "chunkSize": 8_i64 })
                .unwrap();
        assert_eq!(metadata.file_length(), 7);
        assert_eq!(metadata.chunk_size(), 8);
    }

    #[test]
    fn test_from_files_document_rejects_bad_length() {
        let negative = FileMetadata::from_files_document(doc! { "length": -1_i64, "chunkSize": 4 });
        assert!(matches!(negative, Err(CorruptReason::InvalidLength { .. })));

        let wrong_type = FileMetadata::from_files_document(doc! { "length": "10", "chunkSize": 4 });
        assert!(matches!(wrong_type, Err(CorruptReason::InvalidLength { .. })));

        let missing = FileMetadata::from_files_document(doc! { "chunkSize": 4 });
        assert!(matches!(missing, Err(CorruptReason::InvalidLength { .. })));
    }

    #[test]
    fn test_from_files_document_rejects_bad_chunk_size() {
        for chunk_size in [Bson::Int32(0), Bson::Int32(-4), Bson::Int64(MAX_CHUNK_SIZE + 1)] {
            let result = FileMetadata::from_files_document(doc! { "length": 10, "chunkSize": chunk_size });
            assert!(
                matches!(result, Err(CorruptReason::InvalidChunkSize { .. })),
                "unexpected result {:?}",
                result
            );
        }

        let wrong_type = FileMetadata::from_files_document(doc! { "length": 10, "chunkSize": 4.0 });
        assert!(matches!(wrong_type, Err(CorruptReason::InvalidChunkSize { .. })));

        let missing = FileMetadata::from_files_document(doc! { "length": 10 });
        assert!(matches!(missing, Err(CorruptReason::InvalidChunkSize { .. })));
    }

    proptest! {
        #[test]
        fn test_total_chunk_count_property(file_length in 0u64..10_000_000, chunk_size in 1i32..100_000) {
            let count = compute_total_chunk_count(file_length, chunk_size)?;
            let expected = (file_length + chunk_size as u64 - 1) / chunk_size as u64;

            prop_assert_eq!(count as u64, expected);
            prop_assert_eq!(count == 0, file_length == 0);
        }
    }
}
