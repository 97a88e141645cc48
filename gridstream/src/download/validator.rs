//! Chunk validation.
//!
//! Checks a freshly fetched chunk record against what the files document
//! says it should look like. Validation is pure: it never touches the cursor.

use bson::spec::ElementType;
use bson::{Binary, Bson, Document};
use bytes::Bytes;

use super::error::CorruptReason;
use crate::metadata::FileMetadata;

/// A chunk record that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidChunk {
    /// Sequence index of the chunk.
    pub n: i32,
    /// The chunk payload.
    pub data: Bytes,
}

/// Validates chunk records for one file.
#[derive(Debug, Clone, Copy)]
pub struct ChunkValidator<'a> {
    metadata: &'a FileMetadata,
    total_chunk_count: i32,
}

impl<'a> ChunkValidator<'a> {
    /// Create a validator for a file with `total_chunk_count` chunks.
    pub fn new(metadata: &'a FileMetadata, total_chunk_count: i32) -> Self {
        Self {
            metadata,
            total_chunk_count,
        }
    }

    /// Validate the record yielded for position `expected`.
    ///
    /// `record` is `None` when the cursor was exhausted. Checks run in order:
    /// exhaustion, field types, sequence, index range, payload size. On
    /// success the payload is moved out of the record.
    pub fn validate(
        &self,
        record: Option<Document>,
        expected: i32,
    ) -> Result<ValidChunk, CorruptReason> {
        let mut record = record.ok_or(CorruptReason::TooFewChunks {
            expected: self.total_chunk_count,
            missing: expected,
        })?;

        let n = match record.get("n") {
            Some(Bson::Int32(n)) => *n,
            other => {
                return Err(CorruptReason::BadField {
                    chunk: expected,
                    field: "n",
                    expected: ElementType::Int32,
                    found: other.map(Bson::element_type),
                })
            }
        };

        let data = match record.remove("data") {
            Some(Bson::Binary(Binary { bytes, .. })) => Bytes::from(bytes),
            other => {
                return Err(CorruptReason::BadField {
                    chunk: expected,
                    field: "data",
                    expected: ElementType::Binary,
                    found: other.as_ref().map(Bson::element_type),
                })
            }
        };

        if n != expected {
            return Err(CorruptReason::BadSequence { expected, found: n });
        }

        if n == i32::MAX {
            return Err(CorruptReason::IndexOverflow { chunk: n });
        }

        let expected_len = self
            .metadata
            .expected_chunk_len(n, self.total_chunk_count);
        if data.len() != expected_len {
            return Err(CorruptReason::BadSize {
                chunk: n,
                expected: expected_len,
                actual: data.len(),
            });
        }

        Ok(ValidChunk { n, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::spec::BinarySubtype;

    fn binary(bytes: &[u8]) -> Bson {
        Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: bytes.to_vec(),
        })
    }

    fn chunk(n: i32, bytes: &[u8]) -> Document {
        doc! { "files_id": 1, "n": n, "data": binary(bytes) }
    }

    fn metadata(file_length: u64, chunk_size: i32) -> FileMetadata {
        FileMetadata::new(Document::new(), file_length, chunk_size)
    }

    #[test]
    fn test_valid_chunks_pass() {
        let metadata = metadata(25, 10);
        let validator = ChunkValidator::new(&metadata, 3);

        let first = validator.validate(Some(chunk(0, &[1; 10])), 0).unwrap();
        assert_eq!(first.n, 0);
        assert_eq!(first.data.len(), 10);

        let last = validator.validate(Some(chunk(2, &[3; 5])), 2).unwrap();
        assert_eq!(last.data.as_ref(), &[3; 5]);
    }

    #[test]
    fn test_exhausted_cursor() {
        let metadata = metadata(25, 10);
        let validator = ChunkValidator::new(&metadata, 3);

        let err = validator.validate(None, 1).unwrap_err();
        assert_eq!(
            err,
            CorruptReason::TooFewChunks {
                expected: 3,
                missing: 1
            }
        );
    }

    #[test]
    fn test_missing_and_mistyped_n() {
        let metadata = metadata(10, 10);
        let validator = ChunkValidator::new(&metadata, 1);

        let missing = validator
            .validate(Some(doc! { "data": binary(&[0; 10]) }), 0)
            .unwrap_err();
        assert!(matches!(
            missing,
            CorruptReason::BadField { field: "n", found: None, .. }
        ));

        let mistyped = validator
            .validate(Some(doc! { "n": 0_i64, "data": binary(&[0; 10]) }), 0)
            .unwrap_err();
        assert!(matches!(
            mistyped,
            CorruptReason::BadField {
                field: "n",
                found: Some(ElementType::Int64),
                ..
            }
        ));
    }

    #[test]
    fn test_missing_and_mistyped_data() {
        let metadata = metadata(10, 10);
        let validator = ChunkValidator::new(&metadata, 1);

        let missing = validator.validate(Some(doc! { "n": 0 }), 0).unwrap_err();
        assert!(matches!(
            missing,
            CorruptReason::BadField { field: "data", found: None, .. }
        ));

        let mistyped = validator
            .validate(Some(doc! { "n": 0, "data": "0123456789" }), 0)
            .unwrap_err();
        assert!(matches!(
            mistyped,
            CorruptReason::BadField {
                field: "data",
                found: Some(ElementType::String),
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_sequence() {
        let metadata = metadata(30, 10);
        let validator = ChunkValidator::new(&metadata, 3);

        let skipped = validator.validate(Some(chunk(2, &[0; 10])), 1).unwrap_err();
        assert_eq!(skipped, CorruptReason::BadSequence { expected: 1, found: 2 });

        let duplicate = validator.validate(Some(chunk(0, &[0; 10])), 1).unwrap_err();
        assert_eq!(duplicate, CorruptReason::BadSequence { expected: 1, found: 0 });
    }

    #[test]
    fn test_index_overflow() {
        let metadata = metadata(i32::MAX as u64, 1);
        let validator = ChunkValidator::new(&metadata, i32::MAX);

        let err = validator
            .validate(Some(chunk(i32::MAX, &[0])), i32::MAX)
            .unwrap_err();
        assert_eq!(err, CorruptReason::IndexOverflow { chunk: i32::MAX });
    }

    #[test]
    fn test_wrong_sizes() {
        let metadata = metadata(25, 10);
        let validator = ChunkValidator::new(&metadata, 3);

        let short = validator.validate(Some(chunk(0, &[0; 9])), 0).unwrap_err();
        assert_eq!(
            short,
            CorruptReason::BadSize {
                chunk: 0,
                expected: 10,
                actual: 9
            }
        );

        let long_last = validator.validate(Some(chunk(2, &[0; 10])), 2).unwrap_err();
        assert_eq!(
            long_last,
            CorruptReason::BadSize {
                chunk: 2,
                expected: 5,
                actual: 10
            }
        );

        let empty_first = validator.validate(Some(chunk(0, &[])), 0).unwrap_err();
        assert!(matches!(empty_first, CorruptReason::BadSize { actual: 0, .. }));
    }
}
