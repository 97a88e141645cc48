//! Typed view of a files document.

use bson::{Bson, DateTime, Document};
use serde::Serialize;

use crate::download::CorruptReason;
use crate::metadata::FileMetadata;

/// The well-known fields of a files document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(rename = "_id")]
    pub id: Bson,
    pub filename: Option<String>,
    pub length: u64,
    pub chunk_size: i32,
    pub upload_date: Option<DateTime>,
    pub metadata: Option<Document>,
}

impl FileInfo {
    /// Extract the well-known fields, validating `length` and `chunkSize`.
    pub fn from_files_document(files_document: &Document) -> Result<Self, CorruptReason> {
        let metadata = FileMetadata::from_files_document(files_document.clone())?;

        Ok(Self {
            id: files_document.get("_id").cloned().unwrap_or(Bson::Null),
            filename: files_document.get_str("filename").ok().map(str::to_string),
            length: metadata.file_length(),
            chunk_size: metadata.chunk_size(),
            upload_date: files_document.get_datetime("uploadDate").ok().copied(),
            metadata: files_document.get_document("metadata").ok().cloned(),
        })
    }

    /// Number of chunk documents the file should have.
    pub fn chunk_count(&self) -> i64 {
        if self.chunk_size <= 0 {
            return 0;
        }
        self.length.div_ceil(self.chunk_size as u64) as i64
    }
}
