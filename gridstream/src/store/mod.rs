//! Chunk store abstraction.
//!
//! A [`ChunkStore`] is the query collaborator behind a bucket: it finds
//! files documents and returns cursors over chunk documents ordered by `n`.
//! The download engine only ever sees the cursor.

mod dump;
mod memory;

use std::io;

use bson::{Bson, Document};
use thiserror::Error;

pub use dump::{chunks_collection_path, files_collection_path};
pub use memory::{MemoryCursor, MemoryStore};

/// Result type for chunk store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a chunk store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error reading the underlying storage.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A stored document could not be decoded.
    #[error("failed to decode document in {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: bson::de::Error,
    },

    /// Backend-specific failure (network, cancellation, authorization).
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Which chunk records of a file to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkQuery {
    /// Number of leading chunk records to skip.
    pub skip: u64,
    /// Maximum number of chunk records to return.
    pub limit: Option<u64>,
}

impl ChunkQuery {
    /// Query every chunk of the file.
    pub fn all() -> Self {
        Self::default()
    }

    /// Start at the given chunk index.
    pub fn starting_at(chunk: i32) -> Self {
        Self {
            skip: chunk.max(0) as u64,
            limit: None,
        }
    }

    /// Limit the number of chunk records returned.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Source of files and chunk documents for one bucket.
pub trait ChunkStore {
    /// Cursor over chunk documents, ascending by `n`.
    type Cursor: Iterator<Item = StoreResult<Document>>;

    /// Find the files document with the given `_id`.
    fn find_file(&self, id: &Bson) -> StoreResult<Option<Document>>;

    /// All files documents in the bucket.
    fn find_files(&self) -> StoreResult<Vec<Document>>;

    /// Chunk documents whose `files_id` matches, sorted by `n`, after
    /// applying `query`.
    fn find_chunks(&self, files_id: &Bson, query: ChunkQuery) -> StoreResult<Self::Cursor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_query_builders() {
        assert_eq!(ChunkQuery::all(), ChunkQuery { skip: 0, limit: None });

        let query = ChunkQuery::starting_at(3).with_limit(2);
        assert_eq!(query.skip, 3);
        assert_eq!(query.limit, Some(2));

        assert_eq!(ChunkQuery::starting_at(-1).skip, 0);
    }
}
