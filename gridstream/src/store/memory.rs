//! In-process chunk store.

use std::vec;

use bson::{Bson, Document};
use tracing::trace;

use super::{ChunkQuery, ChunkStore, StoreResult};

/// Chunk store backed by two in-memory collections.
///
/// Chunk queries behave like a server-side `find` sorted by `n`: records
/// with a missing or non-numeric `n` sort first, ties keep insertion order.
/// Nothing is deduplicated, so inconsistent data reaches the validator as is.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Vec<Document>,
    chunks: Vec<Document>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from existing collections.
    pub fn from_documents(files: Vec<Document>, chunks: Vec<Document>) -> Self {
        Self { files, chunks }
    }

    /// Add a files document.
    pub fn insert_file(&mut self, files_document: Document) {
        self.files.push(files_document);
    }

    /// Add a chunk document.
    pub fn insert_chunk(&mut self, chunk: Document) {
        self.chunks.push(chunk);
    }

    /// Number of files documents.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of chunk documents across all files.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Sort key for `n`: non-numeric values first, then by numeric value.
fn sort_key(chunk: &Document) -> Option<f64> {
    match chunk.get("n") {
        Some(Bson::Int32(n)) => Some(f64::from(*n)),
        Some(Bson::Int64(n)) => Some(*n as f64),
        Some(Bson::Double(n)) => Some(*n),
        _ => None,
    }
}

impl ChunkStore for MemoryStore {
    type Cursor = MemoryCursor;

    fn find_file(&self, id: &Bson) -> StoreResult<Option<Document>> {
        Ok(self
            .files
            .iter()
            .find(|file| file.get("_id") == Some(id))
            .cloned())
    }

    fn find_files(&self) -> StoreResult<Vec<Document>> {
        Ok(self.files.clone())
    }

    fn find_chunks(&self, files_id: &Bson, query: ChunkQuery) -> StoreResult<MemoryCursor> {
        let mut matching: Vec<Document> = self
            .chunks
            .iter()
            .filter(|chunk| chunk.get("files_id") == Some(files_id))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            sort_key(a)
                .partial_cmp(&sort_key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        let selected: Vec<Document> = matching.into_iter().skip(skip).take(limit).collect();

        trace!(
            files_id = %files_id,
            skip = query.skip,
            limit = ?query.limit,
            returned = selected.len(),
            "Chunk query"
        );

        Ok(MemoryCursor {
            inner: selected.into_iter(),
        })
    }
}

/// Cursor over the result of a [`MemoryStore`] chunk query.
#[derive(Debug)]
pub struct MemoryCursor {
    inner: vec::IntoIter<Document>,
}

impl Iterator for MemoryCursor {
    type Item = StoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_file(doc! { "_id": 1, "length": 3, "chunkSize": 1 });
        store.insert_file(doc! { "_id": 2, "length": 1, "chunkSize": 1 });
        store.insert_chunk(doc! { "files_id": 1, "n": 2 });
        store.insert_chunk(doc! { "files_id": 2, "n": 0 });
        store.insert_chunk(doc! { "files_id": 1, "n": 0 });
        store.insert_chunk(doc! { "files_id": 1, "n": 1 });
        store
    }

    fn numbers(cursor: MemoryCursor) -> Vec<i32> {
        cursor
            .map(|chunk| chunk.unwrap().get_i32("n").unwrap())
            .collect()
    }

    #[test]
    fn test_find_file() {
        let store = store();
        assert!(store.find_file(&Bson::Int32(1)).unwrap().is_some());
        assert!(store.find_file(&Bson::Int32(9)).unwrap().is_none());
        assert_eq!(store.find_files().unwrap().len(), 2);
    }

    #[test]
    fn test_find_chunks_sorted_and_filtered() {
        let store = store();
        let cursor = store.find_chunks(&Bson::Int32(1), ChunkQuery::all()).unwrap();
        assert_eq!(numbers(cursor), vec![0, 1, 2]);
    }

    #[test]
    fn test_find_chunks_skip_and_limit() {
        let store = store();
        let cursor = store
            .find_chunks(&Bson::Int32(1), ChunkQuery::starting_at(1).with_limit(1))
            .unwrap();
        assert_eq!(numbers(cursor), vec![1]);

        let past_end = store
            .find_chunks(&Bson::Int32(1), ChunkQuery::starting_at(5))
            .unwrap();
        assert_eq!(past_end.count(), 0);
    }

    #[test]
    fn test_missing_n_sorts_first() {
        let mut store = store();
        store.insert_chunk(doc! { "files_id": 1, "data": "x" });

        let mut cursor = store.find_chunks(&Bson::Int32(1), ChunkQuery::all()).unwrap();
        let first = cursor.next().unwrap().unwrap();
        assert!(first.get("n").is_none());
    }
}
