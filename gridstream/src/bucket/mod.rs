//! Bucket façade: opening download streams by file id.
//!
//! A bucket pairs a files collection with a chunks collection (through a
//! [`ChunkStore`]). It resolves a file id to its files document, turns an
//! optional byte range into a starting chunk and offset, issues the chunk
//! query and hands the cursor to a [`Downloader`].

mod error;
mod file_info;

use std::io::{self, Write};
use std::ops::{Bound, RangeBounds};

use bson::Bson;
use tracing::{debug, info, warn};

use crate::download::Downloader;
use crate::metadata::FileMetadata;
use crate::store::{ChunkQuery, ChunkStore};

pub use error::{BucketError, BucketResult};
pub use file_info::FileInfo;

/// Name of the default bucket.
pub const DEFAULT_BUCKET_NAME: &str = "fs";

/// Read access to the files stored in one bucket.
#[derive(Debug, Clone)]
pub struct Bucket<S> {
    store: S,
    buffer_size: Option<usize>,
}

impl<S: ChunkStore> Bucket<S> {
    /// Create a bucket over a chunk store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            buffer_size: None,
        }
    }

    /// Read `size` bytes at a time when downloading into a writer.
    ///
    /// Defaults to the chunk size of the file being downloaded.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size.max(1));
        self
    }

    /// The underlying chunk store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Describe every file in the bucket.
    ///
    /// Files documents with unusable `length` or `chunkSize` are skipped
    /// with a warning.
    pub fn files(&self) -> BucketResult<Vec<FileInfo>> {
        let documents = self.store.find_files()?;
        let mut files = Vec::with_capacity(documents.len());

        for document in &documents {
            match FileInfo::from_files_document(document) {
                Ok(info) => files.push(info),
                Err(reason) => {
                    warn!(id = ?document.get("_id"), %reason, "Skipping corrupt files document")
                }
            }
        }

        Ok(files)
    }

    /// Describe one file.
    pub fn file(&self, id: &Bson) -> BucketResult<FileInfo> {
        let document = self.find_files_document(id)?;
        Ok(FileInfo::from_files_document(&document)?)
    }

    /// Open a stream over the whole file.
    pub fn open_download_stream(&self, id: &Bson) -> BucketResult<Downloader<S::Cursor>> {
        self.open_download_stream_range(id, ..)
    }

    /// Open a stream over `range` of the file.
    ///
    /// The range must lie within `[0, length]`. Only the chunks covering the
    /// range are requested from the store, and the stream ends at the end of
    /// the range.
    pub fn open_download_stream_range(
        &self,
        id: &Bson,
        range: impl RangeBounds<u64>,
    ) -> BucketResult<Downloader<S::Cursor>> {
        self.open_range(id, range).map(|(stream, _)| stream)
    }

    /// Download the whole file into `writer`.
    ///
    /// Returns the number of bytes written.
    pub fn download_to_writer<W: Write>(&self, id: &Bson, writer: W) -> BucketResult<u64> {
        self.download_range_to_writer(id, .., writer)
    }

    /// Download `range` of the file into `writer`.
    ///
    /// Reads one chunk's worth at a time (or the configured buffer size) and
    /// closes the stream when done.
    /// Returns the number of bytes written.
    pub fn download_range_to_writer<W: Write>(
        &self,
        id: &Bson,
        range: impl RangeBounds<u64>,
        mut writer: W,
    ) -> BucketResult<u64> {
        let (mut stream, len) = self.open_range(id, range)?;

        let buffer_size = self
            .buffer_size
            .unwrap_or_else(|| stream.chunk_size().max(1) as usize);
        let mut buffer = vec![0u8; buffer_size];
        let mut remaining = len;

        while remaining > 0 {
            let want = remaining.min(buffer.len() as u64) as usize;
            let count = stream.read(&mut buffer[..want])?;
            if count == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("download stream ended with {} bytes outstanding", remaining),
                )
                .into());
            }

            writer.write_all(&buffer[..count])?;
            remaining -= count as u64;
        }

        writer.flush()?;
        stream.close();

        debug!(id = %id, bytes = len, "Download complete");
        Ok(len)
    }

    fn find_files_document(&self, id: &Bson) -> BucketResult<bson::Document> {
        self.store
            .find_file(id)?
            .ok_or_else(|| BucketError::NotFound { id: id.clone() })
    }

    /// Open a stream over `range`, returning it with the number of bytes in
    /// the range.
    fn open_range(
        &self,
        id: &Bson,
        range: impl RangeBounds<u64>,
    ) -> BucketResult<(Downloader<S::Cursor>, u64)> {
        let document = self.find_files_document(id)?;
        let metadata = FileMetadata::from_files_document(document)?;
        let file_length = metadata.file_length();

        let (start, end) = resolve_range(&range, file_length)?;

        info!(id = %id, file_length, start, end, "Opening download stream");

        if file_length == 0 {
            return Ok((Downloader::empty(metadata)?, 0));
        }

        let chunk_size = metadata.chunk_size() as u64;

        let initial_chunk_number = i32::try_from(start / chunk_size).map_err(|_| {
            BucketError::InvalidByteRange("expected chunk offset to be in bounds of int32".into())
        })?;
        let initial_byte_offset = u32::try_from(start % chunk_size).map_err(|_| {
            BucketError::InvalidByteRange("expected byte offset to be in bounds of int32".into())
        })?;

        let bounded = end < file_length;
        let mut query = ChunkQuery::starting_at(initial_chunk_number);
        if bounded {
            query = query.with_limit(end / chunk_size - start / chunk_size + 1);
        }

        let cursor = self.store.find_chunks(id, query)?;
        let mut stream =
            Downloader::with_start(cursor, metadata, initial_chunk_number, initial_byte_offset)?;
        if bounded {
            stream = stream.with_byte_limit(end - start);
        }

        Ok((stream, end - start))
    }
}

/// Turn `range` into `[start, end)` and check it against the file length.
fn resolve_range(range: &impl RangeBounds<u64>, file_length: u64) -> BucketResult<(u64, u64)> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.checked_add(1).ok_or_else(|| {
            BucketError::InvalidByteRange("expected start to be in bounds of u64".into())
        })?,
        Bound::Unbounded => 0,
    };

    let end = match range.end_bound() {
        Bound::Included(&end) => end.checked_add(1).ok_or_else(|| {
            BucketError::InvalidByteRange("expected end to be in bounds of u64".into())
        })?,
        Bound::Excluded(&end) => end,
        Bound::Unbounded => file_length,
    };

    if start > end {
        return Err(BucketError::InvalidByteRange(format!(
            "expected end ({}) to not be less than start ({})",
            end, start
        )));
    }
    if start > file_length {
        return Err(BucketError::InvalidByteRange(format!(
            "expected start ({}) to not be greater than the file length ({})",
            start, file_length
        )));
    }
    if end > file_length {
        return Err(BucketError::InvalidByteRange(format!(
            "expected end ({}) to not be greater than the file length ({})",
            end, file_length
        )));
    }

    Ok((start, end))
}
