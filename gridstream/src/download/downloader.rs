//! The download stream engine.
//!
//! A [`Downloader`] turns file metadata plus a lazily advanced cursor of
//! chunk records into a sequential byte stream. It holds at most one chunk
//! at a time and validates every chunk before exposing its bytes.

use std::error::Error as StdError;
use std::io;

use bson::Document;
use tracing::{debug, warn};

use super::chunk_buffer::ChunkBuffer;
use super::error::{CorruptReason, DownloadError, DownloadResult};
use super::validator::ChunkValidator;
use crate::metadata::FileMetadata;

/// Sequential, corruption-checked reader over one stored file.
///
/// `C` is the chunk cursor: any iterator of chunk documents in ascending `n`
/// order, already positioned at the first chunk to read. Advancing it is the
/// only blocking operation; its errors surface from [`read`](Self::read) as
/// [`DownloadError::Cursor`].
///
/// States: open, then closed (terminal). `close()` does not drop the cursor,
/// but no cursor operation is issued once closed.
#[derive(Debug)]
pub struct Downloader<C> {
    chunks: Option<C>,
    metadata: FileMetadata,
    total_chunk_count: i32,
    closed: bool,

    /// First chunk to read and the offset into it.
    initial_chunk_number: i32,
    initial_byte_offset: usize,

    started: bool,
    next_chunk_number: i32,
    current: ChunkBuffer,

    /// Bytes left before a bounded stream reports end of stream.
    bytes_remaining: Option<u64>,
}

impl<C, E> Downloader<C>
where
    C: Iterator<Item = Result<Document, E>>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Create a stream that reads the whole file.
    pub fn new(chunks: C, metadata: FileMetadata) -> DownloadResult<Self> {
        Self::with_start(chunks, metadata, 0, 0)
    }

    /// Create a stream that resumes at `initial_byte_offset` within chunk
    /// `initial_chunk_number`.
    ///
    /// `chunks` must yield chunk `initial_chunk_number` first. Fails with
    /// [`DownloadError::CorruptData`] if the chunk count overflows an `i32`
    /// or the chunk size is unusable for a non-empty file.
    pub fn with_start(
        chunks: C,
        metadata: FileMetadata,
        initial_chunk_number: i32,
        initial_byte_offset: u32,
    ) -> DownloadResult<Self> {
        Self::build(Some(chunks), metadata, initial_chunk_number, initial_byte_offset)
    }

    /// Create a stream for a zero-length file, with no cursor at all.
    pub fn empty(metadata: FileMetadata) -> DownloadResult<Self> {
        Self::build(None, metadata, 0, 0)
    }

    fn build(
        chunks: Option<C>,
        metadata: FileMetadata,
        initial_chunk_number: i32,
        initial_byte_offset: u32,
    ) -> DownloadResult<Self> {
        if metadata.file_length() > 0 && metadata.chunk_size() <= 0 {
            return Err(CorruptReason::InvalidChunkSize {
                chunk_size: i64::from(metadata.chunk_size()),
                max: crate::metadata::MAX_CHUNK_SIZE,
            }
            .into());
        }

        let total_chunk_count = metadata.total_chunk_count()?;

        debug!(
            file_length = metadata.file_length(),
            chunk_size = metadata.chunk_size(),
            total_chunk_count,
            initial_chunk_number,
            initial_byte_offset,
            "Opened download stream"
        );

        Ok(Self {
            chunks,
            metadata,
            total_chunk_count,
            closed: false,
            initial_chunk_number,
            initial_byte_offset: initial_byte_offset as usize,
            started: false,
            next_chunk_number: initial_chunk_number,
            current: ChunkBuffer::default(),
            bytes_remaining: None,
        })
    }

    /// End the stream after `len` more bytes.
    ///
    /// Used for byte ranges whose chunk query stops before the last chunk:
    /// reads return a short count at the bound and 0 afterwards, without
    /// asking the cursor for chunks past it.
    pub fn with_byte_limit(mut self, len: u64) -> Self {
        self.bytes_remaining = Some(len);
        self
    }

    /// Read up to `buf.len()` bytes, crossing chunk boundaries as needed.
    ///
    /// Returns the number of bytes written, which is short only at end of
    /// file (or at the byte limit). Returns 0 for a zero-length file without
    /// touching the cursor.
    pub fn read(&mut self, buf: &mut [u8]) -> DownloadResult<usize> {
        if self.closed {
            return Err(DownloadError::IsClosed);
        }

        if self.metadata.file_length() == 0 {
            return Ok(0);
        }

        let buf = match self.bytes_remaining {
            Some(remaining) => {
                let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
                &mut buf[..len]
            }
            None => buf,
        };

        let mut written = 0;

        while written < buf.len() {
            if self.current.is_exhausted() {
                if self.next_chunk_number >= self.total_chunk_count {
                    break;
                }
                self.download_next_chunk()?;
            }

            written += self.current.copy_to(&mut buf[written..]);
        }

        if let Some(remaining) = self.bytes_remaining.as_mut() {
            *remaining -= written as u64;
        }

        Ok(written)
    }

    /// Pull the next chunk from the cursor, validate it and make it current.
    fn download_next_chunk(&mut self) -> DownloadResult<()> {
        let expected = self.next_chunk_number;

        let record = match self.chunks.as_mut().and_then(|chunks| chunks.next()) {
            Some(Ok(record)) => Some(record),
            Some(Err(e)) => return Err(DownloadError::Cursor(e.into())),
            None => None,
        };

        let validator = ChunkValidator::new(&self.metadata, self.total_chunk_count);
        let chunk = validator.validate(record, expected).map_err(|reason| {
            warn!(chunk = expected, %reason, "Chunk failed validation");
            DownloadError::CorruptData(reason)
        })?;

        let offset = if self.started {
            0
        } else {
            self.initial_byte_offset
        };
        let len = chunk.data.len();

        self.current = ChunkBuffer::with_offset(chunk.data, offset).ok_or(
            CorruptReason::ByteOffsetOutOfRange {
                chunk: chunk.n,
                offset,
                len,
            },
        )?;
        self.started = true;
        self.next_chunk_number = chunk.n + 1;

        debug!(chunk = chunk.n, len, offset, "Downloaded chunk");

        Ok(())
    }
}

impl<C> Downloader<C> {
    /// True until [`close`](Self::close) is called.
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Close the stream. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Total byte size of the file.
    pub fn file_length(&self) -> u64 {
        self.metadata.file_length()
    }

    /// Bytes per chunk.
    pub fn chunk_size(&self) -> i32 {
        self.metadata.chunk_size()
    }

    /// The files document describing the stored file.
    pub fn files_document(&self) -> &Document {
        self.metadata.files_document()
    }

    /// Number of chunks the file is declared to have.
    pub fn total_chunk_count(&self) -> i32 {
        self.total_chunk_count
    }

    /// The chunk this stream started at.
    pub fn initial_chunk_number(&self) -> i32 {
        self.initial_chunk_number
    }

    /// Index of the next chunk expected from the cursor.
    pub fn next_chunk_number(&self) -> i32 {
        self.next_chunk_number
    }

    /// Bytes left before a bounded stream ends, if it has a byte limit.
    pub fn bytes_remaining(&self) -> Option<u64> {
        self.bytes_remaining
    }
}

impl<C, E> io::Read for Downloader<C>
where
    C: Iterator<Item = Result<Document, E>>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Downloader::read(self, buf).map_err(io::Error::from)
    }
}
