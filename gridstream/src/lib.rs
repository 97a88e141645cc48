//! gridstream - Streaming downloads from chunked file storage
//!
//! This library reads files stored GridFS-style: one files document holding
//! `length` and `chunkSize`, plus numbered chunk documents holding the bytes.
//! Every chunk is checked against the file metadata as it is consumed, so a
//! missing, reordered, mistyped or mis-sized chunk surfaces as a corrupt-data
//! error instead of silently wrong bytes.
//!
//! - [`download`]: the stream engine and its error taxonomy
//! - [`metadata`]: file length, chunk size and derived chunk counts
//! - [`store`]: chunk sources, including mongodump directories
//! - [`bucket`]: opening whole-file and byte-range streams by file id
//! - [`checksum`]: SHA-256 fingerprints of downloaded content
//! - [`config`]: the INI settings file

pub mod bucket;
pub mod checksum;
pub mod config;
pub mod download;
pub mod metadata;
pub mod store;

pub use bucket::{Bucket, BucketError, BucketResult, FileInfo};
pub use download::{CorruptReason, DownloadError, DownloadResult, Downloader};
pub use metadata::FileMetadata;
pub use store::{ChunkQuery, ChunkStore, MemoryStore, StoreError};

/// Library version, from Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
