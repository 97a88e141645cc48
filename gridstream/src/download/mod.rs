//! Download streams over chunked file storage.
//!
//! This module provides the read side of a stored file:
//! - Per-chunk read cursor (`chunk_buffer`)
//! - Chunk record validation against file metadata (`validator`)
//! - The sequential download stream engine (`downloader`)
//! - Error taxonomy (`error`)
//!
//! # Architecture
//!
//! ```text
//! Downloader (engine)
//!         │
//!         ├── chunk cursor (Iterator of chunk documents, external)
//!         │
//!         ├── ChunkValidator (pure checks per chunk)
//!         │
//!         └── ChunkBuffer (payload of the chunk being drained)
//! ```
//!
//! # Example
//!
//! ```
//! use bson::{doc, spec::BinarySubtype, Binary, Document};
//! use gridstream::download::Downloader;
//! use gridstream::FileMetadata;
//!
//! let chunks = vec![
//!     Ok::<_, std::io::Error>(doc! { "n": 0, "data": Binary { subtype: BinarySubtype::Generic, bytes: b"hello ".to_vec() } }),
//!     Ok(doc! { "n": 1, "data": Binary { subtype: BinarySubtype::Generic, bytes: b"world".to_vec() } }),
//! ];
//! let metadata = FileMetadata::new(Document::new(), 11, 6);
//!
//! let mut stream = Downloader::new(chunks.into_iter(), metadata)?;
//! let mut buf = [0u8; 11];
//! assert_eq!(stream.read(&mut buf)?, 11);
//! assert_eq!(&buf, b"hello world");
//! # Ok::<(), gridstream::download::DownloadError>(())
//! ```

mod chunk_buffer;
mod downloader;
mod error;
mod validator;

pub use chunk_buffer::ChunkBuffer;
pub use downloader::Downloader;
pub use error::{CorruptReason, DownloadError, DownloadResult};
pub use validator::{ChunkValidator, ValidChunk};
