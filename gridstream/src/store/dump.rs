//! Loading a bucket from a mongodump directory.
//!
//! A dump stores each collection as `<collection>.bson`: a plain
//! concatenation of BSON documents. A bucket named `fs` is therefore
//! `fs.files.bson` plus `fs.chunks.bson`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use bson::Document;
use tracing::{debug, info};

use super::{MemoryStore, StoreError, StoreResult};

/// Path of the files collection of `bucket` inside a dump directory.
pub fn files_collection_path(dir: &Path, bucket: &str) -> PathBuf {
    dir.join(format!("{}.files.bson", bucket))
}

/// Path of the chunks collection of `bucket` inside a dump directory.
pub fn chunks_collection_path(dir: &Path, bucket: &str) -> PathBuf {
    dir.join(format!("{}.chunks.bson", bucket))
}

impl MemoryStore {
    /// Load `bucket` from a mongodump directory.
    ///
    /// The files collection must exist. A missing chunks collection is
    /// treated as empty, which makes every non-empty file corrupt.
    pub fn load_dump(dir: &Path, bucket: &str) -> StoreResult<Self> {
        let files_path = files_collection_path(dir, bucket);
        let chunks_path = chunks_collection_path(dir, bucket);

        let files = read_documents(&files_path)?;
        let chunks = if chunks_path.exists() {
            read_documents(&chunks_path)?
        } else {
            debug!(path = %chunks_path.display(), "No chunks collection in dump");
            Vec::new()
        };

        info!(
            dir = %dir.display(),
            bucket,
            files = files.len(),
            chunks = chunks.len(),
            "Loaded bucket from dump"
        );

        Ok(Self::from_documents(files, chunks))
    }
}

/// Read every document of a `.bson` collection file.
fn read_documents(path: &Path) -> StoreResult<Vec<Document>> {
    let io_error = |source: io::Error| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let mut reader = BufReader::new(file);
    let mut documents = Vec::new();

    loop {
        if reader.fill_buf().map_err(io_error)?.is_empty() {
            break;
        }

        let document = Document::from_reader(&mut reader).map_err(|source| StoreError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        documents.push(document);
    }

    Ok(documents)
}
