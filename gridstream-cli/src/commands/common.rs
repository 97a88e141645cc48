//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use bson::oid::ObjectId;
use bson::Bson;
use clap::Args;
use gridstream::config::ConfigFile;

use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// mongodump database directory (overrides storage.dump_dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,

    /// Bucket name (overrides storage.bucket)
    #[arg(long, global = true, value_name = "NAME")]
    pub bucket: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Where to read files from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub dump_dir: PathBuf,
    pub bucket: String,
}

/// Resolve storage settings from CLI args and config.
pub fn resolve_storage(args: &GlobalArgs, config: &ConfigFile) -> Result<StorageLocation, CliError> {
    // CLI takes precedence, then config
    let dump_dir = args
        .dump_dir
        .clone()
        .or_else(|| config.storage.dump_dir.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No dump directory specified. Use --dump-dir or set dump_dir in config.ini [storage] section."
                    .to_string(),
            )
        })?;

    let bucket = args
        .bucket
        .clone()
        .unwrap_or_else(|| config.storage.bucket.clone());

    Ok(StorageLocation { dump_dir, bucket })
}

/// Interpret a file id argument.
///
/// 24-character hex strings are ObjectIds; anything else is a string id.
pub fn parse_file_id(raw: &str) -> Bson {
    match ObjectId::parse_str(raw) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(raw.to_string()),
    }
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
