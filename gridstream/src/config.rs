//! Configuration file handling.
//!
//! Settings live in an INI file at `<config dir>/gridstream/config.ini`:
//!
//! ```ini
//! [storage]
//! dump_dir = /backups/2024-05-01/media
//! bucket = fs
//!
//! [download]
//! buffer_size = 261120
//!
//! [logging]
//! level = info
//! file =
//! ```
//!
//! Every setting is addressed by a [`ConfigKey`] (`section.key`), which
//! owns parsing and validation so the CLI `config set` command and file
//! loading share the same rules.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::bucket::DEFAULT_BUCKET_NAME;

/// Default read size when streaming to a file (255 KiB, the usual chunk size).
pub const DEFAULT_BUFFER_SIZE: usize = 255 * 1024;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid INI.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The key is not a known `section.key`.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    /// The value is not valid for the key.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: ConfigKey,
        value: String,
        reason: String,
    },
}

/// `[storage]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// mongodump database directory holding `<bucket>.files.bson`.
    pub dump_dir: Option<PathBuf>,
    /// Bucket name (collection prefix).
    pub bucket: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dump_dir: None,
            bucket: DEFAULT_BUCKET_NAME.to_string(),
        }
    }
}

/// `[download]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Bytes requested per read when streaming to a file.
    pub buffer_size: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default level filter (overridden by `RUST_LOG`).
    pub level: String,
    /// Optional log file; logs go to stderr otherwise.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub storage: StorageSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

/// Location of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gridstream")
        .join("config.ini")
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults if the file
    /// does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ini = Ini::load_from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source: io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        ini.write_to_file(path).map_err(io_error)
    }
}

/// A configuration setting addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    StorageDumpDir,
    StorageBucket,
    DownloadBufferSize,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::StorageDumpDir,
            ConfigKey::StorageBucket,
            ConfigKey::DownloadBufferSize,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFile,
        ]
    }

    /// INI section name.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::StorageDumpDir | ConfigKey::StorageBucket => "storage",
            ConfigKey::DownloadBufferSize => "download",
            ConfigKey::LoggingLevel | ConfigKey::LoggingFile => "logging",
        }
    }

    /// Key name within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::StorageDumpDir => "dump_dir",
            ConfigKey::StorageBucket => "bucket",
            ConfigKey::DownloadBufferSize => "buffer_size",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingFile => "file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::StorageDumpDir => path_to_string(&config.storage.dump_dir),
            ConfigKey::StorageBucket => config.storage.bucket.clone(),
            ConfigKey::DownloadBufferSize => config.download.buffer_size.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Parse and store `value`. An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: *self,
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::StorageDumpDir => config.storage.dump_dir = optional_path(value),
            ConfigKey::StorageBucket => {
                if value.is_empty() {
                    return Err(invalid("bucket name must not be empty"));
                }
                config.storage.bucket = value.to_string();
            }
            ConfigKey::DownloadBufferSize => {
                let size: usize = value
                    .parse()
                    .map_err(|_| invalid("expected a positive integer"))?;
                if size == 0 {
                    return Err(invalid("expected a positive integer"));
                }
                config.download.buffer_size = size;
            }
            ConfigKey::LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid("expected one of trace, debug, info, warn, error"));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingFile => config.logging.file = optional_path(value),
        }

        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn path_to_string(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default()
}
