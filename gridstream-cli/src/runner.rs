//! Shared command setup: configuration, logging and bucket access.

use std::fs;
use std::path::Path;

use gridstream::config::ConfigFile;
use gridstream::{Bucket, MemoryStore};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::commands::common::{resolve_storage, GlobalArgs};
use crate::error::CliError;

/// Context for commands that read from a bucket.
pub struct CliRunner {
    args: GlobalArgs,
    config: ConfigFile,
    // Flushes the log file on drop
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Load configuration and initialize logging.
    pub fn new(args: &GlobalArgs) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let log_guard = init_logging(&config, args.verbose)?;

        Ok(Self {
            args: args.clone(),
            config,
            _log_guard: log_guard,
        })
    }

    /// Log the command being run.
    pub fn log_startup(&self, command: &str) {
        info!(version = gridstream::VERSION, command, "gridstream starting");
    }

    /// Load the configured dump and open its bucket.
    pub fn open_bucket(&self) -> Result<Bucket<MemoryStore>, CliError> {
        let location = resolve_storage(&self.args, &self.config)?;

        debug!(
            dump_dir = %location.dump_dir.display(),
            bucket = %location.bucket,
            "Loading dump"
        );

        let store = MemoryStore::load_dump(&location.dump_dir, &location.bucket)?;
        Ok(Bucket::new(store).with_buffer_size(self.config.download.buffer_size))
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `--verbose` raises the
/// configured level to debug. Logs go to the configured file when set,
/// stderr otherwise.
fn init_logging(config: &ConfigFile, verbose: bool) -> Result<Option<WorkerGuard>, CliError> {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = config.logging.file.as_deref() else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| CliError::Logging(e.to_string()))?;
        return Ok(None);
    };

    let file_name = path.file_name().ok_or_else(|| {
        CliError::Config(format!("log file path has no file name: {}", path.display()))
    })?;
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(Some(guard))
}
