//! Get command - download a file, or a byte range of it.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::ops::Bound;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::common::{format_size, parse_file_id, GlobalArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the get command.
pub struct GetArgs {
    pub id: String,
    pub output: Option<PathBuf>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl GetArgs {
    /// The requested byte range as bounds.
    fn range(&self) -> (Bound<u64>, Bound<u64>) {
        (
            self.start.map_or(Bound::Unbounded, Bound::Included),
            self.end.map_or(Bound::Unbounded, Bound::Excluded),
        )
    }
}

/// Run the get command.
pub fn run(global: &GlobalArgs, args: GetArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(global)?;
    runner.log_startup("get");

    let bucket = runner.open_bucket()?;
    let id = parse_file_id(&args.id);

    let written = match &args.output {
        Some(path) => {
            let info = bucket.file(&id)?;
            let end = args.end.unwrap_or(info.length);
            let progress = progress_bar(end.saturating_sub(args.start.unwrap_or(0)));

            let file = File::create(path)?;
            let writer = progress.wrap_write(BufWriter::new(file));

            match bucket.download_range_to_writer(&id, args.range(), writer) {
                Ok(written) => {
                    progress.finish_and_clear();
                    println!("Wrote {} to {}", format_size(written), path.display());
                    written
                }
                Err(e) => {
                    progress.abandon();
                    if let Err(remove_err) = fs::remove_file(path) {
                        warn!(
                            path = %path.display(),
                            error = %remove_err,
                            "Failed to remove partial output"
                        );
                    }
                    return Err(e.into());
                }
            }
        }
        None => {
            let stdout = io::stdout();
            bucket.download_range_to_writer(&id, args.range(), stdout.lock())?
        }
    };

    info!(id = %id, bytes = written, "Download finished");
    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        progress.set_style(style.progress_chars("█▓░"));
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds() {
        let args = GetArgs {
            id: "a".to_string(),
            output: None,
            start: Some(3),
            end: None,
        };
        assert_eq!(args.range(), (Bound::Included(3), Bound::Unbounded));

        let args = GetArgs {
            id: "a".to_string(),
            output: None,
            start: None,
            end: Some(10),
        };
        assert_eq!(args.range(), (Bound::Unbounded, Bound::Excluded(10)));
    }
}
