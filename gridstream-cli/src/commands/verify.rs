//! Verify command - read a file end to end and fingerprint it.
//!
//! Every chunk is validated on the way through, so a clean run proves the
//! stored file is complete and consistent with its metadata.

use gridstream::checksum::{sha256_digest, verify_sha256, StreamDigest};

use super::common::{format_size, parse_file_id, GlobalArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the verify command.
pub fn run(global: &GlobalArgs, id: &str, expected_sha256: Option<&str>) -> Result<(), CliError> {
    if let Some(expected) = expected_sha256 {
        validate_sha256_arg(expected)?;
    }

    let runner = CliRunner::new(global)?;
    runner.log_startup("verify");

    let bucket = runner.open_bucket()?;
    let id = parse_file_id(id);
    let info = bucket.file(&id)?;

    let mut stream = bucket.open_download_stream(&id)?;
    let digest: StreamDigest = match expected_sha256 {
        Some(expected) => verify_sha256(&mut stream, expected)?,
        None => sha256_digest(&mut stream)?,
    };
    let chunks_read = stream.next_chunk_number() - stream.initial_chunk_number();
    stream.close();

    println!("File:    {}", info.filename.as_deref().unwrap_or("-"));
    println!("Length:  {} ({})", digest.bytes, format_size(digest.bytes));
    println!("Chunks:  {} of {}", chunks_read, info.chunk_count());
    println!("SHA-256: {}", digest.sha256);
    if expected_sha256.is_some() {
        println!("Checksum: OK");
    }

    Ok(())
}

/// Reject anything that cannot be a SHA-256 hex digest before doing any work.
fn validate_sha256_arg(value: &str) -> Result<(), CliError> {
    let value = value.trim();
    if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CliError::InvalidArgument(format!(
            "'{}' is not a SHA-256 digest (expected 64 hex characters)",
            value
        )));
    }
    Ok(())
}
