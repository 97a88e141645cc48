//! gridstream CLI - Command-line interface
//!
//! Lists, downloads and verifies files stored in a chunked (GridFS-style)
//! bucket read from a mongodump directory.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::common::GlobalArgs;
use commands::config::ConfigCommands;
use commands::get::GetArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "gridstream")]
#[command(about = "Inspect and download files stored in chunked (GridFS-style) dumps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files in the bucket
    Ls {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Download a file, or a byte range of it
    Get {
        /// File id: a 24-character ObjectId hex string, or any other string id
        id: String,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// First byte to download
        #[arg(long)]
        start: Option<u64>,

        /// Byte to stop before (exclusive)
        #[arg(long)]
        end: Option<u64>,
    },

    /// Read a file end to end, validating every chunk, and print its SHA-256
    Verify {
        /// File id: a 24-character ObjectId hex string, or any other string id
        id: String,

        /// Expected SHA-256 (hex); fails if the content does not match
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ls { json } => commands::ls::run(&cli.global, json),
        Commands::Get {
            id,
            output,
            start,
            end,
        } => commands::get::run(
            &cli.global,
            GetArgs {
                id,
                output,
                start,
                end,
            },
        ),
        Commands::Verify { id, sha256 } => {
            commands::verify::run(&cli.global, &id, sha256.as_deref())
        }
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        exit_with_error(e);
    }
}

fn exit_with_error(e: CliError) -> ! {
    eprintln!("Error: {}", e);
    process::exit(e.exit_code());
}
