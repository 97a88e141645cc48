//! List command - describe every file in the bucket.

use std::fmt::Write as _;

use bson::Bson;
use gridstream::FileInfo;

use super::common::{format_size, GlobalArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the ls command.
pub fn run(global: &GlobalArgs, json: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(global)?;
    runner.log_startup("ls");

    let bucket = runner.open_bucket()?;
    let files = bucket.files()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else if files.is_empty() {
        println!("No files found.");
    } else {
        print!("{}", render_table(&files));
    }

    Ok(())
}

/// Render files as an aligned text table.
fn render_table(files: &[FileInfo]) -> String {
    let rows: Vec<[String; 5]> = files
        .iter()
        .map(|file| {
            [
                display_id(&file.id),
                file.filename.clone().unwrap_or_else(|| "-".to_string()),
                format_size(file.length),
                file.chunk_count().to_string(),
                file.upload_date
                    .and_then(|date| date.try_to_rfc3339_string().ok())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let headers = ["ID", "FILENAME", "SIZE", "CHUNKS", "UPLOADED"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: [&str; 5]| {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", line.trim_end());
    };

    push_row(headers);
    for row in &rows {
        push_row([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ]);
    }

    out
}

/// Show ObjectIds as bare hex and strings without quotes.
fn display_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    fn file(id: Bson, filename: Option<&str>, length: u64) -> FileInfo {
        FileInfo {
            id,
            filename: filename.map(str::to_string),
            length,
            chunk_size: 4,
            upload_date: None,
            metadata: None,
        }
    }

    #[test]
    fn test_display_id() {
        let oid = ObjectId::parse_str("65f1c2a9e4b0a1b2c3d4e5f6").unwrap();
        assert_eq!(display_id(&Bson::ObjectId(oid)), "65f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(display_id(&Bson::String("a.txt".into())), "a.txt");
        assert_eq!(display_id(&Bson::Int32(7)), "7");
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[
            file(Bson::String("a".into()), Some("notes.txt"), 19),
            file(Bson::Int32(2), None, 0),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("notes.txt"));
        assert!(lines[1].contains("19 bytes"));
        assert!(lines[1].contains("  5  "));
        assert!(lines[2].starts_with("2 "));
    }
}
