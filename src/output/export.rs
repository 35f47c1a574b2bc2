//! Delimited and JSON export of the result set

use crate::email::EmailRecord;
use crate::output::traits::{OutputHandler, OutputResult, RunSummary};
use crate::pipeline::RunSnapshot;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const CSV_HEADER: &[&str] = &[
    "id",
    "email",
    "domain",
    "isValid",
    "source",
    "confidence",
    "type",
];

/// Quotes a field when it contains a delimiter, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) || field.trim() != field {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_row(record: &EmailRecord) -> String {
    [
        escape_field(&record.id),
        escape_field(&record.email),
        escape_field(&record.domain),
        record.is_valid.to_string(),
        escape_field(&record.source),
        record.confidence.to_string(),
        record.email_type.to_string(),
    ]
    .join(",")
}

/// Formats records as CSV with a header row
pub fn format_csv(records: &[EmailRecord]) -> String {
    let mut csv = String::new();
    csv.push_str(&CSV_HEADER.join(","));
    csv.push_str("\r\n");
    for record in records {
        csv.push_str(&csv_row(record));
        csv.push_str("\r\n");
    }
    csv
}

/// Writes the records of a run as CSV
#[derive(Debug, Clone)]
pub struct CsvOutputHandler {
    path: PathBuf,
}

impl CsvOutputHandler {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl OutputHandler for CsvOutputHandler {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, _summary: &RunSummary, snapshot: &RunSnapshot) -> OutputResult<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(format_csv(&snapshot.records).as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    run: &'a RunSummary,
    #[serde(flatten)]
    snapshot: &'a RunSnapshot,
}

/// Writes run metadata, records and stats as one JSON document
#[derive(Debug, Clone)]
pub struct JsonOutputHandler {
    path: PathBuf,
}

impl JsonOutputHandler {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl OutputHandler for JsonOutputHandler {
    fn name(&self) -> &'static str {
        "json"
    }

    fn write(&self, summary: &RunSummary, snapshot: &RunSnapshot) -> OutputResult<()> {
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(
            writer,
            &JsonExport {
                run: summary,
                snapshot,
            },
        )?;
        Ok(())
    }
}
