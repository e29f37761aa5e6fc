//! `phonelab parse` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use phonelab_logfile::{LogFileParser, LogRecord, is_chronological, sort_chronologically};

use crate::cli::ParseArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `parse` command.
///
/// Parsing runs on the blocking pool; a rejected file maps to [`CliError::Logfile`].
pub async fn execute(args: ParseArgs, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %args.file.display(), sort = args.sort, "parsing log file");

    let path = args.file.clone();
    let sort = args.sort;
    let mut records = tokio::task::spawn_blocking(move || LogFileParser::new().parse_file(&path))
        .await
        .map_err(|e| CliError::Command(format!("parse task failed: {e}")))??;

    if sort {
        sort_chronologically(&mut records);
    }

    let report = ParseReport::new(args.file.display().to_string(), records, sort, args.records);
    writer.render(&report)?;
    Ok(())
}

/// Result of parsing a single file.
#[derive(Serialize)]
pub struct ParseReport {
    /// File path
    pub source: String,
    /// Number of records parsed
    pub record_count: usize,
    /// Whether records were sorted before output
    pub sorted: bool,
    /// Whether the record order is chronological
    pub chronological: bool,
    /// Earliest timestamp, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<String>,
    /// Latest timestamp, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<String>,
    /// Records, present only with `--records`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<LogRecord>>,
}

impl ParseReport {
    /// Build a report, keeping the records only when `include_records` is set.
    pub fn new(source: String, records: Vec<LogRecord>, sorted: bool, include_records: bool) -> Self {
        let first_timestamp = records.iter().map(|r| r.timestamp).min().map(|t| t.to_string());
        let last_timestamp = records.iter().map(|r| r.timestamp).max().map(|t| t.to_string());

        Self {
            source,
            record_count: records.len(),
            sorted,
            chronological: is_chronological(&records),
            first_timestamp,
            last_timestamp,
            records: include_records.then_some(records),
        }
    }
}

impl Render for ParseReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref records) = self.records {
            for record in records {
                writeln!(w, "{record}")?;
            }
            return Ok(());
        }

        writeln!(w, "Log File: {}", self.source.bold())?;
        writeln!(w, "  Records:       {}", self.record_count)?;
        writeln!(w, "  Sorted:        {}", if self.sorted { "yes" } else { "no" })?;
        let order = if self.chronological {
            "chronological".green()
        } else {
            "out of order".yellow()
        };
        writeln!(w, "  Order:         {order}")?;
        if let (Some(first), Some(last)) = (&self.first_timestamp, &self.last_timestamp) {
            writeln!(w, "  Time range:    {first} .. {last}")?;
        }
        Ok(())
    }
}
