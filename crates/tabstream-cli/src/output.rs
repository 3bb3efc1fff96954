//! Output formatting for records, errors and run summaries

use std::io::{self, Write};

use anyhow::Error;
use colored::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;
use tabstream::{ColumnSpec, MalformedRecordError, Row, StreamStats, Value};

use crate::error::CliError;

/// Writes records to stdout as TSV or JSON lines.
pub struct RecordWriter<W: Write> {
    out: W,
    json: bool,
    names: Vec<String>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W, columns: &[ColumnSpec], json: bool) -> Self {
        Self {
            out,
            json,
            names: columns.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// Write one record. JSON output is an object keyed by column name.
    pub fn write_row(&mut self, row: &Row) -> Result<(), CliError> {
        if self.json {
            let keyed = KeyedRow {
                names: &self.names,
                values: row.values(),
            };
            serde_json::to_writer(&mut self.out, &keyed)?;
            writeln!(self.out)?;
        } else {
            writeln!(self.out, "{row}")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), CliError> {
        self.out.flush()?;
        Ok(())
    }
}

/// A row serialized as a map in column order.
struct KeyedRow<'a> {
    names: &'a [String],
    values: &'a [Value],
}

impl Serialize for KeyedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.names.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Report a malformed line on stderr without stopping.
pub fn print_malformed(err: &MalformedRecordError, json: bool) {
    if json {
        let value = json!({
            "malformed": {
                "line_number": err.line_number,
                "line": err.line,
                "reason": err.reason.to_string(),
            }
        });
        eprintln!("{value}");
    } else {
        eprintln!("{} {}", "warning:".yellow().bold(), err);
    }
}

/// Print the end-of-run counters on stderr.
pub fn print_stats(stats: &StreamStats, json: bool) {
    if json {
        match serde_json::to_string(&json!({ "stats": stats })) {
            Ok(s) => eprintln!("{s}"),
            Err(e) => eprintln!("Failed to format stats as JSON: {e}"),
        }
        return;
    }

    eprintln!("{}", "Summary:".bold());
    eprintln!("  lines received:  {}", stats.lines_received);
    eprintln!("  blank lines:     {}", stats.blank_lines);
    eprintln!("  records:         {}", stats.records_parsed);
    eprintln!("  malformed:       {}", stats.malformed_lines);
    eprintln!("  pauses/resumes:  {}/{}", stats.pauses, stats.resumes);
    eprintln!("  peak buffered:   {}", stats.peak_buffered);
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "exit_code": exit_code(error),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

pub fn exit_code(error: &Error) -> i32 {
    error
        .downcast_ref::<CliError>()
        .map(CliError::exit_code)
        .unwrap_or(1)
}

/// Whether a write failed because the reader went away (`tabcat … | head`).
pub fn is_broken_pipe(err: &CliError) -> bool {
    matches!(err, CliError::IoError(e) if e.kind() == io::ErrorKind::BrokenPipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabstream::row;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn columns() -> Vec<ColumnSpec> {
        vec![ColumnSpec::text("name"), ColumnSpec::integer("count")]
    }

    #[test]
    fn writes_tab_separated_rows() -> TestResult {
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf, &columns(), false);
        writer.write_row(&row!["a", 1])?;
        writer.write_row(&row!["b", Value::Null])?;
        writer.flush()?;
        drop(writer);

        assert_eq!(String::from_utf8(buf)?, "a\t1\nb\t\n");
        Ok(())
    }

    #[test]
    fn writes_keyed_json_lines() -> TestResult {
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf, &columns(), true);
        writer.write_row(&row!["a", 1])?;
        drop(writer);

        insta::assert_snapshot!(String::from_utf8(buf)?, @r#"{"name":"a","count":1}"#);
        Ok(())
    }

    #[test]
    fn exit_code_defaults_to_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
        assert_eq!(
            exit_code(&Error::from(CliError::MalformedInput { count: 1 })),
            4
        );
    }
}
