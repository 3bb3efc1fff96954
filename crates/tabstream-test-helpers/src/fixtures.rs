//! Column sets and generated TSV input.

use tabstream::{ColumnSpec, Row, Value};

/// `(key: text, value: integer)`, the two-column shape most tests use.
pub fn pair_columns() -> Vec<ColumnSpec> {
    vec![ColumnSpec::text("key"), ColumnSpec::integer("value")]
}

/// Lines `k0\t0`, `k1\t1`, ... without terminators.
pub fn numbered_lines(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("k{i}\t{i}")).collect()
}

/// Rows matching [`numbered_lines`] under [`pair_columns`].
pub fn numbered_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let n = i64::try_from(i).unwrap_or(i64::MAX);
            Row::new(vec![Value::from(format!("k{i}")), Value::from(n)])
        })
        .collect()
}

/// Builder for newline-terminated TSV text.
#[derive(Debug, Clone, Default)]
pub struct TsvFixture {
    lines: Vec<String>,
    crlf: bool,
}

impl TsvFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from [`numbered_lines`].
    pub fn numbered(count: usize) -> Self {
        Self {
            lines: numbered_lines(count),
            crlf: false,
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn blank(self) -> Self {
        self.line("")
    }

    /// Insert a blank line after every `every` data lines.
    pub fn with_blank_every(mut self, every: usize) -> Self {
        if every == 0 {
            return self;
        }
        let mut out = Vec::with_capacity(self.lines.len() + self.lines.len() / every);
        for (i, line) in self.lines.into_iter().enumerate() {
            out.push(line);
            if (i + 1) % every == 0 {
                out.push(String::new());
            }
        }
        self.lines = out;
        self
    }

    /// Terminate lines with `\r\n`.
    pub fn crlf(mut self) -> Self {
        self.crlf = true;
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn build(&self) -> String {
        let terminator = if self.crlf { "\r\n" } else { "\n" };
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push_str(terminator);
        }
        text
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.build().into_bytes()
    }
}
