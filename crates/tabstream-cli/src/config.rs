//! YAML configuration file and command-line overrides

use std::path::Path;

use serde::{Deserialize, Serialize};
use tabstream::{ColumnSpec, StreamConfig};
use tracing::debug;

use crate::error::CliError;

/// Contents of a `--config` file.
///
/// ```yaml
/// columns:
///   - { name: host, kind: text }
///   - { name: latency_ms, kind: float }
/// max_capacity: 500
/// on_malformed: skip
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(flatten)]
    pub stream: StreamConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Err(CliError::ConfigNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let config: FileConfig = serde_yaml::from_str(&text)?;
        debug!(path = %path.display(), columns = config.columns.len(), "loaded config file");
        Ok(config)
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub columns: Option<Vec<ColumnSpec>>,
    pub max_capacity: Option<usize>,
    pub resume_below: Option<usize>,
    pub separator: Option<char>,
    pub on_malformed: Option<tabstream::MalformedPolicy>,
    pub wait_timeout_ms: Option<u64>,
}

/// Merge the optional file with command-line overrides.
pub fn resolve(
    file: Option<FileConfig>,
    overrides: Overrides,
) -> Result<(Vec<ColumnSpec>, StreamConfig), CliError> {
    let FileConfig {
        columns: file_columns,
        mut stream,
    } = file.unwrap_or_default();

    let columns = overrides.columns.unwrap_or(file_columns);
    if columns.is_empty() {
        return Err(CliError::InvalidConfiguration(
            "no columns given; use --columns or a config file".to_string(),
        ));
    }

    if let Some(capacity) = overrides.max_capacity {
        stream.max_capacity = capacity;
    }
    if let Some(occupancy) = overrides.resume_below {
        stream.resume_below = Some(occupancy);
    }
    if let Some(separator) = overrides.separator {
        stream.separator = separator;
    }
    if let Some(policy) = overrides.on_malformed {
        stream.on_malformed = policy;
    }
    if let Some(ms) = overrides.wait_timeout_ms {
        stream.wait_timeout_ms = Some(ms);
    }

    stream.validate()?;
    Ok((columns, stream))
}

/// Parse a separator argument: a single character, or `tab`/`\t`.
pub fn parse_separator(raw: &str) -> Result<char, String> {
    match raw {
        "tab" | "\\t" | "\t" => Ok('\t'),
        "comma" => Ok(','),
        "space" => Ok(' '),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("separator must be a single character, got {raw:?}")),
            }
        }
    }
}
