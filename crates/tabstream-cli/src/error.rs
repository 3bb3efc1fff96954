//! Error types for the tabcat CLI

use std::path::PathBuf;

use tabstream::StreamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("{count} malformed line(s) in input")]
    MalformedInput { count: u64 },

    #[error("Interrupted")]
    Interrupted,

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidConfiguration(_) | CliError::YamlError(_) => 2,
            CliError::ConfigNotFound(_) => 3,
            CliError::MalformedInput { .. } => 4,
            CliError::Interrupted => 130,
            CliError::Stream(e) => match e {
                StreamError::Configuration(_) => 2,
                StreamError::SourceNotFound(_) => 3,
                StreamError::Malformed(_) => 4,
                StreamError::Timeout { .. } => 5,
                StreamError::Cancelled => 130,
                StreamError::Io(_) => 1,
            },
            CliError::IoError(_) | CliError::JsonError(_) => 1,
        }
    }
}
