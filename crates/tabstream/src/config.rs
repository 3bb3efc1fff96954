//! Stream configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};
use crate::model::DEFAULT_SEPARATOR;

/// Default upper bound on buffered, unconsumed records.
pub const DEFAULT_MAX_CAPACITY: usize = 100;

/// What to do with a line the record model rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedPolicy {
    /// Deliver the error in place of the record and keep going
    #[default]
    Surface,
    /// Log the line and drop it
    Skip,
    /// Deliver the error after the records already buffered, then end the stream
    FailFast,
}

/// Record stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Buffered record count at which the source is paused
    pub max_capacity: usize,
    /// Occupancy at or below which a paused source is resumed.
    /// `None` means half of `max_capacity`.
    pub resume_below: Option<usize>,
    /// Field separator for the column model
    pub separator: char,
    /// Handling of lines the model rejects
    pub on_malformed: MalformedPolicy,
    /// Upper bound on a single wait inside `next()`, in milliseconds
    pub wait_timeout_ms: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            resume_below: None,
            separator: DEFAULT_SEPARATOR,
            on_malformed: MalformedPolicy::Surface,
            wait_timeout_ms: None,
        }
    }
}

impl StreamConfig {
    /// Set the buffer capacity
    pub fn max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Set the resume low-water mark
    pub fn resume_below(mut self, occupancy: usize) -> Self {
        self.resume_below = Some(occupancy);
        self
    }

    /// Set the field separator
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Set the malformed-line policy
    pub fn on_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    /// Set the wait timeout
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Effective resume low-water mark.
    pub fn resume_threshold(&self) -> usize {
        self.resume_below.unwrap_or(self.max_capacity / 2)
    }

    /// Effective wait timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Check the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero capacity, a resume mark at or
    /// above capacity, a zero timeout, or a line-break separator.
    pub fn validate(&self) -> StreamResult<()> {
        if self.max_capacity == 0 {
            return Err(StreamError::config("max_capacity must be positive"));
        }
        if let Some(mark) = self.resume_below {
            if mark >= self.max_capacity {
                return Err(StreamError::config(format!(
                    "resume_below ({mark}) must be less than max_capacity ({})",
                    self.max_capacity
                )));
            }
        }
        if self.wait_timeout_ms == Some(0) {
            return Err(StreamError::config("wait_timeout_ms must be positive"));
        }
        if self.separator == '\n' || self.separator == '\r' {
            return Err(StreamError::config("separator cannot be a line break"));
        }
        Ok(())
    }
}
