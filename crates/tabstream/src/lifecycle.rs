//! Source lifecycle and iteration status

use serde::Serialize;

/// Production state of the underlying source. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    /// Created, no line or closure seen yet
    NotStarted,
    /// Delivering lines
    Active,
    /// Closure signalled; no further lines will arrive
    Closed,
}

/// Whether the consumer can expect more items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationStatus {
    /// Source closed (or halted) and buffer drained. Permanent.
    Exhausted,
    /// Items are buffered or may still arrive
    HasOrMayHaveMore,
}

impl IterationStatus {
    pub fn is_exhausted(self) -> bool {
        self == IterationStatus::Exhausted
    }
}

/// Lifecycle state machine for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lifecycle {
    state: SourceState,
    halted: bool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: SourceState::NotStarted,
            halted: false,
        }
    }

    pub(crate) fn state(&self) -> SourceState {
        self.state
    }

    /// `NotStarted -> Active`. Returns whether the transition happened.
    pub(crate) fn activate(&mut self) -> bool {
        if self.state == SourceState::NotStarted {
            self.state = SourceState::Active;
            return true;
        }
        false
    }

    /// Move to `Closed`. Returns whether the transition happened; repeated
    /// closure signals are ignored.
    pub(crate) fn close(&mut self) -> bool {
        if self.state == SourceState::Closed {
            return false;
        }
        self.state = SourceState::Closed;
        true
    }

    /// Stop accepting lines after a fail-fast error. The source state is
    /// left to the adapter's own closure signal.
    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted
    }

    /// Whether further lines may be appended.
    pub(crate) fn accepts_lines(&self) -> bool {
        self.state != SourceState::Closed && !self.halted
    }

    pub(crate) fn status(&self, buffered: usize) -> IterationStatus {
        if (self.state == SourceState::Closed || self.halted) && buffered == 0 {
            IterationStatus::Exhausted
        } else {
            IterationStatus::HasOrMayHaveMore
        }
    }
}
