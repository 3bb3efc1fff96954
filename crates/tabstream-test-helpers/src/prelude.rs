//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use tabstream_test_helpers::prelude::*;
//! ```

pub use crate::must::{drain, must, must_end, must_fail_with, must_malformed, must_next, must_some};

#[cfg(feature = "mock")]
pub use crate::mock::{ScriptedSource, SourceEvent};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{TsvFixture, numbered_lines, numbered_rows, pair_columns};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
