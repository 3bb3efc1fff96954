//! Convenience re-exports
//!
//! ```
//! use tabstream::prelude::*;
//! ```

pub use crate::config::{MalformedPolicy, StreamConfig};
pub use crate::error::{MalformedRecordError, RecordError, StreamError, StreamResult};
pub use crate::lifecycle::{IterationStatus, SourceState};
pub use crate::model::{
    ColumnKind, ColumnModel, ColumnSpec, RecordModel, Row, Value, model_fn, parse_columns,
};
pub use crate::row;
pub use crate::source::{Input, SourceAdapter};
pub use crate::stream::{RecordStream, StreamOptions};
