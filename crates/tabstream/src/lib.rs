//! Backpressured pull iteration over tab-separated record streams
//!
//! This crate turns a byte stream of line-delimited, field-separated records
//! into an asynchronous sequence of typed records while bounding memory use.
//!
//! # Architecture
//!
//! - [`model`]: record models mapping one line to one record ([`ColumnModel`]
//!   for typed columns, [`model_fn`] for closures)
//! - [`source`]: the producer side; [`ReaderSource`] splits any `AsyncRead`
//!   into lines and honors pause/resume
//! - [`buffer`]: the flow-controlled queue between producer and consumer
//! - [`lifecycle`]: source state and the derived iteration status
//! - [`stream`]: [`RecordStream`], the consumer-facing pull iterator
//! - [`config`]: capacity, low-water mark, separator and malformed-line policy
//! - [`error`]: error types
//!
//! # Example
//!
//! ```no_run
//! use tabstream::prelude::*;
//!
//! async fn run() -> StreamResult<()> {
//!     let mut stream = RecordStream::open(
//!         StreamOptions::new()
//!             .columns(parse_columns("name:text,count:integer")?)
//!             .path("counts.tsv")
//!             .max_capacity(256),
//!     )?;
//!
//!     while let Some(row) = stream.next().await {
//!         println!("{}", row?);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod buffer;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod prelude;
pub mod source;
pub mod stats;
pub mod stream;

pub use buffer::LineSink;
pub use config::{DEFAULT_MAX_CAPACITY, MalformedPolicy, StreamConfig};
pub use error::{MalformedRecordError, RecordError, StreamError, StreamResult};
pub use lifecycle::{IterationStatus, SourceState};
pub use model::{
    ColumnKind, ColumnModel, ColumnSpec, DEFAULT_SEPARATOR, FnModel, RecordModel, Row, Value,
    model_fn, parse_columns,
};
pub use source::{Input, PauseGate, ReaderSource, SourceAdapter};
pub use stats::StreamStats;
pub use stream::{RecordStream, StreamOptions};

pub use tokio_util::sync::CancellationToken;
