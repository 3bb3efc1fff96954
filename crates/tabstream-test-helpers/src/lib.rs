//! Shared test utilities for tabstream.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers for stream results with `#[track_caller]`
//! - [`mock`] - A scripted source adapter that records flow-control calls
//! - [`fixtures`] - Column sets and generated TSV input
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! tabstream-test-helpers = { workspace = true, features = ["mock", "fixtures"] }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod must;
pub mod prelude;

#[cfg(feature = "mock")]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

#[cfg(feature = "fixtures")]
#[cfg_attr(docsrs, doc(cfg(feature = "fixtures")))]
pub mod fixtures;

pub use must::*;
