//! # ns-core
//!
//! Shared error type and event-record abstraction for NextStat event
//! selection. Higher-level crates (`ns-select`, `ns-cli`) depend on this
//! crate only; it has no knowledge of any particular analysis.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;

pub use error::{Error, Result};
pub use traits::{EventRecord, FieldMap};
