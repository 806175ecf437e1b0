//! Instance file access for the dispersion planner.
//!
//! Responsibilities:
//! - Parse the whitespace-separated instance format into
//!   [`dispersion_core::InstanceData`].
//! - Report malformed input with 1-based line numbers.
//!
//! Boundaries:
//! - Validation of the resulting tables lives in `dispersion-core`.
//! - File access goes through `dispersion-fs`.

mod reader;

pub use reader::{InstanceReadError, ParseError, ReadOptions, parse_instance, read_instance};
