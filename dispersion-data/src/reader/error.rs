//! Errors raised while reading instance files.

use std::io;
use std::num::{ParseFloatError, ParseIntError};

use camino::Utf8PathBuf;
use dispersion_core::InstanceError;
use thiserror::Error;

/// Malformed instance text. Line numbers are 1-based and count blank lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input ended before a required line.
    #[error("input ended while expecting a {expected}")]
    UnexpectedEnd {
        /// Kind of line that was expected.
        expected: &'static str,
    },
    /// A line has fewer fields than required.
    #[error("line {line}: missing {field}")]
    MissingField {
        /// Offending line.
        line: usize,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A count or index field is not a non-negative integer.
    #[error("line {line}: {field} {value:?} is not a valid integer")]
    InvalidInteger {
        /// Offending line.
        line: usize,
        /// Name of the field.
        field: &'static str,
        /// Raw text.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: ParseIntError,
    },
    /// A distance or threshold is not a number.
    #[error("line {line}: {value:?} is not a number")]
    InvalidNumber {
        /// Offending line.
        line: usize,
        /// Raw text.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: ParseFloatError,
    },
    /// A value is not finite or exceeds the exactly representable range once
    /// scaled.
    #[error("line {line}: {value:?} is out of range after scaling")]
    ValueOutOfRange {
        /// Offending line.
        line: usize,
        /// Raw text.
        value: String,
    },
    /// A threshold names a facility slot that does not exist.
    #[error("line {line}: facility slot {slot} is out of range for {facilities} slots")]
    SlotOutOfRange {
        /// Offending line.
        line: usize,
        /// Slot index given.
        slot: usize,
        /// Slot count from the header.
        facilities: usize,
    },
    /// A threshold pairs a slot with itself.
    #[error("line {line}: threshold pairs slot {slot} with itself")]
    SelfPair {
        /// Offending line.
        line: usize,
        /// Repeated slot.
        slot: usize,
    },
    /// The parsed tables do not form a valid instance.
    #[error(transparent)]
    Invalid(#[from] InstanceError),
}

/// Errors returned by [`crate::read_instance`].
#[derive(Debug, Error)]
pub enum InstanceReadError {
    /// The file could not be opened or read.
    #[error("failed to read instance file {path}")]
    Open {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The file contents are malformed.
    #[error("failed to parse instance file {path}")]
    Parse {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// Parse failure with its line number.
        #[source]
        source: ParseError,
    },
}
