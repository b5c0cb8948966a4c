//! Text parsers for device command output
//!
//! Every parser is a pure function of the OS family and the raw output of
//! one command. Lines that do not match are skipped, so output from newer
//! firmware degrades to fewer records instead of an error.

pub mod bgp;
pub mod environment;
pub mod facts;
pub mod interfaces;
pub mod neighbors;
pub mod optics;

use thiserror::Error;

use crate::device::OsFamily;

/// Errors raised by parsers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The command has no parser for this OS family
    #[error("'{command}' is not implemented for {os}")]
    Unsupported {
        /// Command whose output was given
        command: &'static str,
        /// OS family of the device
        os: OsFamily,
    },

    /// A required record was not present in the output
    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Result type for parsers
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a counter, returning `-1` for anything that is not a number
pub(crate) fn parse_number(value: &str) -> f64 {
    value.trim().parse().unwrap_or(-1.0)
}
