//! Property-based tests for the `netprobe` core library
//!
//! Prompt detection, parsers, configuration host parsing and text
//! exposition are exercised with generated input.

#![allow(clippy::float_cmp)]

mod properties;
