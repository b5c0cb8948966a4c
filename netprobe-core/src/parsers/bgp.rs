//! `show bgp all summary`

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseError, ParseResult, parse_number};
use crate::device::OsFamily;

/// Command producing the BGP summary
pub const SUMMARY_COMMAND: &str = "show bgp all summary";

static NEIGHBOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+\d\s+(\d+)\s+(\d+)\s+(\d+)\s+\d+\s+\d+\s+\d+\s+\S+\s+(\S+)\s*$")
        .expect("NEIGHBOR_REGEX is a valid regex pattern")
});

/// One BGP neighbor row
#[derive(Debug, Clone, PartialEq)]
pub struct BgpSession {
    /// Neighbor address
    pub ip: String,
    /// Remote AS number
    pub asn: String,
    /// Session is established
    pub up: bool,
    /// Prefixes received; 0 when down
    pub received_prefixes: f64,
    /// Messages received
    pub input_messages: f64,
    /// Messages sent
    pub output_messages: f64,
}

/// Parses neighbor rows
///
/// The last column holds the prefix count for an established session and
/// the state name otherwise.
///
/// # Errors
///
/// Only IOS XE is supported.
pub fn parse_sessions(os: OsFamily, output: &str) -> ParseResult<Vec<BgpSession>> {
    if os != OsFamily::IosXe {
        return Err(ParseError::Unsupported {
            command: SUMMARY_COMMAND,
            os,
        });
    }

    let sessions = output
        .lines()
        .filter_map(|line| NEIGHBOR_REGEX.captures(line))
        .map(|caps| {
            let prefixes = parse_number(&caps[5]);
            let up = prefixes >= 0.0;
            BgpSession {
                ip: caps[1].to_string(),
                asn: caps[2].to_string(),
                up,
                received_prefixes: if up { prefixes } else { 0.0 },
                input_messages: parse_number(&caps[3]),
                output_messages: parse_number(&caps[4]),
            }
        })
        .collect();
    Ok(sessions)
}
