//! Transceiver power levels

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseError, ParseResult, parse_number};
use crate::device::OsFamily;

static INTERFACE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9/.-]+)\s*").expect("INTERFACE_NAME is a valid regex pattern")
});

static IOSXE_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S(\d+)/(\d+)/(\d+)").expect("IOSXE_SLOT is a valid regex pattern")
});

static TRANSCEIVER_IOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+\s+(?:-?\d+\.\d+)\s+(?:-?\d+\.\d+)\s+(-?\d+\.\d+)\s+(-?\d+\.\d+)\s*")
        .expect("TRANSCEIVER_IOS is a valid regex pattern")
});

static TRANSCEIVER_NXOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*Tx Power\s*(-?\d+\.\d+).*\s*Rx Power\s*(-?\d+\.\d+).*")
        .expect("TRANSCEIVER_NXOS is a valid regex pattern")
});

static TRANSCEIVER_IOSXE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\s+Transceiver Tx power\s+= (-?\d+\.\d+).*\s*Transceiver Rx optical power\s+= (-?\d+\.\d+).*",
    )
    .expect("TRANSCEIVER_IOSXE is a valid regex pattern")
});

/// Tx and Rx power in dBm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Optics {
    /// Transmit power
    pub tx_power: f64,
    /// Receive power
    pub rx_power: f64,
}

/// Command listing interfaces that may carry a transceiver
#[must_use]
pub const fn interface_list_command(os: OsFamily) -> &'static str {
    match os {
        OsFamily::Ios | OsFamily::IosXe => "show interfaces stats | exclude disabled",
        OsFamily::NxOs => {
            "show interface status | exclude disabled | exclude notconn | exclude sfpAbsent | exclude --------------------------------------------------------------------------------"
        }
    }
}

/// Command printing transceiver diagnostics for one interface
///
/// Returns `None` on IOS XE when the name has no slot/subslot/port triple.
#[must_use]
pub fn transceiver_command(os: OsFamily, interface: &str) -> Option<String> {
    match os {
        OsFamily::Ios => Some(format!("show interfaces {interface} transceiver")),
        OsFamily::NxOs => Some(format!("show interface {interface} transceiver details")),
        OsFamily::IosXe => IOSXE_SLOT.captures(interface).map(|caps| {
            format!(
                "show hw-module subslot {}/{} transceiver {} status",
                &caps[1], &caps[2], &caps[3]
            )
        }),
    }
}

/// Parses the interface list
///
/// Only names containing a digit are kept, which drops the command echo,
/// table headers and separators. Prompt lines are skipped.
///
/// # Errors
///
/// Never fails for the supported families.
pub fn parse_interface_list(_os: OsFamily, output: &str) -> ParseResult<Vec<String>> {
    let names = output
        .lines()
        .filter(|line| !line.contains('#'))
        .filter_map(|line| INTERFACE_NAME.captures(line))
        .map(|caps| caps[1].to_string())
        .filter(|name| name.chars().any(|c| c.is_ascii_digit()))
        .collect();
    Ok(names)
}

/// Parses transceiver output for one interface
///
/// # Errors
///
/// Returns `ParseError::NotFound` when no power reading is present.
pub fn parse_transceiver(os: OsFamily, output: &str) -> ParseResult<Optics> {
    let regex: &Regex = match os {
        OsFamily::Ios => &TRANSCEIVER_IOS,
        OsFamily::NxOs => &TRANSCEIVER_NXOS,
        OsFamily::IosXe => &TRANSCEIVER_IOSXE,
    };
    regex
        .captures(output)
        .map(|caps| Optics {
            tx_power: parse_number(&caps[1]),
            rx_power: parse_number(&caps[2]),
        })
        .ok_or(ParseError::NotFound("Transceiver"))
}
