//! `show environment` / `show environment all`
//!
//! Almost every platform prints a different table, so temperature and power
//! rows are matched with one pattern pair per OS family.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{ParseResult, parse_number};
use crate::device::OsFamily;

static TEMP_IOSXE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:Temp: )?(?P<sensor>(?:\w+\s?)+)\s+(?P<location>\w+)\s+(?P<state>(?:\w+\s?)+)\s+(?P<value>\d+) Celsius",
    )
    .expect("TEMP_IOSXE is a valid regex pattern")
});

static POWER_IOSXE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(PS\d+)\s+([\w\-]+)\s+\w+\s+\d+\s\w+\s+(\w+)")
        .expect("POWER_IOSXE is a valid regex pattern")
});

static TEMP_IOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<location>\d+)\s+(?P<sensor>air \w+(?: +\w+)?)\s+(?P<value>\d+)C \(.*\)\s+\w+$",
    )
    .expect("TEMP_IOS is a valid regex pattern")
});

static POWER_IOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\s+.+\s+(AC) \w+\s+(\w+)\s+\w+\s+.+\s+.+$")
        .expect("POWER_IOS is a valid regex pattern")
});

static TEMP_NXOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<location>\d+)\s+(?P<sensor>.+)\s+\d\d?\s+\d\d?\s+(?P<value>\d\d?)\s+\w+\s*$")
        .expect("TEMP_NXOS is a valid regex pattern")
});

static POWER_NXOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+.+\s+(AC)\s+.+\s+.+\s+(\w+)\s*$")
        .expect("POWER_NXOS is a valid regex pattern")
});

/// Command printing the environment table
#[must_use]
pub const fn command(os: OsFamily) -> &'static str {
    match os {
        OsFamily::Ios | OsFamily::NxOs => "show environment",
        OsFamily::IosXe => "show environment all",
    }
}

/// A temperature sensor or a power supply
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentItem {
    /// Temperature reading
    Temperature {
        /// Location and sensor name
        name: String,
        /// Degrees Celsius
        celsius: f64,
        /// Reported state, lowercased; empty when the platform prints none
        status: String,
        /// State is a known healthy value
        ok: bool,
    },
    /// Power supply
    PowerSupply {
        /// Slot and model
        name: String,
        /// Reported state
        status: String,
        /// State is a known healthy value
        ok: bool,
    },
}

impl EnvironmentItem {
    /// Item name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Temperature { name, .. } | Self::PowerSupply { name, .. } => name,
        }
    }
}

fn patterns(os: OsFamily) -> (&'static Regex, &'static Regex) {
    match os {
        OsFamily::IosXe => (&TEMP_IOSXE, &POWER_IOSXE),
        OsFamily::Ios => (&TEMP_IOS, &POWER_IOS),
        OsFamily::NxOs => (&TEMP_NXOS, &POWER_NXOS),
    }
}

fn named<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str().trim())
}

fn temperature(caps: &Captures<'_>) -> EnvironmentItem {
    let (status, ok) = caps.name("state").map_or((String::new(), false), |m| {
        let state = m.as_str().trim().to_lowercase();
        let ok = matches!(state.as_str(), "normal" | "good" | "ok" | "green");
        (state, ok)
    });
    EnvironmentItem::Temperature {
        name: format!("{} {}", named(caps, "location"), named(caps, "sensor")),
        celsius: parse_number(named(caps, "value")),
        status,
        ok,
    }
}

fn power_supply(caps: &Captures<'_>) -> EnvironmentItem {
    let status = caps[3].to_string();
    EnvironmentItem::PowerSupply {
        name: format!("{} {}", &caps[1], &caps[2]).trim().to_string(),
        ok: matches!(status.as_str(), "Normal" | "good" | "ok"),
        status,
    }
}

/// Parses temperature and power rows
///
/// # Errors
///
/// Never fails for the supported families; the `Result` keeps the parser
/// signature uniform.
pub fn parse(os: OsFamily, output: &str) -> ParseResult<Vec<EnvironmentItem>> {
    let (temp, power) = patterns(os);
    let items = output
        .lines()
        .filter_map(|line| {
            if let Some(caps) = temp.captures(line) {
                Some(temperature(&caps))
            } else {
                power.captures(line).map(|caps| power_supply(&caps))
            }
        })
        .collect();
    Ok(items)
}
