//! Version, memory pool and CPU facts

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseError, ParseResult, parse_number};
use crate::device::OsFamily;

/// Command printing the running version
pub const VERSION_COMMAND: &str = "show version";
/// Command printing memory pools
pub const MEMORY_COMMAND: &str = "show process memory";
/// Command printing CPU utilization
pub const CPU_COMMAND: &str = "show process cpu";

static VERSION_IOSXE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*, Version (.+) -.*$").expect("VERSION_IOSXE is a valid regex pattern")
});

static VERSION_IOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*, Version (.+),.*$").expect("VERSION_IOS is a valid regex pattern")
});

static VERSION_NXOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+NXOS: version (.*)$").expect("VERSION_NXOS is a valid regex pattern")
});

static MEMORY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S*) Pool Total:\s*(\d+) Used:\s*(\d+) Free:\s*(\d+)\s*$")
        .expect("MEMORY_REGEX is a valid regex pattern")
});

static CPU_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*CPU utilization for five seconds: (\d+)%/(\d+)%; one minute: (\d+)%; five minutes: (\d+)%.*$",
    )
    .expect("CPU_REGEX is a valid regex pattern")
});

/// One memory pool
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPool {
    /// Pool name, e.g. `Processor`
    pub pool: String,
    /// Total bytes
    pub total: f64,
    /// Used bytes
    pub used: f64,
    /// Free bytes
    pub free: f64,
}

/// CPU utilization percentages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuUsage {
    /// Last five seconds
    pub five_seconds: f64,
    /// Interrupt share of the last five seconds
    pub interrupts: f64,
    /// Last minute
    pub one_minute: f64,
    /// Last five minutes
    pub five_minutes: f64,
}

/// Extracts the running version as `<FAMILY>-<version>`
///
/// # Errors
///
/// Returns `ParseError::NotFound` when no version line is present.
pub fn parse_version(os: OsFamily, output: &str) -> ParseResult<String> {
    let regex: &Regex = match os {
        OsFamily::IosXe => &VERSION_IOSXE,
        OsFamily::Ios => &VERSION_IOS,
        OsFamily::NxOs => &VERSION_NXOS,
    };
    output
        .lines()
        .find_map(|line| regex.captures(line))
        .map(|caps| format!("{}-{}", os.as_str(), &caps[1]))
        .ok_or(ParseError::NotFound("Version string"))
}

/// Parses memory pool totals
///
/// # Errors
///
/// NX-OS is not supported.
pub fn parse_memory(os: OsFamily, output: &str) -> ParseResult<Vec<MemoryPool>> {
    if os == OsFamily::NxOs {
        return Err(ParseError::Unsupported {
            command: MEMORY_COMMAND,
            os,
        });
    }
    let pools = output
        .lines()
        .filter_map(|line| MEMORY_REGEX.captures(line))
        .map(|caps| MemoryPool {
            pool: caps[1].to_string(),
            total: parse_number(&caps[2]),
            used: parse_number(&caps[3]),
            free: parse_number(&caps[4]),
        })
        .collect();
    Ok(pools)
}

/// Parses the CPU utilization header line
///
/// # Errors
///
/// NX-OS is not supported; a missing header is `ParseError::NotFound`.
pub fn parse_cpu(os: OsFamily, output: &str) -> ParseResult<CpuUsage> {
    if os == OsFamily::NxOs {
        return Err(ParseError::Unsupported {
            command: CPU_COMMAND,
            os,
        });
    }
    output
        .lines()
        .find_map(|line| CPU_REGEX.captures(line))
        .map(|caps| CpuUsage {
            five_seconds: parse_number(&caps[1]),
            interrupts: parse_number(&caps[2]),
            one_minute: parse_number(&caps[3]),
            five_minutes: parse_number(&caps[4]),
        })
        .ok_or(ParseError::NotFound("CPU utilization"))
}
