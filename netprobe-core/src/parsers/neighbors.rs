//! ARP and IPv6 neighbor discovery counts

use std::sync::LazyLock;

use regex::Regex;

use super::ParseResult;
use crate::device::OsFamily;

/// Command listing interfaces with an IPv4 address
pub const IPV4_INTERFACES_COMMAND: &str = "show ip interface brief";
/// Command listing interfaces with IPv6 enabled
pub const IPV6_INTERFACES_COMMAND: &str = "show ipv6 interface brief";

static IPV4_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9/.-]+)\s+\d+\.\d+\.\d+\.\d+")
        .expect("IPV4_INTERFACE is a valid regex pattern")
});

static IPV6_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9/.-]+)\s+").expect("IPV6_INTERFACE is a valid regex pattern")
});

// `show ip arp detail` style: "Dynamic, via Vlan8, last updated 9 minutes ago."
static ARP_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(Dynamic|Incomplete|Interface),? via ([a-zA-Z0-9/.-]+)")
        .expect("ARP_DETAIL is a valid regex pattern")
});

// Table style: "Internet  10.0.0.2   12   aabb.cc00.0200  ARPA   Vlan1"
static ARP_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Internet\s+\S+\s+(\S+)\s+(\S+)\s+\S+").expect("ARP_ROW is a valid regex pattern")
});

// "FE80::AD79:7159:3AB9:D52F   0 aaaa.6cd6.0e6f  STALE Vl65"
static ND_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9:]+\s+[\d-]+\s+[a-zA-Z0-9.-]+\s+(\w+)\s+(\S+)")
        .expect("ND_ROW is a valid regex pattern")
});

/// Neighbor states reported per interface, in emission order
pub const NEIGHBOR_STATES: [&str; 5] = ["incomplete", "reachable", "stale", "delay", "probe"];

/// Neighbor entries per state on one interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborCounts {
    /// Resolution pending or failed
    pub incomplete: u32,
    /// Confirmed reachable
    pub reachable: u32,
    /// Not confirmed recently
    pub stale: u32,
    /// Waiting before probing
    pub delay: u32,
    /// Being probed
    pub probe: u32,
}

impl NeighborCounts {
    /// Counts paired with [`NEIGHBOR_STATES`]
    #[must_use]
    pub const fn by_state(&self) -> [(&'static str, u32); 5] {
        [
            (NEIGHBOR_STATES[0], self.incomplete),
            (NEIGHBOR_STATES[1], self.reachable),
            (NEIGHBOR_STATES[2], self.stale),
            (NEIGHBOR_STATES[3], self.delay),
            (NEIGHBOR_STATES[4], self.probe),
        ]
    }
}

/// ARP command for one interface
#[must_use]
pub fn ipv4_neighbors_command(interface: &str) -> String {
    format!("show ip arp {interface}")
}

/// IPv6 neighbor command for one interface
#[must_use]
pub fn ipv6_neighbors_command(interface: &str) -> String {
    format!("show ipv6 neighbors {interface}")
}

/// Interfaces that carry an IPv4 address
///
/// # Errors
///
/// Never fails; the `Result` keeps the parser signature uniform.
pub fn parse_ipv4_interfaces(_os: OsFamily, output: &str) -> ParseResult<Vec<String>> {
    Ok(output
        .lines()
        .filter_map(|line| IPV4_INTERFACE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect())
}

/// Interfaces whose first address line is not `unassigned`
///
/// # Errors
///
/// Never fails; the `Result` keeps the parser signature uniform.
pub fn parse_ipv6_interfaces(_os: OsFamily, output: &str) -> ParseResult<Vec<String>> {
    let mut items = Vec::new();
    let mut pending: Option<&str> = None;
    for line in output.lines() {
        if let Some(caps) = IPV6_INTERFACE.captures(line) {
            pending = caps.get(1).map(|m| m.as_str());
        } else if let Some(name) = pending.take() {
            if !line.contains("unassigned") {
                items.push(name.to_string());
            }
        }
    }
    Ok(items)
}

/// Counts ARP entries
///
/// Accepts both the `detail` layout and the plain table. The router's own
/// addresses (age `-` or `Interface`) are not counted.
///
/// # Errors
///
/// Never fails; the `Result` keeps the parser signature uniform.
pub fn parse_ipv4_neighbors(_os: OsFamily, output: &str) -> ParseResult<NeighborCounts> {
    let mut counts = NeighborCounts::default();
    for line in output.lines() {
        if let Some(caps) = ARP_DETAIL.captures(line) {
            match &caps[1] {
                "Incomplete" => counts.incomplete += 1,
                "Dynamic" => counts.reachable += 1,
                _ => {}
            }
        } else if let Some(caps) = ARP_ROW.captures(line) {
            let (age, hardware) = (&caps[1], &caps[2]);
            if hardware == "Incomplete" {
                counts.incomplete += 1;
            } else if age != "-" {
                counts.reachable += 1;
            }
        }
    }
    Ok(counts)
}

/// Counts IPv6 neighbor entries by state
///
/// # Errors
///
/// Never fails; the `Result` keeps the parser signature uniform.
pub fn parse_ipv6_neighbors(_os: OsFamily, output: &str) -> ParseResult<NeighborCounts> {
    let mut counts = NeighborCounts::default();
    for caps in output.lines().filter_map(|line| ND_ROW.captures(line)) {
        match &caps[1] {
            "INCMP" | "INCOM" => counts.incomplete += 1,
            "REACH" => counts.reachable += 1,
            "STALE" => counts.stale += 1,
            "DELAY" => counts.delay += 1,
            "PROBE" => counts.probe += 1,
            _ => {}
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_interfaces() {
        let output = "\
show ip interface brief
Interface              IP-Address      OK? Method Status                Protocol
Vlan1                  10.66.115.1     YES NVRAM  up                    up
GigabitEthernet0/1     unassigned      YES unset  up                    up
Loopback0              10.255.0.1      YES NVRAM  up                    up
router#";
        let names = parse_ipv4_interfaces(OsFamily::IosXe, output).unwrap();
        assert_eq!(names, vec!["Vlan1", "Loopback0"]);
    }

    #[test]
    fn test_ipv6_interfaces_skip_unassigned() {
        let output = "\
Vlan1                  [up/up]
    FE80::1
    2001:DB8::1
Vlan2                  [up/up]
    unassigned
Vlan3                  [up/up]
    FE80::3
router#";
        let names = parse_ipv6_interfaces(OsFamily::IosXe, output).unwrap();
        assert_eq!(names, vec!["Vlan1", "Vlan3"]);
    }

    #[test]
    fn test_arp_table() {
        let output = "\
show ip arp Vlan1
Protocol  Address          Age (min)  Hardware Addr   Type   Interface
Internet  10.0.0.1                -   aabb.cc00.0100  ARPA   Vlan1
Internet  10.0.0.2               12   aabb.cc00.0200  ARPA   Vlan1
Internet  10.0.0.3                0   Incomplete      ARPA
router#";
        let counts = parse_ipv4_neighbors(OsFamily::Ios, output).unwrap();
        assert_eq!(counts.reachable, 1);
        assert_eq!(counts.incomplete, 1);
    }

    #[test]
    fn test_arp_detail() {
        let output = "\
  Dynamic, via Vlan8, last updated 9 minutes ago.
  Incomplete, via Vlan8, last updated 0 minute ago.
  Interface, via Vlan8";
        let counts = parse_ipv4_neighbors(OsFamily::IosXe, output).unwrap();
        assert_eq!(counts.reachable, 1);
        assert_eq!(counts.incomplete, 1);
    }

    #[test]
    fn test_ipv6_neighbor_states() {
        let output = "\
IPv6 Address                              Age Link-layer Addr State Interface
FE80::AD79:7159:3AB9:D52F                   0 aaaa.6cd6.0e6f  STALE Vl65
2001:DB8::2                                 1 aaaa.6cd6.0e70  REACH Vl65
2001:DB8::5                                 0 -               INCMP Vl65
2001:DB8::6                                 0 aaaa.6cd6.0e71  DELAY Vl65";
        let counts = parse_ipv6_neighbors(OsFamily::IosXe, output).unwrap();
        assert_eq!(
            counts,
            NeighborCounts {
                incomplete: 1,
                reachable: 1,
                stale: 1,
                delay: 1,
                probe: 0,
            }
        );
        assert_eq!(counts.by_state()[2], ("stale", 1));
    }
}
