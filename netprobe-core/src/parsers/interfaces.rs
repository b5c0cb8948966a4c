//! `show interface` and `show vlans`
//!
//! Interface blocks start with an unindented `<name> is ...` line and run
//! until the next unindented line. Parsing is an explicit two-state machine:
//! idle between blocks, accumulating inside one.

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseError, ParseResult, parse_number};
use crate::device::OsFamily;

/// Command listing all interfaces
pub const INTERFACES_COMMAND: &str = "show interface";
/// Command listing subinterface traffic on IOS XE
pub const VLANS_COMMAND: &str = "show vlans";

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new($pattern).expect(concat!(stringify!($name), " is a valid regex pattern"))
        });
    };
}

// Lines that never start a new block: indented, `admin ...`, command echo,
// prompt, or empty.
static_regex!(CONTINUATION, r"(?:^!?(?: |admin|show|.+#).*$|^$)");
static_regex!(DEVICE_NAME, r"^([a-zA-Z0-9/.-]+) is.*$");
static_regex!(
    ADMIN_STATUS,
    r"^.+ is (administratively)?\s*(up|down).*, line protocol is.*$"
);
static_regex!(
    ADMIN_STATUS_NXOS,
    r"^\S+ is (up|down)(?:\s|,)?(\(Administratively down\))?.*$"
);
static_regex!(DESCRIPTION, r"^\s+Description: (.*)$");
static_regex!(
    MAC_ADDRESS,
    r"^\s+Hardware(?: is|:) .+, address(?: is|:) (.*) \(.*\)$"
);
static_regex!(
    DROPS,
    r"^\s+Input queue: \d+/\d+/(\d+)/\d+ .+ Total output drops: (\d+)$"
);
static_regex!(
    INPUT_BYTES,
    r"^\s+\d+ (?:packets input,|input packets)\s+(\d+) bytes.*$"
);
static_regex!(
    OUTPUT_BYTES,
    r"^\s+\d+ (?:packets output,|output packets)\s+(\d+) bytes.*$"
);
static_regex!(INPUT_ERRORS, r"^\s+(\d+) input error(?:s,)? .*$");
static_regex!(OUTPUT_ERRORS, r"^\s+(\d+) output error(?:s,)? .*$");
static_regex!(SPEED, r"^\s+(.*)-duplex,\s(\d+) ?((\wb)/s).*$");
static_regex!(TX_SECTION_NXOS, r"^\s+TX$");
static_regex!(
    MULTI_BROAD_NXOS,
    r"^.* (\d+) multicast packets\s+(\d+) broadcast packets$"
);
static_regex!(
    MULTI_BROAD_IOSXE,
    r"^\s+Received\s+(\d+)\sbroadcasts \((\d+) (?:IP\s)?multicast(?:s)?\)"
);
static_regex!(MULTI_BROAD_IOS, r"^\s*Received (\d+) broadcasts.*$");

static_regex!(
    VLAN_NAME,
    r"^([a-zA-Z0-9/-]+\.[a-zA-Z0-9/-]+) \(:?\d+\).*$"
);
static_regex!(VLAN_INPUT_BYTES, r"^\s+Total \d+ packets, (\d+) bytes input.*$");
static_regex!(VLAN_OUTPUT_BYTES, r"^\s+Total \d+ packets, (\d+) bytes output.*$");

/// Status and counters of one interface
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct Interface {
    pub name: String,
    pub mac_address: String,
    pub description: String,
    /// `up` or `down`
    pub admin_status: String,
    /// `up` or `down`
    pub oper_status: String,
    /// e.g. `1000 Mb/s`
    pub speed: String,
    pub input_errors: f64,
    pub output_errors: f64,
    pub input_drops: f64,
    pub output_drops: f64,
    pub input_bytes: f64,
    pub output_bytes: f64,
    pub input_broadcast: f64,
    pub input_multicast: f64,
}

impl Interface {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Parser state between lines
#[derive(Debug)]
enum Accumulator {
    Idle,
    Collecting {
        current: Interface,
        /// NX-OS prints RX then TX counters under the same labels
        rx: bool,
    },
}

impl Accumulator {
    fn flush_into(&mut self, items: &mut Vec<Interface>) {
        if let Self::Collecting { current, .. } = std::mem::replace(self, Self::Idle) {
            items.push(current);
        }
    }
}

fn apply_line(current: &mut Interface, rx: &mut bool, line: &str) {
    if let Some(caps) = ADMIN_STATUS.captures(line) {
        current.admin_status = if caps.get(1).is_some() { "down" } else { "up" }.to_string();
        current.oper_status = caps[2].to_string();
    } else if let Some(caps) = ADMIN_STATUS_NXOS.captures(line) {
        current.admin_status = if caps.get(2).is_some() { "down" } else { "up" }.to_string();
        current.oper_status = caps[1].to_string();
    } else if let Some(caps) = DESCRIPTION.captures(line) {
        current.description = caps[1].to_string();
    } else if let Some(caps) = MAC_ADDRESS.captures(line) {
        current.mac_address = caps[1].to_string();
    } else if let Some(caps) = DROPS.captures(line) {
        current.input_drops = parse_number(&caps[1]);
        current.output_drops = parse_number(&caps[2]);
    } else if let Some(caps) = INPUT_BYTES.captures(line) {
        current.input_bytes = parse_number(&caps[1]);
    } else if let Some(caps) = OUTPUT_BYTES.captures(line) {
        current.output_bytes = parse_number(&caps[1]);
    } else if let Some(caps) = INPUT_ERRORS.captures(line) {
        current.input_errors = parse_number(&caps[1]);
    } else if let Some(caps) = OUTPUT_ERRORS.captures(line) {
        current.output_errors = parse_number(&caps[1]);
    } else if let Some(caps) = SPEED.captures(line) {
        current.speed = format!("{} {}", &caps[2], &caps[3]);
    } else if TX_SECTION_NXOS.is_match(line) {
        *rx = false;
    } else if let Some(caps) = MULTI_BROAD_NXOS.captures(line) {
        if *rx {
            current.input_multicast = parse_number(&caps[1]);
            current.input_broadcast = parse_number(&caps[2]);
        }
    } else if let Some(caps) = MULTI_BROAD_IOSXE.captures(line) {
        current.input_broadcast = parse_number(&caps[1]);
        current.input_multicast = parse_number(&caps[2]);
    } else if let Some(caps) = MULTI_BROAD_IOS.captures(line) {
        current.input_broadcast = parse_number(&caps[1]);
    }
}

/// Parses `show interface`
///
/// An unindented line that is not an interface header closes the current
/// block without opening a new one, so its trailing lines are ignored.
///
/// # Errors
///
/// Never fails for the supported families.
pub fn parse_interfaces(_os: OsFamily, output: &str) -> ParseResult<Vec<Interface>> {
    let mut items = Vec::new();
    let mut state = Accumulator::Idle;

    for line in output.lines() {
        if !CONTINUATION.is_match(line) {
            state.flush_into(&mut items);
            if let Some(caps) = DEVICE_NAME.captures(line) {
                state = Accumulator::Collecting {
                    current: Interface::named(&caps[1]),
                    rx: true,
                };
            }
        }
        if let Accumulator::Collecting { current, rx } = &mut state {
            apply_line(current, rx, line);
        }
    }
    state.flush_into(&mut items);

    Ok(items)
}

/// Parses `show vlans` into subinterfaces carrying only byte counters
///
/// # Errors
///
/// Only IOS XE is supported.
pub fn parse_vlans(os: OsFamily, output: &str) -> ParseResult<Vec<Interface>> {
    if os != OsFamily::IosXe {
        return Err(ParseError::Unsupported {
            command: VLANS_COMMAND,
            os,
        });
    }

    let mut items = Vec::new();
    let mut state = Accumulator::Idle;
    for line in output.lines() {
        if let Some(caps) = VLAN_NAME.captures(line) {
            state.flush_into(&mut items);
            state = Accumulator::Collecting {
                current: Interface::named(&caps[1]),
                rx: true,
            };
            continue;
        }
        let Accumulator::Collecting { current, .. } = &mut state else {
            continue;
        };
        if let Some(caps) = VLAN_INPUT_BYTES.captures(line) {
            current.input_bytes = parse_number(&caps[1]);
        } else if let Some(caps) = VLAN_OUTPUT_BYTES.captures(line) {
            current.output_bytes = parse_number(&caps[1]);
        }
    }
    state.flush_into(&mut items);

    Ok(items)
}

/// Copies subinterface byte counters onto the matching interfaces
pub fn merge_vlan_counters(interfaces: &mut [Interface], vlans: &[Interface]) {
    for vlan in vlans {
        if let Some(item) = interfaces.iter_mut().find(|i| i.name == vlan.name) {
            item.input_bytes = vlan.input_bytes;
            item.output_bytes = vlan.output_bytes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOS_OUTPUT: &str = "\
show interface
GigabitEthernet0/1 is up, line protocol is up
  Hardware is iGbE, address is 5254.0012.3456 (bia 5254.0012.3456)
  Description: uplink to core
  Full-duplex, 1000Mb/s, media type is RJ45
  Input queue: 0/75/3/0 (size/max/drops/flushes); Total output drops: 7
     1000 packets input, 64000 bytes, 0 no buffer
     Received 12 broadcasts (5 IP multicasts)
     2 input errors, 0 CRC, 0 frame, 0 overrun, 0 ignored
     2000 packets output, 128000 bytes, 0 underruns
     1 output errors, 0 collisions, 1 interface resets
GigabitEthernet0/2 is administratively down, line protocol is down
  Hardware is iGbE, address is 5254.0012.3457 (bia 5254.0012.3457)
router#";

    const NXOS_OUTPUT: &str = "\
show interface
Ethernet1/1 is up
admin state is up, Dedicated Interface
  Hardware: 100/1000/10000 Ethernet, address: 0050.5683.1234 (bia 0050.5683.1234)
  Description: to-leaf
  full-duplex, 10 Gb/s, media type is 10G
  RX
    100 unicast packets  20 multicast packets  3 broadcast packets
    123 input packets  45678 bytes
  TX
    200 unicast packets  40 multicast packets  6 broadcast packets
    246 output packets  91011 bytes
switch#";

    #[test]
    fn test_ios_interfaces() {
        let items = parse_interfaces(OsFamily::Ios, IOS_OUTPUT).unwrap();
        assert_eq!(items.len(), 2);

        let gi1 = &items[0];
        assert_eq!(gi1.name, "GigabitEthernet0/1");
        assert_eq!(gi1.admin_status, "up");
        assert_eq!(gi1.oper_status, "up");
        assert_eq!(gi1.mac_address, "5254.0012.3456");
        assert_eq!(gi1.description, "uplink to core");
        assert_eq!(gi1.speed, "1000 Mb/s");
        assert!((gi1.input_drops - 3.0).abs() < f64::EPSILON);
        assert!((gi1.output_drops - 7.0).abs() < f64::EPSILON);
        assert!((gi1.input_bytes - 64000.0).abs() < f64::EPSILON);
        assert!((gi1.output_bytes - 128_000.0).abs() < f64::EPSILON);
        assert!((gi1.input_broadcast - 12.0).abs() < f64::EPSILON);
        assert!((gi1.input_multicast - 5.0).abs() < f64::EPSILON);
        assert!((gi1.input_errors - 2.0).abs() < f64::EPSILON);
        assert!((gi1.output_errors - 1.0).abs() < f64::EPSILON);

        let gi2 = &items[1];
        assert_eq!(gi2.admin_status, "down");
        assert_eq!(gi2.oper_status, "down");
    }

    #[test]
    fn test_nxos_rx_counters_only() {
        let items = parse_interfaces(OsFamily::NxOs, NXOS_OUTPUT).unwrap();
        assert_eq!(items.len(), 1);
        let eth = &items[0];
        assert_eq!(eth.name, "Ethernet1/1");
        assert_eq!(eth.admin_status, "up");
        assert_eq!(eth.oper_status, "up");
        assert_eq!(eth.mac_address, "0050.5683.1234");
        assert_eq!(eth.speed, "10 Gb/s");
        assert!((eth.input_multicast - 20.0).abs() < f64::EPSILON);
        assert!((eth.input_broadcast - 3.0).abs() < f64::EPSILON);
        assert!((eth.input_bytes - 45678.0).abs() < f64::EPSILON);
        assert!((eth.output_bytes - 91011.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_output_yields_no_records() {
        let items = parse_interfaces(OsFamily::Ios, "show interface\nrouter#").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_unknown_header_closes_block() {
        let output = "\
Vlan1 is up, line protocol is up
  Description: mgmt
Some banner text
  Description: must not overwrite
router#";
        let items = parse_interfaces(OsFamily::Ios, output).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "mgmt");
    }

    #[test]
    fn test_vlans_merge_into_subinterfaces() {
        let vlans_output = "\
show vlans
Virtual LAN ID:  100 (IEEE 802.1Q Encapsulation)

   vLAN Trunk Interface:   GigabitEthernet0/0/1.100

GigabitEthernet0/0/1.100 (100)

        Total 1000 packets, 64000 bytes input
        Total 2000 packets, 128000 bytes output
router#";
        let vlans = parse_vlans(OsFamily::IosXe, vlans_output).unwrap();
        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[0].name, "GigabitEthernet0/0/1.100");

        let mut interfaces = vec![
            Interface::named("GigabitEthernet0/0/1"),
            Interface::named("GigabitEthernet0/0/1.100"),
        ];
        merge_vlan_counters(&mut interfaces, &vlans);
        assert!(interfaces[0].input_bytes.abs() < f64::EPSILON);
        assert!((interfaces[1].input_bytes - 64000.0).abs() < f64::EPSILON);
        assert!((interfaces[1].output_bytes - 128_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vlans_unsupported_outside_iosxe() {
        assert!(parse_vlans(OsFamily::Ios, "").is_err());
    }
}
