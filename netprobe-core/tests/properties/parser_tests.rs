//! Property tests for the command output parsers

use netprobe_core::OsFamily;
use netprobe_core::parsers::{bgp, environment, facts, interfaces, neighbors, optics};
use proptest::prelude::*;

// ========== Strategies ==========

fn arb_os() -> impl Strategy<Value = OsFamily> {
    prop_oneof![Just(OsFamily::Ios), Just(OsFamily::IosXe), Just(OsFamily::NxOs)]
}

/// Text that looks roughly like device output
fn arb_output() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[ -~]{0,80}",
            "\\s+[0-9]+ [a-z ]{0,20}, [0-9]+ bytes",
            "[A-Za-z]+[0-9]/[0-9] is (up|down), line protocol is (up|down)",
            "Internet +[0-9.]+ +[-0-9]+ +[a-f0-9.]+ +ARPA +Vlan[0-9]",
        ],
        0..30,
    )
    .prop_map(|lines| lines.join("\n"))
}

fn arb_nd_state() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("INCMP"),
        Just("REACH"),
        Just("STALE"),
        Just("DELAY"),
        Just("PROBE"),
    ]
}

// ========== Properties ==========

proptest! {
    #[test]
    fn prop_parsers_never_panic(os in arb_os(), output in arb_output()) {
        let _ = bgp::parse_sessions(os, &output);
        let _ = environment::parse(os, &output);
        let _ = facts::parse_version(os, &output);
        let _ = facts::parse_memory(os, &output);
        let _ = facts::parse_cpu(os, &output);
        let _ = interfaces::parse_interfaces(os, &output);
        let _ = interfaces::parse_vlans(os, &output);
        let _ = neighbors::parse_ipv4_interfaces(os, &output);
        let _ = neighbors::parse_ipv6_interfaces(os, &output);
        let _ = neighbors::parse_ipv4_neighbors(os, &output);
        let _ = neighbors::parse_ipv6_neighbors(os, &output);
        let _ = optics::parse_interface_list(os, &output);
        let _ = optics::parse_transceiver(os, &output);
    }

    #[test]
    fn prop_arp_rows_are_counted(dynamic in 0usize..40, incomplete in 0usize..10) {
        let mut lines = vec!["Protocol  Address          Age (min)  Hardware Addr   Type   Interface".to_string()];
        lines.push("Internet  10.0.0.1                -   aabb.cc00.0100  ARPA   Vlan10".to_string());
        for i in 0..dynamic {
            lines.push(format!("Internet  10.0.1.{i}  {}   aabb.cc00.{i:04x}  ARPA   Vlan10", i % 240));
        }
        for i in 0..incomplete {
            lines.push(format!("Internet  10.0.2.{i}  0   Incomplete      ARPA"));
        }

        let counts = neighbors::parse_ipv4_neighbors(OsFamily::IosXe, &lines.join("\n")).unwrap();
        prop_assert_eq!(counts.reachable as usize, dynamic);
        prop_assert_eq!(counts.incomplete as usize, incomplete);
        prop_assert_eq!(counts.stale, 0);
    }

    #[test]
    fn prop_nd_rows_are_counted_by_state(states in prop::collection::vec(arb_nd_state(), 0..50)) {
        let output: Vec<String> = states
            .iter()
            .enumerate()
            .map(|(i, state)| format!("FE80::{i:X}    0 aaaa.6cd6.{i:04x}  {state} Vl65"))
            .collect();
        let counts = neighbors::parse_ipv6_neighbors(OsFamily::IosXe, &output.join("\n")).unwrap();

        let expected = |name: &str| states.iter().filter(|s| **s == name).count() as u32;
        prop_assert_eq!(counts.incomplete, expected("INCMP"));
        prop_assert_eq!(counts.reachable, expected("REACH"));
        prop_assert_eq!(counts.stale, expected("STALE"));
        prop_assert_eq!(counts.delay, expected("DELAY"));
        prop_assert_eq!(counts.probe, expected("PROBE"));
    }

    #[test]
    fn prop_bgp_rows_round_trip(
        octet in 1u8..255,
        asn in 1u32..4_200_000_000,
        input in 0u32..1_000_000,
        output in 0u32..1_000_000,
        prefixes in prop::option::of(0u32..900_000),
    ) {
        let state = prefixes.map_or_else(|| "Active".to_string(), |p| p.to_string());
        let row = format!("10.0.0.{octet}    4 {asn:>12} {input:>7} {output:>7}       55    0    0 1w2d {state:>12}");

        let sessions = bgp::parse_sessions(OsFamily::IosXe, &row).unwrap();
        prop_assert_eq!(sessions.len(), 1);
        let session = &sessions[0];
        prop_assert_eq!(&session.ip, &format!("10.0.0.{octet}"));
        prop_assert_eq!(&session.asn, &asn.to_string());
        prop_assert_eq!(session.input_messages, f64::from(input));
        prop_assert_eq!(session.output_messages, f64::from(output));
        prop_assert_eq!(session.up, prefixes.is_some());
        prop_assert_eq!(session.received_prefixes, f64::from(prefixes.unwrap_or(0)));
    }

    #[test]
    fn prop_interface_blocks_keep_their_counters(
        counters in prop::collection::vec((0u64..1_000_000_000, any::<bool>()), 1..12),
    ) {
        let mut lines = vec!["show interface".to_string()];
        for (i, (bytes, up)) in counters.iter().enumerate() {
            let status = if *up { "up" } else { "down" };
            lines.push(format!("GigabitEthernet1/0/{i} is {status}, line protocol is {status}"));
            lines.push("  Hardware is Gigabit Ethernet, address is 5254.0012.3456 (bia 5254.0012.3456)".to_string());
            lines.push(format!("     1234 packets input, {bytes} bytes, 0 no buffer"));
        }
        lines.push("switch#".to_string());

        let items = interfaces::parse_interfaces(OsFamily::Ios, &lines.join("\n")).unwrap();
        prop_assert_eq!(items.len(), counters.len());
        for (i, (item, (bytes, up))) in items.iter().zip(&counters).enumerate() {
            prop_assert_eq!(&item.name, &format!("GigabitEthernet1/0/{i}"));
            prop_assert_eq!(item.input_bytes, *bytes as f64);
            prop_assert_eq!(item.admin_status.as_str(), "up");
            prop_assert_eq!(item.oper_status.as_str(), if *up { "up" } else { "down" });
            prop_assert_eq!(item.mac_address.as_str(), "5254.0012.3456");
        }
    }
}
