//! Property tests for host parsing and feature merging

use netprobe_core::config::parse_host;
use netprobe_core::{Feature, FeatureConfig};
use proptest::prelude::*;

// ========== Strategies ==========

fn arb_hostname() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}(\\.[a-z][a-z0-9-]{0,10}){0,3}"
}

fn arb_ipv6() -> impl Strategy<Value = String> {
    prop::collection::vec(0u16..=0xffff, 8).prop_map(|groups| {
        groups
            .iter()
            .map(|g| format!("{g:x}"))
            .collect::<Vec<_>>()
            .join(":")
    })
}

fn arb_flags() -> impl Strategy<Value = [Option<bool>; 6]> {
    prop::array::uniform6(prop::option::of(any::<bool>()))
}

fn feature_config(flags: [Option<bool>; 6]) -> FeatureConfig {
    let mut config = FeatureConfig::default();
    for (feature, flag) in Feature::ALL.into_iter().zip(flags) {
        if let Some(enabled) = flag {
            config.set(feature, enabled);
        }
    }
    config
}

// ========== Properties ==========

proptest! {
    #[test]
    fn prop_host_and_port(host in arb_hostname(), port in 1u16..=u16::MAX) {
        prop_assert_eq!(parse_host(&format!("{host}:{port}")).unwrap(), (host.clone(), port));
        prop_assert_eq!(parse_host(&host).unwrap(), (host, 22));
    }

    #[test]
    fn prop_ipv6_forms(addr in arb_ipv6(), port in 1u16..=u16::MAX) {
        prop_assert_eq!(parse_host(&addr).unwrap(), (addr.clone(), 22));
        prop_assert_eq!(parse_host(&format!("[{addr}]:{port}")).unwrap(), (addr.clone(), port));
        prop_assert_eq!(parse_host(&format!("[{addr}]")).unwrap(), (addr, 22));
    }

    #[test]
    fn prop_non_numeric_port_is_rejected(host in arb_hostname(), port in "[a-z]{1,6}") {
        let input = format!("{host}:{port}");
        prop_assert!(parse_host(&input).is_err());
    }

    #[test]
    fn prop_device_flags_win_then_global_then_default(
        device in arb_flags(),
        global in arb_flags(),
    ) {
        let resolved = feature_config(device).resolve(Some(&feature_config(global)));
        for (i, feature) in Feature::ALL.into_iter().enumerate() {
            let expected = device[i]
                .or(global[i])
                .unwrap_or_else(|| feature.enabled_by_default());
            prop_assert_eq!(resolved.contains(feature), expected, "{}", feature);
        }
    }
}
