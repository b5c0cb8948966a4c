//! Integration test modules

mod orchestrator_tests;
mod session_tests;

pub const IOS_BANNER: &str =
    "Cisco IOS Software, C2960 Software (C2960-LANBASEK9-M), Version 15.0(2)SE11, RELEASE SOFTWARE (fc3)";
pub const IOSXE_BANNER: &str =
    "Cisco IOS XE Software, Version 17.03.04 - Extended Support Release";
