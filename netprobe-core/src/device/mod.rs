//! Device identification
//!
//! A [`DeviceClient`] borrows an open session and carries the OS family
//! resolved from `show version`. It only exists once identification has
//! succeeded, so collectors never see an unidentified device.

use std::fmt;

use serde::Serialize;

use crate::error::{DeviceError, DeviceResult, SessionResult};
use crate::transport::Session;

/// Command used to identify the device
pub const IDENTIFY_COMMAND: &str = "show version";

/// Operating-system family of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OsFamily {
    /// Classic IOS
    #[serde(rename = "IOS")]
    Ios,
    /// IOS XE
    #[serde(rename = "IOSXE")]
    IosXe,
    /// NX-OS
    #[serde(rename = "NXOS")]
    NxOs,
}

impl OsFamily {
    /// Short name used in version labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "IOS",
            Self::IosXe => "IOSXE",
            Self::NxOs => "NXOS",
        }
    }

    /// Classifies `show version` output
    ///
    /// IOS XE output also mentions "IOS Software", so the more specific
    /// markers are checked first.
    #[must_use]
    pub fn detect(version_output: &str) -> Option<Self> {
        if version_output.contains("IOS XE") {
            Some(Self::IosXe)
        } else if version_output.contains("NX-OS") {
            Some(Self::NxOs)
        } else if version_output.contains("IOS Software") {
            Some(Self::Ios)
        } else {
            None
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identified device reachable through a borrowed session
#[derive(Debug)]
pub struct DeviceClient<'a> {
    session: &'a mut Session,
    os: OsFamily,
    debug: bool,
}

impl<'a> DeviceClient<'a> {
    /// Runs the identification command once and wraps the session
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnknownOs` when no marker matches, or the
    /// session error if the command fails.
    pub async fn identify(session: &'a mut Session, debug: bool) -> DeviceResult<Self> {
        let output = session.run(IDENTIFY_COMMAND).await?;
        let os = OsFamily::detect(&output).ok_or(DeviceError::UnknownOs)?;
        if debug {
            tracing::debug!(target_host = %session.identity(), os = %os, "Host identified");
        }
        Ok(Self { session, os, debug })
    }

    /// The resolved OS family
    #[must_use]
    pub const fn os_family(&self) -> OsFamily {
        self.os
    }

    /// Whether verbose diagnostics are enabled
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Identity of the underlying target
    #[must_use]
    pub fn target(&self) -> &str {
        self.session.identity()
    }

    /// Runs a command on the device
    ///
    /// # Errors
    ///
    /// Propagates session errors.
    pub async fn run(&mut self, command: &str) -> SessionResult<String> {
        if self.debug {
            tracing::debug!(target_host = %self.session.identity(), command, "Running command");
        }
        self.session.run(command).await
    }
}
