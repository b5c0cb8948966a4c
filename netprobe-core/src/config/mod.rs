//! YAML configuration and target resolution
//!
//! A [`Config`] is read once at startup and resolved into immutable
//! [`Target`]s before any polling starts. Keys follow the exporter's
//! established file format, so existing configuration files keep working:
//!
//! ```yaml
//! timeout: 5
//! username: admin
//! Password: secret
//! devices:
//!   - host: 10.0.0.1
//!   - host: "[2001:db8::1]:2222"
//!     key_file: ~/.ssh/id_ed25519
//!     features:
//!       bgp: false
//! features:
//!   neighbors: true
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use russh_keys::key::KeyPair;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::models::{AuthMethod, DEFAULT_SSH_PORT, Feature, FeatureSet, Target};
use crate::tracing::span_names;
use crate::transport::PromptMatcher;

/// Default per-command timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Default read batch size in bytes
pub const DEFAULT_BATCH_SIZE: usize = 10_000;
/// Login name used when none is configured
pub const DEFAULT_USERNAME: &str = "cisco_exporter";

/// Top-level configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log every command and its output
    pub debug: bool,
    /// Allow CBC ciphers for every device
    pub legacy_ciphers: bool,
    /// Connect and per-command timeout in seconds
    pub timeout: u64,
    /// Maximum bytes consumed per read
    pub batch_size: usize,
    /// Login name
    pub username: String,
    /// Password, also accepted as `Password`
    #[serde(alias = "Password", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Private key file, `~` is expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    /// Custom prompt regex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_pattern: Option<String>,
    /// Devices to poll
    pub devices: Vec<DeviceConfig>,
    /// Feature switches applied to every device
    pub features: FeatureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            legacy_ciphers: false,
            timeout: DEFAULT_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            username: DEFAULT_USERNAME.to_string(),
            password: None,
            key_file: None,
            prompt_pattern: None,
            devices: Vec::new(),
            features: FeatureConfig::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("debug", &self.debug)
            .field("legacy_ciphers", &self.legacy_ciphers)
            .field("timeout", &self.timeout)
            .field("batch_size", &self.batch_size)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_file", &self.key_file)
            .field("prompt_pattern", &self.prompt_pattern)
            .field("devices", &self.devices)
            .field("features", &self.features)
            .finish()
    }
}

impl Config {
    /// Reads and parses a YAML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` if it is not valid YAML for this schema.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let _span = crate::trace_operation!(span_names::CONFIG_LOAD, path = %path.display())
            .entered();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!(devices = config.devices.len(), "Configuration loaded");
        Ok(config)
    }

    /// Parses a YAML document; an empty document yields the defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed input or unknown types.
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Default file location, `<config dir>/netprobe/config.yml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("netprobe").join("config.yml"))
    }

    /// Appends a device per entry of a comma-separated host list
    #[must_use]
    pub fn with_targets(mut self, targets: &str) -> Self {
        self.devices.extend(
            targets
                .split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(DeviceConfig::new),
        );
        self
    }

    /// Features a device ends up with after merging with the global block
    #[must_use]
    pub fn features_for(&self, device: &DeviceConfig) -> FeatureSet {
        device
            .features
            .as_ref()
            .map_or_else(|| self.features.resolve(None), |own| own.resolve(Some(&self.features)))
    }

    /// Compiled prompt matcher, the default prompt when none is set
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the pattern does not compile.
    pub fn prompt_matcher(&self) -> ConfigResult<PromptMatcher> {
        match &self.prompt_pattern {
            Some(pattern) => {
                PromptMatcher::new(pattern).map_err(|e| ConfigError::Validation(e.to_string()))
            }
            None => Ok(PromptMatcher::default()),
        }
    }

    /// Checks values without touching the filesystem
    ///
    /// # Errors
    ///
    /// Returns the first problem found: no devices, a zero timeout or batch
    /// size, a bad host entry or an invalid prompt pattern.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        check_limits("global", self.timeout, self.batch_size)?;
        self.prompt_matcher()?;
        for device in &self.devices {
            parse_host(&device.host)?;
            check_limits(
                &device.host,
                device.timeout.unwrap_or(self.timeout),
                device.batch_size.unwrap_or(self.batch_size),
            )?;
        }
        Ok(())
    }

    /// Resolves every device into a [`Target`]
    ///
    /// Each key file is loaded once, however many devices share it.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `ConfigError::KeyFile` when a key cannot
    /// be loaded, or `ConfigError::NoAuthentication` when a device has
    /// neither a key nor a password.
    pub fn resolve_targets(&self) -> ConfigResult<Vec<Target>> {
        self.validate()?;
        let mut keys = KeyCache::default();
        self.devices
            .iter()
            .map(|device| self.resolve_device(device, &mut keys))
            .collect()
    }

    fn resolve_device(&self, device: &DeviceConfig, keys: &mut KeyCache) -> ConfigResult<Target> {
        let (host, port) = parse_host(&device.host)?;
        let auth = self.auth_for(device, keys)?;
        let target = Target::new(host, port, auth)
            .with_timeout(Duration::from_secs(device.timeout.unwrap_or(self.timeout)))
            .with_batch_size(device.batch_size.unwrap_or(self.batch_size))
            .with_legacy_ciphers(device.legacy_ciphers.unwrap_or(self.legacy_ciphers))
            .with_features(self.features_for(device));
        tracing::debug!(
            target_host = %target.identity(),
            auth = target.auth.kind(),
            "Target resolved"
        );
        Ok(target)
    }

    /// Device key, global key, device password, global password
    fn auth_for(&self, device: &DeviceConfig, keys: &mut KeyCache) -> ConfigResult<AuthMethod> {
        let username = device.username.as_deref().unwrap_or(&self.username);
        if let Some(path) = device.key_file.as_deref().or(self.key_file.as_deref()) {
            return Ok(AuthMethod::PublicKey {
                username: username.to_string(),
                key: keys.load(path)?,
            });
        }
        match device.password.as_deref().or(self.password.as_deref()) {
            Some(password) => Ok(AuthMethod::password(username, password)),
            None => Err(ConfigError::NoAuthentication(device.host.clone())),
        }
    }
}

fn check_limits(scope: &str, timeout: u64, batch_size: usize) -> ConfigResult<()> {
    if timeout == 0 {
        return Err(ConfigError::Validation(format!(
            "{scope}: timeout must be at least 1 second"
        )));
    }
    if batch_size == 0 {
        return Err(ConfigError::Validation(format!(
            "{scope}: batch_size must be greater than 0"
        )));
    }
    Ok(())
}

#[derive(Default)]
struct KeyCache {
    loaded: HashMap<String, Arc<KeyPair>>,
}

impl KeyCache {
    fn load(&mut self, path: &str) -> ConfigResult<Arc<KeyPair>> {
        let expanded = shellexpand::tilde(path).into_owned();
        if let Some(key) = self.loaded.get(&expanded) {
            return Ok(Arc::clone(key));
        }
        let key = russh_keys::load_secret_key(&expanded, None).map_err(|e| {
            ConfigError::KeyFile {
                path: expanded.clone(),
                reason: e.to_string(),
            }
        })?;
        let key = Arc::new(key);
        self.loaded.insert(expanded, Arc::clone(&key));
        Ok(key)
    }
}

/// Splits `host[:port]`, `[v6]:port` or a bare IPv6 address
///
/// # Errors
///
/// Returns `ConfigError::InvalidHost` for an empty host or a bad port.
pub fn parse_host(entry: &str) -> ConfigResult<(String, u16)> {
    let entry = entry.trim();
    let invalid = || ConfigError::InvalidHost(entry.to_string());

    let (host, port) = if let Some(rest) = entry.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        match tail {
            "" => (host, None),
            _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
        }
    } else if entry.matches(':').count() == 1 {
        let (host, port) = entry.split_once(':').ok_or_else(invalid)?;
        (host, Some(port))
    } else {
        (entry, None)
    };

    if host.is_empty() {
        return Err(invalid());
    }
    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(invalid)?,
        None => DEFAULT_SSH_PORT,
    };
    Ok((host.to_string(), port))
}

/// One device entry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// `host[:port]`
    pub host: String,
    /// Overrides the global login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Overrides the global password
    #[serde(default, alias = "Password", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Overrides the global key file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    /// Overrides the global cipher setting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_ciphers: Option<bool>,
    /// Overrides the global timeout, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Overrides the global batch size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Flags set here win over the global block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureConfig>,
}

impl DeviceConfig {
    /// Creates an entry with no overrides
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            password: None,
            key_file: None,
            legacy_ciphers: None,
            timeout: None,
            batch_size: None,
            features: None,
        }
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_file", &self.key_file)
            .field("legacy_ciphers", &self.legacy_ciphers)
            .field("timeout", &self.timeout)
            .field("batch_size", &self.batch_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature switches; unset flags defer to the next level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// BGP sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp: Option<bool>,
    /// Sensors and power supplies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<bool>,
    /// Version, memory and CPU
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<bool>,
    /// Interface counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<bool>,
    /// Transceiver power
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optics: Option<bool>,
    /// ARP and ND counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<bool>,
}

impl FeatureConfig {
    /// The explicit flag for a feature
    #[must_use]
    pub const fn get(&self, feature: Feature) -> Option<bool> {
        match feature {
            Feature::Bgp => self.bgp,
            Feature::Environment => self.environment,
            Feature::Facts => self.facts,
            Feature::Interfaces => self.interfaces,
            Feature::Optics => self.optics,
            Feature::Neighbors => self.neighbors,
        }
    }

    /// Sets the flag for a feature
    pub const fn set(&mut self, feature: Feature, enabled: bool) {
        let slot = match feature {
            Feature::Bgp => &mut self.bgp,
            Feature::Environment => &mut self.environment,
            Feature::Facts => &mut self.facts,
            Feature::Interfaces => &mut self.interfaces,
            Feature::Optics => &mut self.optics,
            Feature::Neighbors => &mut self.neighbors,
        };
        *slot = Some(enabled);
    }

    /// Own flag, then `fallback`, then the built-in default
    #[must_use]
    pub fn resolve(&self, fallback: Option<&Self>) -> FeatureSet {
        Feature::ALL
            .into_iter()
            .filter(|feature| {
                self.get(*feature)
                    .or_else(|| fallback.and_then(|f| f.get(*feature)))
                    .unwrap_or_else(|| feature.enabled_by_default())
            })
            .collect()
    }
}
