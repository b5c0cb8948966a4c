//! Polling targets and their credentials

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use russh_keys::key::KeyPair;
use secrecy::SecretString;

use super::FeatureSet;

/// Port assumed when a host entry carries none
pub const DEFAULT_SSH_PORT: u16 = 22;

/// How to authenticate against a device
///
/// Secrets are never printed by `Debug`.
#[derive(Clone)]
pub enum AuthMethod {
    /// Password authentication
    Password {
        /// Login name
        username: String,
        /// Password
        password: Arc<SecretString>,
    },
    /// Public key authentication with a decoded private key
    PublicKey {
        /// Login name
        username: String,
        /// Decoded private key
        key: Arc<KeyPair>,
    },
}

impl AuthMethod {
    /// Builds password authentication
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: Arc::new(SecretString::from(password.into())),
        }
    }

    /// Login name regardless of the method
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::PublicKey { username, .. } => username,
        }
    }

    /// Short method name for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::PublicKey { .. } => "publickey",
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthMethod")
            .field("kind", &self.kind())
            .field("username", &self.username())
            .finish_non_exhaustive()
    }
}

/// One device to poll, fully resolved
#[derive(Debug, Clone)]
pub struct Target {
    /// Hostname or address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Credentials
    pub auth: AuthMethod,
    /// Limit for connecting and for each command
    pub timeout: Duration,
    /// Maximum bytes consumed per read
    pub batch_size: usize,
    /// Allow CBC and 3DES ciphers for old firmware
    pub legacy_ciphers: bool,
    /// Enabled metric families
    pub features: FeatureSet,
}

impl Target {
    /// Creates a target with default settings and all default features
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port,
            auth,
            timeout: Duration::from_secs(5),
            batch_size: 10_000,
            legacy_ciphers: false,
            features: FeatureSet::defaults(),
        }
    }

    /// Sets the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the read batch size
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Allows legacy ciphers for this target
    #[must_use]
    pub const fn with_legacy_ciphers(mut self, enabled: bool) -> Self {
        self.legacy_ciphers = enabled;
        self
    }

    /// Sets the enabled features
    #[must_use]
    pub const fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Label value identifying this target in samples
    ///
    /// The port is only included when it differs from 22.
    #[must_use]
    pub fn identity(&self) -> String {
        if self.port == DEFAULT_SSH_PORT {
            self.host.clone()
        } else {
            self.address()
        }
    }

    /// `host:port` for dialing and error messages
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
