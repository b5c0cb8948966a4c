//! SSH transport built on russh
//!
//! Opens a PTY-backed shell (vt100, 2000 rows, echo off) and exposes it as
//! a [`ShellChannel`].

use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect, Pty, cipher};
use russh_keys::key;
use secrecy::ExposeSecret;
use tokio::time::Instant;

use super::{Connector, PromptMatcher, Session, SessionOptions, ShellChannel};
use crate::error::{SessionError, SessionResult};
use crate::models::{AuthMethod, Target};

/// Cipher list for devices that only speak CBC
const LEGACY_CIPHERS: &[cipher::Name] = &[
    cipher::AES_128_CTR,
    cipher::AES_192_CTR,
    cipher::AES_256_CTR,
    cipher::AES_128_CBC,
    cipher::AES_192_CBC,
    cipher::AES_256_CBC,
];

const TERMINAL_TYPE: &str = "vt100";
const TERMINAL_WIDTH: u32 = 0;
const TERMINAL_HEIGHT: u32 = 2000;

/// Client configurations shared by every connection of a poll
///
/// Built once before fan-out so that per-target tasks only clone an `Arc`.
#[derive(Clone)]
pub struct SshProfile {
    standard: Arc<client::Config>,
    legacy: Arc<client::Config>,
}

impl SshProfile {
    /// Builds the standard and legacy-cipher configurations
    #[must_use]
    pub fn new() -> Self {
        let legacy = client::Config {
            preferred: russh::Preferred {
                cipher: LEGACY_CIPHERS.into(),
                ..Default::default()
            },
            ..Default::default()
        };
        Self {
            standard: Arc::new(client::Config::default()),
            legacy: Arc::new(legacy),
        }
    }

    /// Configuration for a target
    #[must_use]
    pub fn config_for(&self, legacy_ciphers: bool) -> Arc<client::Config> {
        if legacy_ciphers {
            Arc::clone(&self.legacy)
        } else {
            Arc::clone(&self.standard)
        }
    }
}

impl Default for SshProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SshProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshProfile").finish_non_exhaustive()
    }
}

/// Accepts any host key; device keys are not pinned
struct DeviceHandler;

#[async_trait]
impl client::Handler for DeviceHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Interactive shell over an SSH channel
struct SshShell {
    handle: Handle<DeviceHandler>,
    channel: Channel<Msg>,
    pending: Vec<u8>,
    eof: bool,
}

#[async_trait]
impl ShellChannel for SshShell {
    async fn send(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.channel
            .data(data)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    async fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.pending.is_empty() {
            if self.eof {
                return Ok(0);
            }
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => self.pending.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    self.pending.extend_from_slice(&data);
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => self.eof = true,
                Some(_) => {}
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    async fn close(&mut self) -> std::io::Result<()> {
        let _ = self.channel.eof().await;
        let _ = self.channel.close().await;
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
    }
}

/// Opens primed sessions over SSH
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    profile: SshProfile,
    prompt: PromptMatcher,
}

impl SshConnector {
    /// Creates a connector
    #[must_use]
    pub const fn new(profile: SshProfile, prompt: PromptMatcher) -> Self {
        Self { profile, prompt }
    }

    async fn dial(
        &self,
        target: &Target,
        deadline: Instant,
    ) -> SessionResult<Handle<DeviceHandler>> {
        let address = target.address();
        let config = self.profile.config_for(target.legacy_ciphers);
        let connect = client::connect(config, (target.host.as_str(), target.port), DeviceHandler);

        tokio::time::timeout_at(deadline, connect)
            .await
            .map_err(|_| SessionError::ConnectTimeout {
                address: address.clone(),
                timeout: target.timeout,
            })?
            .map_err(|e| SessionError::Connect {
                address,
                reason: e.to_string(),
            })
    }
}

async fn authenticate(
    handle: &mut Handle<DeviceHandler>,
    auth: &AuthMethod,
    address: &str,
) -> SessionResult<()> {
    let accepted = match auth {
        AuthMethod::Password { username, password } => {
            handle
                .authenticate_password(username.as_str(), password.expose_secret())
                .await
        }
        AuthMethod::PublicKey { username, key } => {
            handle
                .authenticate_publickey(username.as_str(), Arc::clone(key))
                .await
        }
    }
    .map_err(|e| SessionError::Connect {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    if accepted {
        Ok(())
    } else {
        Err(SessionError::AuthenticationFailed {
            username: auth.username().to_string(),
            address: address.to_string(),
        })
    }
}

async fn open_shell(handle: &Handle<DeviceHandler>, address: &str) -> SessionResult<Channel<Msg>> {
    let channel_error = |e: russh::Error| SessionError::Channel {
        address: address.to_string(),
        reason: e.to_string(),
    };

    let channel = handle.channel_open_session().await.map_err(channel_error)?;
    channel
        .request_pty(
            false,
            TERMINAL_TYPE,
            TERMINAL_WIDTH,
            TERMINAL_HEIGHT,
            0,
            0,
            &[(Pty::ECHO, 0), (Pty::OCRNL, 0)],
        )
        .await
        .map_err(channel_error)?;
    channel.request_shell(false).await.map_err(channel_error)?;
    Ok(channel)
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, target: &Target) -> SessionResult<Session> {
        let address = target.address();
        // dial, auth and shell setup share one budget
        let deadline = Instant::now() + target.timeout;
        let mut handle = self.dial(target, deadline).await?;

        let setup = tokio::time::timeout_at(deadline, async {
            authenticate(&mut handle, &target.auth, &address).await?;
            open_shell(&handle, &address).await
        })
        .await
        .unwrap_or_else(|_| {
            Err(SessionError::ConnectTimeout {
                address: address.clone(),
                timeout: target.timeout,
            })
        });
        let channel = match setup {
            Ok(channel) => channel,
            Err(e) => {
                let _ = handle
                    .disconnect(Disconnect::ByApplication, "", "English")
                    .await;
                return Err(e);
            }
        };

        tracing::debug!(
            target_host = %target.identity(),
            auth = target.auth.kind(),
            legacy_ciphers = target.legacy_ciphers,
            "Shell opened"
        );

        let shell = SshShell {
            handle,
            channel,
            pending: Vec::new(),
            eof: false,
        };
        Session::open(
            target.identity(),
            Box::new(shell),
            SessionOptions::for_target(target, self.prompt.clone()),
        )
        .await
    }
}
