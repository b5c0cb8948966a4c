//! In-memory shells for exercising sessions and collectors without a device.
//!
//! [`ShellScript`] describes how a fake device answers each command.
//! [`ScriptedShell`] plays a script as a [`ShellChannel`], and
//! [`ScriptedConnector`] hands out primed sessions per target identity.
//! [`IoChannel`] adapts any tokio byte stream, such as a `duplex` pair.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{SessionError, SessionResult};
use crate::models::Target;
use crate::transport::{Connector, PromptMatcher, Session, SessionOptions, ShellChannel};

/// Commands received by a fake device, in order
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CommandLog {
    fn push(&self, command: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    /// All commands seen so far
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How often a command was sent
    #[must_use]
    pub fn count(&self, command: &str) -> usize {
        self.commands().iter().filter(|c| *c == command).count()
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Raw(Vec<u8>),
    Hang,
    HangUp,
}

/// How a fake device answers commands
///
/// Unknown commands get an empty response followed by the prompt.
#[derive(Debug, Clone)]
pub struct ShellScript {
    hostname: String,
    replies: HashMap<String, Reply>,
    log: CommandLog,
    closes: Arc<AtomicUsize>,
}

impl ShellScript {
    /// Creates a script for a device whose prompt is `<hostname>#`
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            replies: HashMap::new(),
            log: CommandLog::default(),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answers `command` with `output` and the prompt
    #[must_use]
    pub fn respond(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.replies
            .insert(command.into(), Reply::Text(output.into()));
        self
    }

    /// Answers `command` with raw bytes and no prompt
    #[must_use]
    pub fn respond_raw(mut self, command: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.replies.insert(command.into(), Reply::Raw(bytes.into()));
        self
    }

    /// Never answers `command`
    #[must_use]
    pub fn hang(mut self, command: impl Into<String>) -> Self {
        self.replies.insert(command.into(), Reply::Hang);
        self
    }

    /// Closes the stream when `command` arrives
    #[must_use]
    pub fn hang_up(mut self, command: impl Into<String>) -> Self {
        self.replies.insert(command.into(), Reply::HangUp);
        self
    }

    /// Log shared by every shell played from this script
    #[must_use]
    pub fn command_log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Counter of `close` calls across shells played from this script
    #[must_use]
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

/// A fake device shell
#[derive(Debug)]
pub struct ScriptedShell {
    script: ShellScript,
    pending: Vec<u8>,
    eof: bool,
}

impl ScriptedShell {
    /// Plays a script
    #[must_use]
    pub const fn new(script: ShellScript) -> Self {
        Self {
            script,
            pending: Vec::new(),
            eof: false,
        }
    }
}

#[async_trait]
impl ShellChannel for ScriptedShell {
    async fn send(&mut self, data: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(data);
        for command in text.split_terminator('\n') {
            self.script.log.push(command.to_string());
            match self.script.replies.get(command) {
                Some(Reply::Hang) => {}
                Some(Reply::HangUp) => self.eof = true,
                Some(Reply::Raw(bytes)) => {
                    self.pending.extend_from_slice(command.as_bytes());
                    self.pending.extend_from_slice(b"\r\n");
                    self.pending.extend_from_slice(bytes);
                }
                Some(Reply::Text(output)) => {
                    let body = output.replace('\n', "\r\n");
                    let reply = format!("{command}\r\n{body}\r\n{}#", self.script.hostname);
                    self.pending.extend_from_slice(reply.as_bytes());
                }
                None => {
                    let reply = format!("{command}\r\n{}#", self.script.hostname);
                    self.pending.extend_from_slice(reply.as_bytes());
                }
            }
        }
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pending.is_empty() {
            if self.eof {
                return Ok(0);
            }
            return std::future::pending().await;
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.script.closes.fetch_add(1, Ordering::SeqCst);
        self.eof = true;
        Ok(())
    }
}

/// Adapts a tokio byte stream into a shell channel
#[derive(Debug)]
pub struct IoChannel<T> {
    io: T,
}

impl<T> IoChannel<T> {
    /// Wraps a stream
    pub const fn new(io: T) -> Self {
        Self { io }
    }
}

#[async_trait]
impl<T> ShellChannel for IoChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.io.write_all(data).await?;
        self.io.flush().await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.io.read(buf).await
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.io.shutdown().await
    }
}

/// Behavior of a target behind a [`ScriptedConnector`]
#[derive(Debug, Clone)]
pub enum FakeDevice {
    /// Connection attempts fail
    Unreachable,
    /// Connections play this script
    Shell(ShellScript),
}

/// Connector backed by scripted devices keyed by target identity
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    devices: HashMap<String, FakeDevice>,
    prompt: PromptMatcher,
    connects: AtomicUsize,
    attempted: Mutex<HashSet<String>>,
}

impl ScriptedConnector {
    /// Creates a connector with no devices
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device
    #[must_use]
    pub fn with_device(mut self, identity: impl Into<String>, device: FakeDevice) -> Self {
        self.devices.insert(identity.into(), device);
        self
    }

    /// Number of connect calls
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Whether a target identity was dialed
    #[must_use]
    pub fn attempted(&self, identity: &str) -> bool {
        self.attempted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identity)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, target: &Target) -> SessionResult<Session> {
        let identity = target.identity();
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.attempted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.clone());

        match self.devices.get(&identity) {
            Some(FakeDevice::Shell(script)) => {
                let shell = ScriptedShell::new(script.clone());
                Session::open(
                    identity,
                    Box::new(shell),
                    SessionOptions::for_target(target, self.prompt.clone()),
                )
                .await
            }
            Some(FakeDevice::Unreachable) | None => Err(SessionError::Connect {
                address: target.address(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}
