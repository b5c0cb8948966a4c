//! Command/response exchange over an interactive shell

use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;

use super::PromptMatcher;
use crate::error::{SessionError, SessionResult};
use crate::models::Target;

/// Command that disables output paging on the device
pub const PAGER_DISABLE_COMMAND: &str = "terminal length 0";

/// Byte stream of an interactive shell
///
/// Implemented by the SSH channel and by in-memory shells in
/// [`crate::testing`].
#[async_trait]
pub trait ShellChannel: Send {
    /// Writes all bytes to the shell
    async fn send(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// Reads at most `buf.len()` bytes, returning `0` at end of stream
    ///
    /// Must be cancel-safe: bytes not yet returned survive a dropped call.
    async fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Releases the shell and its connection
    async fn close(&mut self) -> std::io::Result<()>;
}

/// Per-session limits
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Limit for each command
    pub timeout: Duration,
    /// Maximum bytes consumed per read
    pub batch_size: usize,
    /// Prompt used to detect completion
    pub prompt: PromptMatcher,
}

impl SessionOptions {
    /// Takes timeout and batch size from the target
    #[must_use]
    pub fn for_target(target: &Target, prompt: PromptMatcher) -> Self {
        Self {
            timeout: target.timeout,
            batch_size: target.batch_size,
            prompt,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            batch_size: 10_000,
            prompt: PromptMatcher::default(),
        }
    }
}

/// An open, primed shell on one device
///
/// Commands are strictly sequential: `run` takes `&mut self`.
pub struct Session {
    identity: String,
    channel: Box<dyn ShellChannel>,
    prompt: PromptMatcher,
    timeout: Duration,
    read_buf: Vec<u8>,
    closed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("timeout", &self.timeout)
            .field("batch_size", &self.read_buf.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wraps a shell channel and primes it
    ///
    /// Sends an empty line to sync on the first prompt, then disables paging.
    /// A priming command that times out is logged and skipped; a dead
    /// channel closes the session and fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell closes or fails during priming.
    pub async fn open(
        identity: impl Into<String>,
        channel: Box<dyn ShellChannel>,
        options: SessionOptions,
    ) -> SessionResult<Self> {
        let mut session = Self {
            identity: identity.into(),
            channel,
            prompt: options.prompt,
            timeout: options.timeout,
            read_buf: vec![0; options.batch_size.max(1)],
            closed: false,
        };

        for command in ["", PAGER_DISABLE_COMMAND] {
            match session.run(command).await {
                Ok(_) => {}
                Err(e) if e.is_timeout() => {
                    tracing::debug!(
                        target_host = %session.identity,
                        command,
                        "Priming command timed out"
                    );
                }
                Err(e) => {
                    session.close().await;
                    return Err(e);
                }
            }
        }

        Ok(session)
    }

    /// Target identity this session belongs to
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether `close` has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Sends one command and returns its full output
    ///
    /// The output includes the command echo and the trailing prompt, with
    /// carriage returns removed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Timeout` if the write and the complete response
    /// do not finish within the session timeout, `SessionError::EndOfStream` if the device hangs up, or an I/O
    /// error from the channel.
    pub async fn run(&mut self, command: &str) -> SessionResult<String> {
        if self.closed {
            return Err(SessionError::EndOfStream);
        }

        self.discard_stale_output();
        let timeout = self.timeout;
        tokio::time::timeout(timeout, self.exchange(command))
            .await
            .map_err(|_| SessionError::Timeout {
                command: command.to_string(),
                timeout,
            })?
    }

    /// Drops bytes already buffered, such as a late reply to a timed-out command
    fn discard_stale_output(&mut self) {
        let mut discarded = 0;
        while let Some(Ok(n)) = self.channel.recv(&mut self.read_buf).now_or_never() {
            if n == 0 {
                break;
            }
            discarded += n;
        }
        if discarded > 0 {
            tracing::debug!(target_host = %self.identity, bytes = discarded, "Discarded stale output");
        }
    }

    async fn exchange(&mut self, command: &str) -> SessionResult<String> {
        let line = format!("{command}\n");
        self.channel
            .send(line.as_bytes())
            .await
            .map_err(SessionError::Write)?;
        self.read_until_prompt(command).await
    }

    async fn read_until_prompt(&mut self, command: &str) -> SessionResult<String> {
        let mut output = Vec::new();
        loop {
            let n = self
                .channel
                .recv(&mut self.read_buf)
                .await
                .map_err(SessionError::Read)?;
            if n == 0 {
                return Err(SessionError::EndOfStream);
            }
            output.extend_from_slice(&self.read_buf[..n]);

            let text = String::from_utf8_lossy(&output);
            if self.prompt.is_complete(&text, command) {
                return Ok(text.replace('\r', ""));
            }
        }
    }

    /// Closes the shell within the session timeout; later calls are no-ops
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match tokio::time::timeout(self.timeout, self.channel.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(target_host = %self.identity, error = %e, "Error closing shell");
            }
            Err(_) => tracing::debug!(target_host = %self.identity, "Closing shell timed out"),
        }
    }
}
