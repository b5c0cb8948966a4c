//! Interactive shell transport
//!
//! A [`Connector`] turns a [`Target`] into a primed [`Session`]. Sessions
//! exchange one command at a time and detect completion by watching for the
//! device prompt.

mod prompt;
mod session;
mod ssh;

pub use prompt::{DEFAULT_PROMPT_PATTERN, PromptMatcher};
pub use session::{PAGER_DISABLE_COMMAND, Session, SessionOptions, ShellChannel};
pub use ssh::{SshConnector, SshProfile};

use async_trait::async_trait;

use crate::error::SessionResult;
use crate::models::Target;

/// Opens sessions to targets
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dials, authenticates, opens a shell and primes it
    ///
    /// # Errors
    ///
    /// Returns an error when the target cannot be reached or rejects the
    /// credentials.
    async fn connect(&self, target: &Target) -> SessionResult<Session>;
}
