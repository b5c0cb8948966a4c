//! Prompt detection for interactive shells
//!
//! A response is complete once the accumulated output contains the echoed
//! command and ends with the device prompt.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{SessionError, SessionResult};

/// Default prompt: a non-empty line ending in `#` and at most one whitespace
pub const DEFAULT_PROMPT_PATTERN: &str = r".+#\s?$";

static DEFAULT_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_PROMPT_PATTERN).expect("DEFAULT_PROMPT is a valid regex pattern")
});

/// Compiled prompt pattern
///
/// Cloning is cheap; the compiled regex is shared.
#[derive(Debug, Clone)]
pub struct PromptMatcher {
    regex: Arc<Regex>,
}

impl PromptMatcher {
    /// Compiles a custom prompt pattern
    ///
    /// The pattern is matched against the whole accumulated output, so it
    /// should be anchored with `$`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPrompt` if the pattern does not compile.
    pub fn new(pattern: &str) -> SessionResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| SessionError::InvalidPrompt {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            regex: Arc::new(regex),
        })
    }

    /// The source pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Checks whether the output ends at a prompt
    #[must_use]
    pub fn at_prompt(&self, output: &str) -> bool {
        self.regex.is_match(output)
    }

    /// Checks whether `output` is the complete response to `command`
    ///
    /// The command echo must be present so that a prompt left over from an
    /// earlier exchange does not end the read early.
    #[must_use]
    pub fn is_complete(&self, output: &str, command: &str) -> bool {
        output.contains(command) && self.at_prompt(output)
    }
}

impl Default for PromptMatcher {
    fn default() -> Self {
        Self {
            regex: Arc::new(DEFAULT_PROMPT.clone()),
        }
    }
}
