//! Script-side fault diagnostics.

use std::fmt;

/// An error raised inside the script runtime. Carries the diagnostic text
/// the faulting call produced; the bridge wraps it when crossing back to the
/// host.
#[derive(Debug, Clone)]
pub struct ScriptError {
    message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ScriptError {}
