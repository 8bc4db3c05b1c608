use crate::parser::ParseError;
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Result alias for errors emitted by regex-clippy internals.
pub type ClippyResult<T> = Result<T, RegexClippyError>;

/// Structured error type for regex-clippy subsystems.
#[derive(Debug, Error)]
pub enum RegexClippyError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("unknown rule: {0}")]
    UnknownRule(String),

    #[error("finding for `{rule}` no longer matches the tree: {reason}")]
    StaleFinding { rule: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl RegexClippyError {
    pub fn stale(rule: &'static str, reason: impl Into<String>) -> Self {
        Self::StaleFinding {
            rule,
            reason: reason.into(),
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Convert to anyhow::Error for interop with anyhow-based code.
    pub fn into_anyhow(self) -> AnyhowError {
        AnyhowError::new(self)
    }
}

impl From<AnyhowError> for RegexClippyError {
    fn from(err: AnyhowError) -> Self {
        RegexClippyError::other(err.to_string())
    }
}

/// Convenience macro mirroring `anyhow::bail!` but returning RegexClippyError.
#[macro_export]
macro_rules! clippy_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::RegexClippyError::other(format!($($arg)*)));
    };
}

/// Convenience macro mirroring `anyhow::ensure!`.
#[macro_export]
macro_rules! clippy_ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::clippy_bail!($($arg)*);
        }
    };
}
