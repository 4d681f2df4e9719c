//! Injection operation state.

use std::path::PathBuf;

/// Lifecycle of the single system-wide injection operation.
///
/// `Idle → Running → {Succeeded, Failed}`; a finished operation is replaced
/// by the next `Running` transition. Exactly one operation exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InjectionState {
    /// No operation has run, or the previous one finished.
    #[default]
    Idle,
    /// The privileged operation is executing against `target`.
    Running {
        /// Payload being delivered.
        target: PathBuf,
    },
    /// The primitive reported success.
    Succeeded {
        /// Message reported by the primitive.
        message: String,
    },
    /// The primitive reported failure; never retried automatically.
    Failed {
        /// Error reported by the primitive.
        error: String,
    },
}

impl InjectionState {
    /// Whether the operation is currently executing.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl std::fmt::Display for InjectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { target } => write!(f, "running ({})", target.display()),
            Self::Succeeded { message } => write!(f, "succeeded: {message}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}
