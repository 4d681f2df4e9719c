//! External injector adapter.
//!
//! The RCM delivery protocol stays outside this tool; injection is
//! delegated to a user-configured helper program invoked with the payload
//! path as its only argument. Exit status and output map onto the
//! operation outcome verbatim.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::application::PayloadInjector;
use crate::domain::{AppError, Result};

/// Injector that shells out to an external delivery program.
pub struct CommandInjector {
    command: PathBuf,
}

impl CommandInjector {
    /// Create an injector invoking `command`.
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PayloadInjector for CommandInjector {
    fn inject(&self, payload: &Path) -> Result<String> {
        tracing::debug!(
            command = %self.command.display(),
            payload = %payload.display(),
            "invoking external injector"
        );

        let output = Command::new(&self.command)
            .arg(payload)
            .output()
            .map_err(|e| {
                AppError::operation_with(
                    format!("failed to launch injector {}", self.command.display()),
                    e,
                )
            })?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if stdout.is_empty() {
                Ok("payload delivered".to_string())
            } else {
                Ok(stdout)
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                "no output".to_string()
            } else {
                stderr
            };
            Err(AppError::operation(format!(
                "injector exited with {}: {detail}",
                output.status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_successful_exit_maps_to_message() {
        let injector = CommandInjector::new("true");
        let message = injector.inject(Path::new("payload.bin")).unwrap();
        assert_eq!(message, "payload delivered");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_exit_maps_to_operation_error() {
        let injector = CommandInjector::new("false");
        let err = injector.inject(Path::new("payload.bin")).unwrap_err();
        assert!(matches!(err, AppError::Operation { .. }));
    }

    #[test]
    fn test_missing_program_is_operation_error() {
        let injector = CommandInjector::new("/nonexistent/injector");
        let err = injector.inject(Path::new("payload.bin")).unwrap_err();
        assert!(matches!(err, AppError::Operation { .. }));
    }
}
