//! Single-flight execution of the privileged injection operation.
//!
//! Owns the mutual exclusion and precondition checks around the injection
//! primitive; the protocol itself lives behind the [`PayloadInjector`] port.
//! The device monitor is paused for the whole lifetime of a running
//! operation so nothing else touches the device handle.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::{AppError, InjectionState, Result};

use super::monitor::DeviceMonitor;
use super::ports::PayloadInjector;

/// Guard enforcing at most one injection operation system-wide.
pub struct InjectionGuard {
    monitor: Arc<DeviceMonitor>,
    injector: Arc<dyn PayloadInjector>,
    state: Mutex<InjectionState>,
}

/// Pauses the monitor on creation and resumes it when dropped, so resume
/// runs on every exit path of the operation, panics included.
struct CadencePause<'a> {
    monitor: &'a DeviceMonitor,
}

impl<'a> CadencePause<'a> {
    fn new(monitor: &'a DeviceMonitor) -> Self {
        monitor.pause();
        Self { monitor }
    }
}

impl Drop for CadencePause<'_> {
    fn drop(&mut self) {
        self.monitor.resume();
    }
}

impl InjectionGuard {
    /// Create a guard bound to `monitor` and the injection primitive.
    #[must_use]
    pub fn new(monitor: Arc<DeviceMonitor>, injector: Arc<dyn PayloadInjector>) -> Self {
        Self {
            monitor,
            injector,
            state: Mutex::new(InjectionState::Idle),
        }
    }

    /// Current operation state.
    #[must_use]
    pub fn state(&self) -> InjectionState {
        self.lock_state().clone()
    }

    /// Run one injection against `target`.
    ///
    /// Preconditions checked before any side effect: no operation already
    /// running, a non-empty target path, and the most recent device status
    /// in RCM. Primitive failures surface verbatim as `Failed`; there is no
    /// automatic retry.
    ///
    /// # Errors
    /// Returns a precondition rejection or the primitive's failure.
    pub async fn run(&self, target: &Path) -> Result<String> {
        {
            let mut state = self.lock_state();
            if state.is_running() {
                return Err(AppError::precondition(
                    "an injection is already running; wait for it to finish",
                ));
            }
            if target.as_os_str().is_empty() {
                return Err(AppError::precondition(
                    "no payload selected; pick one with `select` first",
                ));
            }
            let status = self.monitor.latest();
            if !status.is_recovery() {
                return Err(AppError::precondition(format!(
                    "device is not in RCM (current status: {})",
                    status.mode
                )));
            }
            *state = InjectionState::Running {
                target: target.to_path_buf(),
            };
        }

        let pause = CadencePause::new(&self.monitor);

        tracing::info!(payload = %target.display(), "starting injection");
        let injector = Arc::clone(&self.injector);
        let payload = target.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || injector.inject(&payload)).await;
        let outcome = match outcome {
            Ok(result) => result,
            Err(e) => Err(AppError::operation(format!("injector task aborted: {e}"))),
        };

        drop(pause);

        let mut state = self.lock_state();
        match &outcome {
            Ok(message) => {
                tracing::info!("injection succeeded");
                *state = InjectionState::Succeeded {
                    message: message.clone(),
                };
            }
            Err(e) => {
                tracing::error!(error = %e, "injection failed");
                *state = InjectionState::Failed {
                    error: e.to_string(),
                };
            }
        }

        outcome
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, InjectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
