//! Device presence monitoring.
//!
//! Polls the scan primitive on a fixed cadence and publishes the latest
//! status through a watch channel. The cadence can be paused and resumed;
//! an injection in flight pauses it for its whole lifetime so the device
//! handle is never touched from two places at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::domain::{DeviceStatus, Result};

use super::ports::DeviceScanner;

/// Periodic device monitor. All state is interior; share it with `Arc`.
pub struct DeviceMonitor {
    scanner: Arc<dyn DeviceScanner>,
    poll_interval: Duration,
    status: watch::Sender<DeviceStatus>,
    paused: watch::Sender<bool>,
}

impl DeviceMonitor {
    /// Create a monitor polling `scanner` every `poll_interval`.
    #[must_use]
    pub fn new(scanner: Arc<dyn DeviceScanner>, poll_interval: Duration) -> Self {
        let (status, _) = watch::channel(DeviceStatus::absent());
        let (paused, _) = watch::channel(false);
        Self {
            scanner,
            poll_interval,
            status,
            paused,
        }
    }

    /// The most recently observed status.
    #[must_use]
    pub fn latest(&self) -> DeviceStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DeviceStatus> {
        self.status.subscribe()
    }

    /// Whether the cadence is currently suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Suspend the polling cadence.
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    /// Resume the polling cadence. The timer restarts from the resume
    /// point; an immediate poll only happens via an explicit `poll_once`.
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Poll the scanner once. On success the shared status is replaced
    /// wholesale; on failure the prior status stays untouched and the
    /// scanner's transient error is returned.
    pub fn poll_once(&self) -> Result<DeviceStatus> {
        match self.scanner.scan() {
            Ok(status) => {
                self.status.send_replace(status.clone());
                Ok(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "device poll failed; keeping last status");
                Err(e)
            }
        }
    }

    /// Drive the repeating poll until the task is dropped. While paused the
    /// loop parks without scanning and the interval is reset on resume.
    pub async fn run(self: Arc<Self>) {
        let mut paused = self.paused.subscribe();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if *paused.borrow_and_update() {
                loop {
                    if paused.changed().await.is_err() {
                        return;
                    }
                    if !*paused.borrow_and_update() {
                        break;
                    }
                }
                ticker.reset();
                continue;
            }

            // Transient failures are already logged; the cadence retries.
            let _ = self.poll_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::domain::{AppError, DeviceIdentity};

    struct CountingScanner {
        scans: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingScanner {
        fn new() -> Self {
            Self {
                scans: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn count(&self) -> usize {
            self.scans.load(Ordering::SeqCst)
        }
    }

    impl DeviceScanner for CountingScanner {
        fn scan(&self) -> Result<DeviceStatus> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(AppError::transient("usb enumeration failed"))
            } else {
                Ok(DeviceStatus::recovery(None))
            }
        }

        fn list_devices(&self) -> Result<Vec<DeviceIdentity>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_poll_failure_keeps_last_status() {
        let scanner = Arc::new(CountingScanner::new());
        let monitor = DeviceMonitor::new(scanner.clone(), Duration::from_millis(20));

        monitor.poll_once().unwrap();
        assert!(monitor.latest().is_recovery());

        scanner.fail.store(true, Ordering::SeqCst);
        let err = monitor.poll_once().unwrap_err();
        assert!(matches!(err, AppError::TransientDevice { .. }));
        assert!(monitor.latest().is_recovery(), "status must stay unchanged");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_suspends_cadence() {
        let scanner = Arc::new(CountingScanner::new());
        let monitor = Arc::new(DeviceMonitor::new(
            scanner.clone(),
            Duration::from_millis(20),
        ));

        let task = tokio::spawn(Arc::clone(&monitor).run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(scanner.count() > 0);

        monitor.pause();
        assert!(monitor.is_paused());
        tokio::time::sleep(Duration::from_millis(5)).await;
        let while_paused = scanner.count();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(scanner.count(), while_paused, "no polls while paused");

        monitor.resume();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(scanner.count() > while_paused, "cadence resumes");

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_restarts_timer_without_immediate_poll() {
        let scanner = Arc::new(CountingScanner::new());
        let monitor = Arc::new(DeviceMonitor::new(
            scanner.clone(),
            Duration::from_millis(100),
        ));

        let task = tokio::spawn(Arc::clone(&monitor).run());
        tokio::time::sleep(Duration::from_millis(10)).await;
        monitor.pause();
        // Long enough for the cadence to observe the pause and park.
        tokio::time::sleep(Duration::from_millis(140)).await;
        let while_paused = scanner.count();

        monitor.resume();
        // Half an interval after resuming: the restarted timer has not
        // fired yet, so no immediate poll.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(scanner.count(), while_paused);
        // After a full interval the cadence fires again.
        tokio::time::sleep(Duration::from_millis(110)).await;
        assert!(scanner.count() > while_paused);

        task.abort();
    }
}
