use std::{future::Future, time::Duration};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Quiescence window before a suggestion lookup fires.
pub const SUGGESTION_WINDOW: Duration = Duration::from_millis(300);

/// Runs only the last job scheduled within a quiescence window.
///
/// Scheduling a job cancels the previous one if its timer has not fired
/// yet. A job whose timer already fired runs to completion.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, timer: Mutex::new(None) }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Detach so a later `schedule` cannot abort a job that already started.
            tokio::spawn(job);
        });

        if let Some(previous) = self.timer.lock().replace(timer) {
            previous.abort();
        }
    }

    /// Drop the pending job, if its timer has not fired.
    pub fn cancel(&self) {
        if let Some(previous) = self.timer.lock().take() {
            previous.abort();
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SUGGESTION_WINDOW)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
