//! Cancellable scheduled tasks.
//!
//! [`schedule`] runs a future after a delay and returns a handle that can
//! cancel it. [`Debouncer`] is one logical timer: scheduling again first
//! cancels whatever was pending, so only the latest task can ever fire.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Handle to a task started by [`schedule`]
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Cancel the task; a no-op once it has finished
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Run `task` once `delay` has elapsed
pub fn schedule<F>(delay: Duration, task: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        sleep(delay).await;
        task.await;
    });
    TaskHandle { handle }
}

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<TaskHandle>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending task with `task`, to run after the quiet period
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.take() {
            if !previous.is_finished() {
                debug!("Debounce: cancelling pending task");
            }
            previous.cancel();
        }
        *pending = Some(schedule(self.delay, task));
    }

    /// Cancel the pending task; returns whether one was still waiting
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        match pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.cancel();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.as_ref().map_or(false, |h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
