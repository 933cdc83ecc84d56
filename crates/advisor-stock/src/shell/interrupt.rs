//! Ctrl-C routing between a foreground alert wait and the rest of the session

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

struct InterruptState {
    /// Bumped once per interrupt a foreground wait accepted
    delivered: watch::Sender<u64>,
    /// Number of foreground waits in progress
    waiting: AtomicUsize,
}

/// Shared interrupt switch
///
/// One signal listener calls [`Interrupts::deliver`] per Ctrl-C. While the
/// shell waits on an alert in the foreground the interrupt cancels that wait;
/// otherwise `deliver` returns `false` and the listener ends the session.
#[derive(Clone)]
pub struct Interrupts {
    inner: Arc<InterruptState>,
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupts {
    pub fn new() -> Self {
        let (delivered, _) = watch::channel(0);
        Self {
            inner: Arc::new(InterruptState {
                delivered,
                waiting: AtomicUsize::new(0),
            }),
        }
    }

    /// Hand one interrupt to a foreground wait; `false` if nothing is waiting
    pub fn deliver(&self) -> bool {
        if self.inner.waiting.load(Ordering::SeqCst) == 0 {
            return false;
        }
        self.inner.delivered.send_modify(|count| *count += 1);
        true
    }

    /// Mark a foreground wait until the returned guard is dropped
    pub(crate) fn foreground(&self) -> ForegroundWait {
        // A fresh receiver has already seen the current count
        let delivered = self.inner.delivered.subscribe();
        self.inner.waiting.fetch_add(1, Ordering::SeqCst);
        ForegroundWait {
            interrupts: self.clone(),
            delivered,
        }
    }
}

pub(crate) struct ForegroundWait {
    interrupts: Interrupts,
    delivered: watch::Receiver<u64>,
}

impl ForegroundWait {
    /// Resolves at the first interrupt delivered after the wait began
    pub(crate) async fn interrupted(&mut self) {
        if self.delivered.changed().await.is_err() {
            // The sender lives as long as `interrupts`, so this never resolves
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for ForegroundWait {
    fn drop(&mut self) {
        self.interrupts.inner.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}
