//! Cooperative cancellation plumbing (spec §5, §9: "a single cancellation
//! source per run, propagated to every node task").
//!
//! The teacher's dependency set carries plain `tokio` without
//! `tokio-util`, so this is a small hand-rolled token rather than
//! `tokio_util::sync::CancellationToken`: an `Arc`-shared atomic flag plus
//! a `tokio::sync::Notify` so waiters can `await` instead of polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable cancellation signal. All clones observe the same
/// underlying flag — firing one fires all of them.
#[derive(Clone, Debug)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSignal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Fires cancellation. Idempotent; safe to call from multiple tasks.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`Self::cancel`] has been called. A no-op await if
    /// already cancelled.
    ///
    /// Registers the `Notified` future *before* re-checking the flag, per
    /// `Notify`'s documented race-free pattern: if `cancel` ran between the
    /// first check and the future's construction, `notify_waiters` would
    /// otherwise fire with no waiter registered and this call would hang
    /// forever even though cancellation already happened.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let signal = CancellationSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        assert!(!signal.is_cancelled());
        signal.cancel();
        handle.await.unwrap();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let a = CancellationSignal::new();
        let b = a.clone();
        a.cancel();
        assert!(b.is_cancelled());
    }
}
