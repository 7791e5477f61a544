//! In-flight message counter
//!
//! Every send increments the counter before the message becomes visible to
//! the target inbox, and every processed message decrements it once. The
//! program is quiescent when the count reaches zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::warn;

#[derive(Debug, Default)]
pub struct PendingCounter {
    count: AtomicUsize,
    idle: Notify,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one message finished; wakes idle waiters on the last one
    pub fn done(&self) {
        match self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| count.checked_sub(1))
        {
            Ok(1) => self.idle.notify_waiters(),
            Ok(_) => {}
            Err(_) => warn!("Pending counter decremented below zero"),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolve once no message is in flight
    pub async fn wait_idle(&self) {
        loop {
            // register before checking, or a wakeup between the two is lost
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_at_zero() {
        let counter = PendingCounter::new();
        tokio::time::timeout(Duration::from_millis(100), counter.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_idle_wakes_on_last_done() {
        let counter = Arc::new(PendingCounter::new());
        counter.increment();
        counter.increment();

        let waiter = {
            let counter = counter.clone();
            tokio::spawn(async move { counter.wait_idle().await })
        };

        counter.done();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        counter.done();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_done_never_underflows() {
        let counter = PendingCounter::new();
        counter.done();
        assert_eq!(counter.count(), 0);
    }
}
