//! Completion signal - lets tasks block until a timer finishes

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wakes every waiter when a timer completes.
///
/// A waiter is registered the moment [`wait`](Self::wait) is called, not when
/// the returned future is first polled, so a signal fired in between is not
/// lost. Signals fired before `wait` are not remembered.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    /// Bumped on every signal
    generation: Arc<watch::Sender<u64>>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            generation: Arc::new(sender),
        }
    }

    /// Wait for the next signal.
    ///
    /// Only a [`signal_all`](Self::signal_all) releases the waiter; dropping
    /// every other handle to the signal does not.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let generation = Arc::clone(&self.generation);
        let mut receiver = generation.subscribe();
        async move {
            // `generation` keeps a sender alive, so this only returns on a change
            let _ = receiver.changed().await;
            drop(generation);
        }
    }

    /// Wait for the next signal, giving up after `limit`.
    ///
    /// Returns true if the signal arrived in time.
    pub fn wait_timeout(&self, limit: Duration) -> impl Future<Output = bool> + Send + 'static {
        let waiter = self.wait();
        async move { tokio::time::timeout(limit, waiter).await.is_ok() }
    }

    /// Wake all current waiters
    pub fn signal_all(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    /// Number of signals sent so far
    pub fn signal_count(&self) -> u64 {
        *self.generation.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_waiter_registered_before_poll() {
        let signal = CompletionSignal::new();
        let waiter = signal.wait();
        signal.signal_all();

        assert!(tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_does_not_release_waiter() {
        let signal = CompletionSignal::new();
        let waiter = signal.wait();
        drop(signal);

        assert!(tokio::time::timeout(Duration::from_secs(60), waiter)
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_signal() {
        let signal = CompletionSignal::new();
        assert!(!signal.wait_timeout(Duration::from_secs(5)).await);
        assert_eq!(signal.signal_count(), 0);
    }
}
