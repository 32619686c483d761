//! Shutdown signalling for the engine loops.

use tokio::sync::watch;

/// Create a connected trigger/signal pair.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

/// Owner side: fires the shutdown once.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    /// A new signal observing this trigger.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal(self.0.subscribe())
    }
}

/// Loop side: observed by every engine loop.
///
/// Dropping the trigger counts as a shutdown too.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown has been requested. Cancel-safe.
    pub async fn triggered(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_wakes_all_signals() {
        let (trigger, mut a) = channel();
        let mut b = trigger.subscribe();
        assert!(!a.is_triggered());

        trigger.trigger();

        a.triggered().await;
        b.triggered().await;
        assert!(a.is_triggered());
    }

    #[tokio::test]
    async fn dropped_trigger_releases_waiters() {
        let (trigger, mut signal) = channel();
        drop(trigger);
        tokio::time::timeout(Duration::from_secs(1), signal.triggered())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pending_until_triggered() {
        let (_trigger, mut signal) = channel();
        let waited = tokio::time::timeout(Duration::from_secs(60), signal.triggered()).await;
        assert!(waited.is_err());
    }
}
