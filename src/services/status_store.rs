use std::sync::Mutex;

use tokio::sync::watch;
use tracing::debug;

use crate::models::subscription::SubscriptionStatus;

/// Identifies the session lifetime a write belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Holds the most recent subscription status, observable by the display.
///
/// Writers pass the generation they were started under; once the store is
/// invalidated those writes are dropped.
pub struct StatusStore {
    tx: watch::Sender<Option<SubscriptionStatus>>,
    generation: Mutex<u64>,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            generation: Mutex::new(0),
        }
    }

    pub fn current_generation(&self) -> Generation {
        Generation(*self.lock_generation())
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        *self.lock_generation() == generation.0
    }

    pub fn get(&self) -> Option<SubscriptionStatus> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SubscriptionStatus>> {
        self.tx.subscribe()
    }

    /// Overwrite the status. Returns false when the generation is stale.
    pub fn write(&self, generation: Generation, status: SubscriptionStatus) -> bool {
        let current = self.lock_generation();
        if *current != generation.0 {
            debug!(
                stale = generation.0,
                current = *current,
                "Discarding subscription status from a torn-down session"
            );
            return false;
        }
        self.tx.send_replace(Some(status));
        true
    }

    /// Invalidate all outstanding writers
    pub fn invalidate(&self) -> Generation {
        let mut current = self.lock_generation();
        *current += 1;
        Generation(*current)
    }

    fn lock_generation(&self) -> std::sync::MutexGuard<'_, u64> {
        // The guarded value is a plain counter, so a poisoned lock is still usable
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
