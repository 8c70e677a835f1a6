//! Last-sync timestamp and subscription state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time, in Unix seconds.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> u64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Whether the periodic sync is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionStatus {
    /// No periodic activity.
    #[default]
    Unsubscribed,
    /// A timer invokes the sync engine at a fixed interval.
    Subscribed,
}

/// Snapshot of the session's sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncState {
    /// High-water timestamp of the last applied batch; 0 means never synced.
    pub last_sync_timestamp: u64,
    /// Current subscription status.
    pub subscription_status: SubscriptionStatus,
}

/// Holds the last successfully applied sync timestamp.
///
/// The value starts at 0 ("never synced") and is the lower bound of the
/// next incremental fetch.
pub struct TimestampStore {
    value: AtomicU64,
    clock: Box<dyn Clock>,
}

impl TimestampStore {
    /// Creates a store at 0 using the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates a store at 0 using the given clock.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            value: AtomicU64::new(0),
            clock: Box::new(clock),
        }
    }

    /// Returns the current timestamp.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Overwrites the timestamp.
    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Moves the timestamp forward to `candidate` if it is newer.
    ///
    /// Returns the resulting timestamp.
    pub fn advance(&self, candidate: u64) -> u64 {
        let previous = self.value.fetch_max(candidate, Ordering::SeqCst);
        previous.max(candidate)
    }

    /// Sets the timestamp to the clock's current time and returns it.
    pub fn initialize(&self) -> u64 {
        let now = self.clock.now();
        self.set(now);
        now
    }

    /// Returns true once the timestamp has been set to a non-zero value.
    pub fn is_initialized(&self) -> bool {
        self.get() != 0
    }
}

impl Default for TimestampStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimestampStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampStore")
            .field("value", &self.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized() {
        let store = TimestampStore::new();
        assert_eq!(store.get(), 0);
        assert!(!store.is_initialized());
    }

    #[test]
    fn set_and_get() {
        let store = TimestampStore::new();
        store.set(42);
        assert_eq!(store.get(), 42);

        // set is a plain overwrite
        store.set(7);
        assert_eq!(store.get(), 7);
    }

    #[test]
    fn advance_is_monotonic() {
        let store = TimestampStore::new();
        assert_eq!(store.advance(150), 150);
        assert_eq!(store.advance(100), 150);
        assert_eq!(store.get(), 150);
        assert_eq!(store.advance(200), 200);
    }

    #[test]
    fn initialize_uses_clock() {
        let store = TimestampStore::with_clock(FixedClock(1_700_000_000));
        assert_eq!(store.initialize(), 1_700_000_000);
        assert_eq!(store.get(), 1_700_000_000);
        assert!(store.is_initialized());
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > 1_600_000_000);
    }

    #[test]
    fn default_status_is_unsubscribed() {
        assert_eq!(SubscriptionStatus::default(), SubscriptionStatus::Unsubscribed);
        assert_eq!(SyncState::default().last_sync_timestamp, 0);
    }
}
