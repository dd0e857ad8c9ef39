//! Last known status per device.
//!
//! The cache is the single place decoded statuses land, whether they came
//! from a poll or a push. Every update carries a sequence number; an update
//! whose sequence is not newer than the stored one is dropped, so late or
//! duplicated deliveries never overwrite fresher state.
//!
//! # Observers
//!
//! Observers run synchronously on the updating task, after the new status is
//! stored and in sequence order. An observer may read the cache (including
//! [`DeviceStateCache::current`] for its own device) and register further
//! observers, but must not call [`DeviceStateCache::update`] for the device
//! it is observing. A slow observer delays the ones after it.
//!
//! ```
//! use sesame_core::{DeviceId, MechanicalStatus};
//! use sesame_device::cache::DeviceStateCache;
//!
//! let cache = DeviceStateCache::new();
//! let device = DeviceId::random();
//! let status = MechanicalStatus::new(6.0, 100.0, 0, true, false);
//!
//! assert!(cache.update(device, status, 2));
//! assert!(!cache.update(device, status, 1)); // stale
//! assert_eq!(cache.current(&device), Some(status));
//! ```

use crate::StatusSnapshot;
use crate::sync::{lock, read, write};
use chrono::Utc;
use sesame_core::{DeviceId, MechanicalStatus};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace};

/// Callback invoked with every accepted status.
pub type Observer = Arc<dyn Fn(&MechanicalStatus) + Send + Sync>;

#[derive(Default)]
struct Slot {
    state: Mutex<Option<StatusSnapshot>>,
    observers: Mutex<Vec<Observer>>,
    // Held from the sequence check until the last observer returns.
    notify: Mutex<()>,
}

/// Thread-safe per-device status cache.
#[derive(Default)]
pub struct DeviceStateCache {
    slots: RwLock<HashMap<DeviceId, Arc<Slot>>>,
}

impl DeviceStateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, device: DeviceId) -> Arc<Slot> {
        if let Some(slot) = read(&self.slots).get(&device) {
            return Arc::clone(slot);
        }
        Arc::clone(write(&self.slots).entry(device).or_default())
    }

    fn existing_slot(&self, device: &DeviceId) -> Option<Arc<Slot>> {
        read(&self.slots).get(device).map(Arc::clone)
    }

    /// Store `status` if `sequence` is newer than the stored one.
    ///
    /// Returns `true` if the status was applied, in which case every
    /// observer of the device has been called with it before this returns.
    pub fn update(&self, device: DeviceId, status: MechanicalStatus, sequence: u64) -> bool {
        let slot = self.slot(device);
        let _order = lock(&slot.notify);

        {
            let mut state = lock(&slot.state);
            if let Some(current) = state.as_ref()
                && sequence <= current.sequence
            {
                trace!(
                    "Dropping stale status for {} (sequence {} <= {})",
                    device, sequence, current.sequence
                );
                return false;
            }
            *state = Some(StatusSnapshot {
                status,
                sequence,
                updated_at: Utc::now(),
            });
        }

        let observers = lock(&slot.observers).clone();
        for observer in &observers {
            observer(&status);
        }

        true
    }

    /// Latest status for `device`, if one was ever recorded.
    pub fn current(&self, device: &DeviceId) -> Option<MechanicalStatus> {
        self.snapshot(device).map(|snapshot| snapshot.status)
    }

    /// Latest status with its sequence number and update time.
    pub fn snapshot(&self, device: &DeviceId) -> Option<StatusSnapshot> {
        let slot = self.existing_slot(device)?;
        let state = lock(&slot.state);
        *state
    }

    /// Register a callback for every future accepted update of `device`.
    pub fn observe<F>(&self, device: DeviceId, callback: F)
    where
        F: Fn(&MechanicalStatus) + Send + Sync + 'static,
    {
        let slot = self.slot(device);
        lock(&slot.observers).push(Arc::new(callback));
    }

    /// Number of observers registered for `device`.
    pub fn observer_count(&self, device: &DeviceId) -> usize {
        self.existing_slot(device)
            .map(|slot| lock(&slot.observers).len())
            .unwrap_or(0)
    }

    /// Drop everything held for `device`, observers included.
    ///
    /// Returns `true` if the device had an entry.
    pub fn remove(&self, device: &DeviceId) -> bool {
        let removed = write(&self.slots).remove(device).is_some();
        if removed {
            debug!("Removed cached state for {}", device);
        }
        removed
    }

    /// Forget the stored status for `device` but keep its observers.
    ///
    /// An entry left with no observers is dropped entirely.
    pub fn clear_state(&self, device: &DeviceId) {
        let mut slots = write(&self.slots);
        let Some(slot) = slots.get(device) else {
            return;
        };
        *lock(&slot.state) = None;
        if lock(&slot.observers).is_empty() {
            slots.remove(device);
        }
        debug!("Cleared cached state for {}", device);
    }

    /// Number of devices with an entry.
    pub fn len(&self) -> usize {
        read(&self.slots).len()
    }

    /// Returns `true` if no device has an entry.
    pub fn is_empty(&self) -> bool {
        read(&self.slots).is_empty()
    }
}

impl fmt::Debug for DeviceStateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceStateCache")
            .field("devices", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn status(position: u16) -> MechanicalStatus {
        MechanicalStatus::new(5.8, 50.0, position, true, false)
    }

    #[test]
    fn test_current_empty() {
        let cache = DeviceStateCache::new();
        assert_eq!(cache.current(&DeviceId::random()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_first_update_always_applies() {
        let cache = DeviceStateCache::new();
        let device = DeviceId::random();

        assert!(cache.update(device, status(1), 0));
        assert_eq!(cache.current(&device), Some(status(1)));
    }

    #[test]
    fn test_out_of_order_updates() {
        let cache = DeviceStateCache::new();
        let device = DeviceId::random();

        assert!(cache.update(device, status(1), 1));
        assert!(cache.update(device, status(3), 3));
        assert!(!cache.update(device, status(2), 2));

        let snapshot = cache.snapshot(&device).unwrap();
        assert_eq!(snapshot.status, status(3));
        assert_eq!(snapshot.sequence, 3);
    }

    #[test]
    fn test_duplicate_sequence_dropped() {
        let cache = DeviceStateCache::new();
        let device = DeviceId::random();

        assert!(cache.update(device, status(1), 5));
        assert!(!cache.update(device, status(9), 5));
        assert_eq!(cache.current(&device), Some(status(1)));
    }

    #[test]
    fn test_observers_see_only_applied_updates() {
        let cache = DeviceStateCache::new();
        let device = DeviceId::random();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        cache.observe(device, move |s| sink.lock().unwrap().push(s.position()));

        cache.update(device, status(1), 1);
        cache.update(device, status(3), 3);
        cache.update(device, status(2), 2);

        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_multiple_observers_each_called_once() {
        let cache = DeviceStateCache::new();
        let device = DeviceId::random();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            cache.observe(device, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(cache.observer_count(&device), 3);

        cache.update(device, status(1), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_observer_can_read_cache() {
        let cache = Arc::new(DeviceStateCache::new());
        let device = DeviceId::random();
        let seen = Arc::new(Mutex::new(None));

        let reader = Arc::clone(&cache);
        let sink = Arc::clone(&seen);
        cache.observe(device, move |_| {
            *sink.lock().unwrap() = reader.current(&device);
        });

        cache.update(device, status(7), 1);
        assert_eq!(*seen.lock().unwrap(), Some(status(7)));
    }

    #[test]
    fn test_devices_are_independent() {
        let cache = DeviceStateCache::new();
        let (a, b) = (DeviceId::random(), DeviceId::random());

        assert!(cache.update(a, status(1), 10));
        assert!(cache.update(b, status(2), 1));

        assert_eq!(cache.current(&a), Some(status(1)));
        assert_eq!(cache.current(&b), Some(status(2)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_remove_drops_state_and_observers() {
        let cache = DeviceStateCache::new();
        let device = DeviceId::random();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        cache.observe(device, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        cache.update(device, status(1), 1);

        assert!(cache.remove(&device));
        assert!(!cache.remove(&device));
        assert_eq!(cache.current(&device), None);
        assert_eq!(cache.observer_count(&device), 0);

        // A re-added device starts fresh, so a low sequence is accepted.
        assert!(cache.update(device, status(2), 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_state_keeps_observers() {
        let cache = DeviceStateCache::new();
        let observed = DeviceId::random();
        let bare = DeviceId::random();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        cache.observe(observed, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        cache.update(observed, status(1), 5);
        cache.update(bare, status(1), 5);

        cache.clear_state(&observed);
        cache.clear_state(&bare);

        assert_eq!(cache.current(&observed), None);
        assert_eq!(cache.observer_count(&observed), 1);
        assert_eq!(cache.len(), 1);

        assert!(cache.update(observed, status(2), 1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_observer_does_not_wedge_device() {
        let cache = Arc::new(DeviceStateCache::new());
        let device = DeviceId::random();
        cache.observe(device, |s| {
            if s.position() == 1 {
                panic!("observer failure");
            }
        });

        let worker = Arc::clone(&cache);
        let result = std::thread::spawn(move || worker.update(device, status(1), 1)).join();
        assert!(result.is_err());

        assert!(cache.update(device, status(2), 2));
        assert_eq!(cache.current(&device), Some(status(2)));
    }

    #[test]
    fn test_concurrent_updates_keep_highest_sequence() {
        let cache = Arc::new(DeviceStateCache::new());
        let device = DeviceId::random();

        let handles: Vec<_> = (1..=16u16)
            .map(|seq| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.update(device, status(seq), u64::from(seq));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.snapshot(&device).unwrap().sequence, 16);
        assert_eq!(cache.current(&device), Some(status(16)));
    }
}
