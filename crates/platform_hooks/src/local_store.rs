//! Durable key/value store with per-entry expiry, mirrored in memory.
//!
//! Every entry is stored as JSON text `{"value":…,"timestamp":…,"expiry":…}` under its key.
//! Expired entries are purged lazily when the store is (re)loaded and eagerly by a one-shot
//! timer scheduled when the entry is written.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    rc::{Rc, Weak},
};

use leptos::logging;
use platform_host::{Clock, HostServices, KeyValueStore, ListenerSet, Scheduler, Subscription};
use serde::{Deserialize, Serialize};

use crate::HookError;

const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One persisted entry.
pub struct StoredEntry {
    /// Stored value; `null` entries written by other code are kept as `None`.
    pub value: Option<String>,
    /// Write time, epoch milliseconds.
    pub timestamp: u64,
    /// Expiry time, epoch milliseconds; `None` means no TTL.
    pub expiry: Option<u64>,
}

impl StoredEntry {
    /// Returns whether the entry is past its expiry at `now_ms`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expiry.is_some_and(|expiry| now_ms > expiry)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Mirror of the durable store plus the most recent failure.
pub struct LocalStoreSnapshot {
    /// Live entries by key.
    pub stored_values: BTreeMap<String, StoredEntry>,
    /// Failure of the most recent failing operation.
    pub error: Option<HookError>,
}

struct LocalInner {
    storage: Rc<dyn KeyValueStore>,
    scheduler: Rc<dyn Scheduler>,
    clock: Rc<dyn Clock>,
    state: RefCell<LocalStoreSnapshot>,
    deleted_keys: RefCell<BTreeSet<String>>,
    active: Cell<bool>,
    listeners: ListenerSet<LocalStoreSnapshot>,
}

#[derive(Clone)]
/// Key/value store over the host's durable storage area.
///
/// Keys removed through [`LocalStore::delete_key`] are remembered by this instance and never
/// re-imported by [`LocalStore::reload`], even if another context writes them back.
pub struct LocalStore {
    inner: Rc<LocalInner>,
}

impl LocalStore {
    /// Creates an inactive store with an empty mirror.
    pub fn new(
        storage: Rc<dyn KeyValueStore>,
        scheduler: Rc<dyn Scheduler>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Rc::new(LocalInner {
                storage,
                scheduler,
                clock,
                state: RefCell::default(),
                deleted_keys: RefCell::default(),
                active: Cell::new(false),
                listeners: ListenerSet::default(),
            }),
        }
    }

    /// Creates an inactive store over the bundle's durable storage.
    pub fn from_services(services: &HostServices) -> Self {
        Self::new(
            Rc::clone(&services.local_storage),
            Rc::clone(&services.scheduler),
            Rc::clone(&services.clock),
        )
    }

    /// Marks the store active and loads the mirror from storage.
    pub fn activate(&self) {
        self.inner.active.set(true);
        self.reload();
    }

    /// Marks the store inactive. Pending expiry timers keep running.
    pub fn deactivate(&self) {
        self.inner.active.set(false);
    }

    /// Rebuilds the mirror from storage, purging expired entries and skipping deleted keys.
    ///
    /// The mirror is replaced only when the loaded entries differ from it. Unparsable entries
    /// are skipped and reported as [`HookError::LocalRead`].
    pub fn reload(&self) {
        let inner = &self.inner;
        let keys = match inner.storage.keys() {
            Ok(keys) => keys,
            Err(err) => {
                logging::warn!("localStorage enumeration failed: {err}");
                self.update(|state| state.error = Some(HookError::LocalRead));
                return;
            }
        };

        let now = inner.clock.now_ms();
        let mut loaded = BTreeMap::new();
        let mut read_failed = false;
        for key in keys {
            if inner.deleted_keys.borrow().contains(&key) {
                continue;
            }
            let raw = match inner.storage.get_item(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    logging::warn!("localStorage read of {key} failed: {err}");
                    read_failed = true;
                    continue;
                }
            };
            let entry = match serde_json::from_str::<StoredEntry>(&raw) {
                Ok(entry) => entry,
                Err(err) => {
                    logging::warn!("skipping unparsable localStorage entry {key}: {err}");
                    read_failed = true;
                    continue;
                }
            };
            if entry.is_expired_at(now) {
                if let Err(err) = inner.storage.remove_item(&key) {
                    logging::warn!("purging expired localStorage entry {key} failed: {err}");
                }
                continue;
            }
            loaded.insert(key, entry);
        }

        let changed = inner.state.borrow().stored_values != loaded;
        if changed || read_failed {
            self.update(|state| {
                if changed {
                    state.stored_values = loaded;
                }
                if read_failed {
                    state.error = Some(HookError::LocalRead);
                }
            });
        }
    }

    /// Writes `value` under `key`; `None` persists a `null` entry. A positive `expire_in_ms`
    /// sets an expiry and schedules a timer that deletes the key once it has passed.
    pub fn set_value(&self, key: &str, value: Option<&str>, expire_in_ms: u64) {
        let inner = &self.inner;
        let now = inner.clock.now_ms();
        let entry = StoredEntry {
            value: value.map(str::to_string),
            timestamp: now,
            expiry: (expire_in_ms > 0).then(|| now.saturating_add(expire_in_ms)),
        };

        let written = serde_json::to_string(&entry)
            .map_err(|e| e.to_string())
            .and_then(|raw| inner.storage.set_item(key, &raw));
        if let Err(err) = written {
            logging::warn!("localStorage write of {key} failed: {err}");
            self.update(|state| state.error = Some(HookError::LocalWrite));
            return;
        }

        inner.deleted_keys.borrow_mut().remove(key);
        self.update(|state| {
            state.stored_values.insert(key.to_string(), entry);
            state.error = None;
        });

        if expire_in_ms > 0 {
            self.schedule_expiry(key, expire_in_ms);
        }
    }

    /// Same as [`LocalStore::set_value`].
    pub fn add_key(&self, key: &str, value: Option<&str>, expire_in_ms: u64) {
        self.set_value(key, value, expire_in_ms);
    }

    /// Removes `key` from storage and the mirror. Removing an absent key succeeds.
    pub fn clear(&self, key: &str) {
        if let Err(err) = self.inner.storage.remove_item(key) {
            logging::warn!("localStorage clear of {key} failed: {err}");
            self.update(|state| state.error = Some(HookError::LocalClear));
            return;
        }
        self.update(|state| {
            state.stored_values.remove(key);
            state.error = None;
        });
    }

    /// Removes `key` and remembers it as deleted, then reloads while active.
    ///
    /// A successful removal clears `error`; the reload may record a fresh read failure.
    pub fn delete_key(&self, key: &str) {
        let inner = &self.inner;
        if let Err(err) = inner.storage.remove_item(key) {
            logging::warn!("localStorage delete of {key} failed: {err}");
            self.update(|state| state.error = Some(HookError::LocalDelete));
            return;
        }
        inner.deleted_keys.borrow_mut().insert(key.to_string());
        self.update(|state| {
            state.stored_values.remove(key);
            state.error = None;
        });
        if inner.active.get() {
            self.reload();
        }
    }

    /// Returns the mirrored value of `key`, or `None` when absent or already expired.
    pub fn get_key(&self, key: &str) -> Option<String> {
        let now = self.inner.clock.now_ms();
        self.inner
            .state
            .borrow()
            .stored_values
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .and_then(|entry| entry.value.clone())
    }

    /// Returns the minutes elapsed since `key` was written.
    pub fn get_duration(&self, key: &str) -> Option<f64> {
        let now = self.inner.clock.now_ms();
        self.inner
            .state
            .borrow()
            .stored_values
            .get(key)
            .map(|entry| now.saturating_sub(entry.timestamp) as f64 / MS_PER_MINUTE)
    }

    /// Returns whether `key` was removed through [`LocalStore::delete_key`] and not written since.
    pub fn is_deleted(&self, key: &str) -> bool {
        self.inner.deleted_keys.borrow().contains(key)
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> LocalStoreSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Registers `listener` for every state change.
    pub fn subscribe(&self, listener: impl Fn(&LocalStoreSnapshot) + 'static) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    fn schedule_expiry(&self, key: &str, delay_ms: u64) {
        let weak: Weak<LocalInner> = Rc::downgrade(&self.inner);
        let storage = Rc::clone(&self.inner.storage);
        let key = key.to_string();
        self.inner
            .scheduler
            .set_timeout(
                delay_ms,
                Box::new(move || match weak.upgrade() {
                    Some(inner) => LocalStore { inner }.delete_key(&key),
                    None => {
                        if let Err(err) = storage.remove_item(&key) {
                            logging::warn!("expiring localStorage entry {key} failed: {err}");
                        }
                    }
                }),
            )
            .detach();
    }

    fn update(&self, apply: impl FnOnce(&mut LocalStoreSnapshot)) {
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            apply(&mut state);
            state.clone()
        };
        self.inner.listeners.notify(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use platform_host::{HostServices, MemoryHost};
    use pretty_assertions::assert_eq;

    use super::*;

    fn store() -> (LocalStore, MemoryHost) {
        let (services, host) = HostServices::memory(1_000);
        (LocalStore::from_services(&services), host)
    }

    fn raw_entry(value: &str, timestamp: u64, expiry: Option<u64>) -> String {
        serde_json::to_string(&StoredEntry {
            value: Some(value.to_string()),
            timestamp,
            expiry,
        })
        .expect("serialize")
    }

    #[test]
    fn entry_json_shape() {
        let raw = raw_entry("v", 5, None);
        assert_eq!(raw, r#"{"value":"v","timestamp":5,"expiry":null}"#);
        let entry: StoredEntry =
            serde_json::from_str(r#"{"value":null,"timestamp":1,"expiry":9}"#).expect("parse");
        assert_eq!(entry.value, None);
        assert!(entry.is_expired_at(10));
        assert!(!entry.is_expired_at(9));
    }

    #[test]
    fn activation_loads_live_entries_and_purges_expired_ones() {
        let (store, host) = store();
        let storage = &host.local_storage;
        storage
            .set_item("live", &raw_entry("a", 900, Some(5_000)))
            .expect("seed");
        storage
            .set_item("stale", &raw_entry("b", 100, Some(999)))
            .expect("seed");
        storage
            .set_item("forever", &raw_entry("c", 100, None))
            .expect("seed");

        store.activate();
        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.stored_values.keys().cloned().collect::<Vec<_>>(),
            vec!["forever".to_string(), "live".to_string()]
        );
        assert_eq!(snapshot.error, None);
        assert!(!storage.contains("stale"));
    }

    #[test]
    fn unparsable_entry_is_skipped_with_read_error() {
        let (store, host) = store();
        host.local_storage
            .set_item("junk", "not json")
            .expect("seed");
        host.local_storage
            .set_item("ok", &raw_entry("1", 1_000, None))
            .expect("seed");

        store.activate();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.error, Some(HookError::LocalRead));
        assert_eq!(store.get_key("ok").as_deref(), Some("1"));
        assert!(!snapshot.stored_values.contains_key("junk"));
        assert!(host.local_storage.contains("junk"));
    }

    #[test]
    fn write_failure_leaves_mirror_unchanged() {
        let (store, host) = store();
        store.activate();
        store.set_value("a", Some("1"), 0);
        host.local_storage.fail_writes(true);
        store.set_value("a", Some("2"), 0);

        assert_eq!(store.get_key("a").as_deref(), Some("1"));
        assert_eq!(
            store.snapshot().error.map(|err| err.to_string()).as_deref(),
            Some("Failed to write to localStorage")
        );

        host.local_storage.fail_writes(false);
        store.set_value("a", Some("3"), 0);
        assert_eq!(store.snapshot().error, None);
    }

    #[test]
    fn removal_failures_use_operation_messages() {
        let (store, host) = store();
        store.set_value("a", Some("1"), 0);
        host.local_storage.fail_removes(true);

        store.clear("a");
        assert_eq!(store.snapshot().error, Some(HookError::LocalClear));
        store.delete_key("a");
        assert_eq!(store.snapshot().error, Some(HookError::LocalDelete));
        assert_eq!(store.get_key("a").as_deref(), Some("1"));
        assert!(!store.is_deleted("a"));
    }

    #[test]
    fn successful_delete_clears_earlier_failure() {
        let (store, host) = store();
        store.activate();
        store.set_value("a", Some("1"), 0);
        host.local_storage.fail_writes(true);
        store.set_value("b", Some("2"), 0);
        assert_eq!(store.snapshot().error, Some(HookError::LocalWrite));

        store.delete_key("a");
        assert_eq!(store.snapshot().error, None);
        assert!(!host.local_storage.contains("a"));
    }

    #[test]
    fn null_values_are_persisted_and_reloaded() {
        let (store, host) = store();
        store.activate();
        store.set_value("empty", None, 0);

        assert_eq!(
            host.local_storage.get_item("empty").expect("read").as_deref(),
            Some(r#"{"value":null,"timestamp":1000,"expiry":null}"#)
        );
        assert_eq!(store.get_key("empty"), None);
        assert_eq!(
            store.snapshot().stored_values.get("empty").map(|entry| entry.value.clone()),
            Some(None)
        );

        let other = LocalStore::new(
            Rc::new(host.local_storage.clone()),
            Rc::new(host.scheduler.clone()),
            Rc::new(host.clock()),
        );
        other.activate();
        assert!(other.snapshot().stored_values.contains_key("empty"));
        assert_eq!(other.snapshot().error, None);
    }

    #[test]
    fn mirror_hides_expired_entry_before_timer_fires() {
        let (store, host) = store();
        store.set_value("a", Some("1"), 100);
        host.clock().advance(101);
        assert_eq!(store.get_key("a"), None);
        assert!(host.local_storage.contains("a"));
    }

    #[test]
    fn rewriting_a_deleted_key_makes_it_visible_again() {
        let (store, host) = store();
        store.activate();
        store.set_value("a", Some("1"), 0);
        store.delete_key("a");
        assert!(store.is_deleted("a"));

        store.set_value("a", Some("2"), 0);
        assert!(!store.is_deleted("a"));
        store.reload();
        assert_eq!(store.get_key("a").as_deref(), Some("2"));
        assert!(host.local_storage.contains("a"));
    }

    #[test]
    fn unchanged_reload_does_not_notify() {
        let (store, _host) = store();
        store.activate();
        store.set_value("a", Some("1"), 0);

        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        let _subscription =
            store.subscribe(move |_: &LocalStoreSnapshot| counter.set(counter.get() + 1));
        store.reload();
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn expiry_timer_outlives_the_store() {
        let (store, host) = store();
        store.set_value("a", Some("1"), 500);
        drop(store);

        assert!(host.local_storage.contains("a"));
        host.scheduler.advance(500);
        assert!(!host.local_storage.contains("a"));
    }
}
