//! Synchronous string key/value storage contracts and adapters.
//!
//! The contract mirrors the Web Storage API: every call is synchronous and may fail when the
//! backing area is disabled or over quota.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

use super::events::{MemoryStorageEventSource, StorageArea, StorageChangeEvent};

/// Host service for one string key/value storage area.
pub trait KeyValueStore {
    /// Reads the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage area is unavailable.
    fn get_item(&self, key: &str) -> Result<Option<String>, String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage area is unavailable or the write is rejected.
    fn set_item(&self, key: &str, value: &str) -> Result<(), String>;

    /// Removes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage area is unavailable.
    fn remove_item(&self, key: &str) -> Result<(), String>;

    /// Lists every key currently present.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage area is unavailable.
    fn keys(&self) -> Result<Vec<String>, String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Key/value store that holds nothing and accepts every write.
pub struct NoopKeyValueStore;

impl KeyValueStore for NoopKeyValueStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, String> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), String> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<(), String> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory key/value store.
///
/// Clones share the same entries, which lets tests model several hook instances (or several
/// browsing contexts) over one storage area. Writes can be made to fail to simulate quota or
/// disabled-storage errors.
pub struct MemoryKeyValueStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
    fail_reads: Rc<Cell<bool>>,
    fail_writes: Rc<Cell<bool>>,
    fail_removes: Rc<Cell<bool>>,
}

impl MemoryKeyValueStore {
    /// Makes subsequent `get_item` calls fail. Enumeration keeps working.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Makes subsequent `set_item` calls fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Makes subsequent `remove_item` calls fail.
    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.set(fail);
    }

    /// Returns whether `key` is physically present.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().contains_key(key)
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Returns a view of this store that also raises change events, modelling writes made by
    /// another browsing context.
    pub fn remote_context(
        &self,
        area: StorageArea,
        events: MemoryStorageEventSource,
    ) -> RemoteContextStore {
        RemoteContextStore {
            store: self.clone(),
            area,
            events,
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        if self.fail_reads.get() {
            return Err("storage is not readable".to_string());
        }
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        if self.fail_writes.get() {
            return Err("storage quota exceeded".to_string());
        }
        self.inner
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        if self.fail_removes.get() {
            return Err("storage unavailable".to_string());
        }
        self.inner.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        Ok(self.inner.borrow().keys().cloned().collect())
    }
}

#[derive(Debug, Clone)]
/// Writer for a shared [`MemoryKeyValueStore`] that notifies other contexts of its changes.
pub struct RemoteContextStore {
    store: MemoryKeyValueStore,
    area: StorageArea,
    events: MemoryStorageEventSource,
}

impl RemoteContextStore {
    /// Writes `value` and raises the matching change event.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying write fails; no event is raised then.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        let old_value = self.store.get_item(key)?;
        self.store.set_item(key, value)?;
        self.events.emit(&StorageChangeEvent {
            key: Some(key.to_string()),
            old_value,
            new_value: Some(value.to_string()),
            area: self.area,
        });
        Ok(())
    }

    /// Removes `key` and raises the matching change event.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying removal fails; no event is raised then.
    pub fn remove_item(&self, key: &str) -> Result<(), String> {
        let old_value = self.store.get_item(key)?;
        self.store.remove_item(key)?;
        self.events.emit(&StorageChangeEvent {
            key: Some(key.to_string()),
            old_value,
            new_value: None,
            area: self.area,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip_remove_and_list() {
        let store = MemoryKeyValueStore::default();
        let store_obj: &dyn KeyValueStore = &store;

        store_obj.set_item("b", "2").expect("set b");
        store_obj.set_item("a", "1").expect("set a");
        store_obj.set_item("a", "3").expect("overwrite a");
        assert_eq!(store_obj.get_item("a").expect("get"), Some("3".to_string()));
        assert_eq!(
            store_obj.keys().expect("keys"),
            vec!["a".to_string(), "b".to_string()]
        );

        store_obj.remove_item("a").expect("remove");
        store_obj.remove_item("a").expect("remove absent");
        assert_eq!(store_obj.get_item("a").expect("get"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryKeyValueStore::default();
        let other = store.clone();
        store.set_item("k", "v").expect("set");
        assert!(other.contains("k"));
    }

    #[test]
    fn memory_store_write_failure_leaves_entries_untouched() {
        let store = MemoryKeyValueStore::default();
        store.set_item("k", "v").expect("set");
        store.fail_writes(true);
        assert!(store.set_item("k", "w").is_err());
        assert_eq!(store.get_item("k").expect("get"), Some("v".to_string()));
    }

    #[test]
    fn memory_store_read_failure_keeps_enumeration() {
        let store = MemoryKeyValueStore::default();
        store.set_item("k", "v").expect("set");
        store.fail_reads(true);
        assert!(store.get_item("k").is_err());
        assert_eq!(store.keys().expect("keys"), vec!["k".to_string()]);
    }

    #[test]
    fn remote_context_writes_raise_events() {
        let store = MemoryKeyValueStore::default();
        let events = MemoryStorageEventSource::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = events.listeners().subscribe(move |event: &StorageChangeEvent| {
            sink.borrow_mut().push(event.clone())
        });

        let remote = store.remote_context(StorageArea::Session, events.clone());
        remote.set_item("k", "v").expect("remote set");
        remote.remove_item("k").expect("remote remove");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].new_value.as_deref(), Some("v"));
        assert_eq!(seen[1].old_value.as_deref(), Some("v"));
        assert_eq!(seen[1].new_value, None);
        assert!(!store.contains("k"));
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store: &dyn KeyValueStore = &NoopKeyValueStore;
        store.set_item("k", "v").expect("set");
        assert_eq!(store.get_item("k").expect("get"), None);
        assert!(store.keys().expect("keys").is_empty());
    }
}
