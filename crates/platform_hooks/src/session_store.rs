//! Session-scoped key/value store with TTL, periodic sweep, and cross-context sync.
//!
//! A value lives under its key as JSON text; its expiry (decimal epoch milliseconds) lives under
//! the key plus the configured suffix. Both keys are written and removed together.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use leptos::logging;
use platform_host::{
    Clock, HostServices, KeyValueStore, ListenerSet, Scheduler, StorageArea, StorageChangeEvent,
    StorageEventSource, Subscription,
};
use serde_json::Value;

use crate::{HookError, HooksConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Mirror of the session area plus the most recent failure.
pub struct SessionStoreSnapshot {
    /// Values by key; `None` marks a key explicitly set to no value.
    pub stored_values: BTreeMap<String, Option<String>>,
    /// Failure of the most recent failing operation.
    pub error: Option<HookError>,
}

struct SessionInner {
    storage: Rc<dyn KeyValueStore>,
    events: Rc<dyn StorageEventSource>,
    scheduler: Rc<dyn Scheduler>,
    clock: Rc<dyn Clock>,
    sweep_interval_ms: u64,
    expiry_suffix: String,
    state: RefCell<SessionStoreSnapshot>,
    active: Cell<bool>,
    sweep: RefCell<Option<Subscription>>,
    sync: RefCell<Option<Subscription>>,
    listeners: ListenerSet<SessionStoreSnapshot>,
}

#[derive(Clone)]
/// Key/value store over the host's session storage area.
///
/// While active it imports every stored pair, sweeps expired pairs periodically, and mirrors
/// writes made by other browsing contexts.
pub struct SessionStore {
    inner: Rc<SessionInner>,
}

impl SessionStore {
    /// Creates an inactive store.
    pub fn new(
        storage: Rc<dyn KeyValueStore>,
        events: Rc<dyn StorageEventSource>,
        scheduler: Rc<dyn Scheduler>,
        clock: Rc<dyn Clock>,
        config: &HooksConfig,
    ) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                storage,
                events,
                scheduler,
                clock,
                sweep_interval_ms: config.session_sweep_interval_ms,
                expiry_suffix: config.expiry_suffix.clone(),
                state: RefCell::default(),
                active: Cell::new(false),
                sweep: RefCell::new(None),
                sync: RefCell::new(None),
                listeners: ListenerSet::default(),
            }),
        }
    }

    /// Creates an inactive store over the bundle's session storage.
    pub fn from_services(services: &HostServices, config: &HooksConfig) -> Self {
        Self::new(
            Rc::clone(&services.session_storage),
            Rc::clone(&services.storage_events),
            Rc::clone(&services.scheduler),
            Rc::clone(&services.clock),
            config,
        )
    }

    /// Imports stored pairs, sweeps, starts the periodic sweep, and subscribes to changes from
    /// other contexts. Calling it while active does nothing.
    pub fn activate(&self) {
        let inner = &self.inner;
        if inner.active.replace(true) {
            return;
        }
        self.import();
        self.sweep_expired();

        let weak = Rc::downgrade(inner);
        let sweep = inner.scheduler.set_interval(
            inner.sweep_interval_ms,
            Rc::new(move || {
                if let Some(store) = upgrade(&weak) {
                    store.sweep_expired();
                }
            }),
        );
        *inner.sweep.borrow_mut() = Some(sweep);

        let weak = Rc::downgrade(inner);
        match inner
            .events
            .subscribe(Rc::new(move |event: &StorageChangeEvent| {
                if let Some(store) = upgrade(&weak) {
                    store.apply_remote_change(event);
                }
            })) {
            Ok(subscription) => *inner.sync.borrow_mut() = Some(subscription),
            Err(err) => logging::warn!("sessionStorage change subscription failed: {err}"),
        }
    }

    /// Stops the periodic sweep and cross-context sync.
    pub fn deactivate(&self) {
        let inner = &self.inner;
        if !inner.active.replace(false) {
            return;
        }
        let sweep = inner.sweep.borrow_mut().take();
        let sync = inner.sync.borrow_mut().take();
        drop((sweep, sync));
    }

    /// Returns whether the store is active.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Writes `value` under `key`; a positive `ttl_ms` also writes the expiry. `None` removes the
    /// stored pair and records the key as having no value.
    pub fn set_value(&self, key: &str, value: Option<&str>, ttl_ms: u64) {
        let written = match value {
            Some(value) => self.write_pair(key, value, ttl_ms),
            None => self.remove_pair(key),
        };
        if let Err(err) = written {
            logging::warn!("sessionStorage write of {key} failed: {err}");
            self.update(|state| state.error = Some(HookError::SessionWrite));
            return;
        }
        self.update(|state| {
            state
                .stored_values
                .insert(key.to_string(), value.map(str::to_string));
            state.error = None;
        });
    }

    /// Same as [`SessionStore::set_value`].
    pub fn add_key(&self, key: &str, value: Option<&str>, ttl_ms: u64) {
        self.set_value(key, value, ttl_ms);
    }

    /// Removes the stored pair and the mirror entry. Removing an absent key succeeds.
    pub fn clear(&self, key: &str) {
        if let Err(err) = self.remove_pair(key) {
            logging::warn!("sessionStorage clear of {key} failed: {err}");
            self.update(|state| state.error = Some(HookError::SessionClear));
            return;
        }
        self.update(|state| {
            state.stored_values.remove(key);
            state.error = None;
        });
    }

    /// Same as [`SessionStore::clear`].
    pub fn delete_key(&self, key: &str) {
        self.clear(key);
    }

    /// Returns the mirrored value of `key`. An expired pair is cleared first and reads as `None`.
    pub fn get_key(&self, key: &str) -> Option<String> {
        if self.is_expired(key, self.inner.clock.now_ms()) {
            self.clear(key);
            return None;
        }
        self.inner
            .state
            .borrow()
            .stored_values
            .get(key)
            .cloned()
            .flatten()
    }

    /// Writes every item with the same TTL, one key at a time. `None` items remove their pair.
    pub fn batch_set<I, K, V>(&self, items: I, ttl_ms: u64)
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in items {
            let value = value.as_ref().map(|value| AsRef::<str>::as_ref(value));
            self.set_value(key.as_ref(), value, ttl_ms);
        }
    }

    /// Reads every key through [`SessionStore::get_key`].
    pub fn batch_get<I, K>(&self, keys: I) -> BTreeMap<String, Option<String>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                (key.to_string(), self.get_key(key))
            })
            .collect()
    }

    /// Removes every pair whose expiry has passed from storage and the mirror.
    pub fn sweep_expired(&self) {
        let inner = &self.inner;
        let keys = match inner.storage.keys() {
            Ok(keys) => keys,
            Err(err) => {
                logging::warn!("sessionStorage enumeration failed: {err}");
                return;
            }
        };
        let now = inner.clock.now_ms();
        let expired = keys
            .iter()
            .filter_map(|key| key.strip_suffix(inner.expiry_suffix.as_str()))
            .filter(|key| self.is_expired(key, now))
            .map(str::to_string)
            .collect::<Vec<_>>();
        if expired.is_empty() {
            return;
        }

        let mut removed = Vec::with_capacity(expired.len());
        for key in expired {
            match self.remove_pair(&key) {
                Ok(()) => removed.push(key),
                Err(err) => logging::warn!("sweeping sessionStorage entry {key} failed: {err}"),
            }
        }
        let mirrored = {
            let state = inner.state.borrow();
            removed
                .iter()
                .any(|key| state.stored_values.contains_key(key))
        };
        if mirrored {
            self.update(|state| {
                for key in &removed {
                    state.stored_values.remove(key);
                }
            });
        }
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> SessionStoreSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Registers `listener` for every state change.
    pub fn subscribe(&self, listener: impl Fn(&SessionStoreSnapshot) + 'static) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    fn import(&self) {
        let inner = &self.inner;
        let keys = match inner.storage.keys() {
            Ok(keys) => keys,
            Err(err) => {
                logging::warn!("sessionStorage enumeration failed: {err}");
                self.update(|state| state.error = Some(HookError::SessionRead));
                return;
            }
        };

        let now = inner.clock.now_ms();
        let mut imported = BTreeMap::new();
        let mut read_failed = false;
        for key in keys {
            if self.is_expiry_key(&key) {
                continue;
            }
            if self.is_expired(&key, now) {
                if let Err(err) = self.remove_pair(&key) {
                    logging::warn!("purging expired sessionStorage entry {key} failed: {err}");
                }
                continue;
            }
            match inner.storage.get_item(&key) {
                Ok(Some(raw)) => {
                    imported.insert(key, Some(decode(&raw)));
                }
                Ok(None) => {}
                Err(err) => {
                    logging::warn!("sessionStorage read of {key} failed: {err}");
                    read_failed = true;
                }
            }
        }

        let changed = inner.state.borrow().stored_values != imported;
        if changed || read_failed {
            self.update(|state| {
                if changed {
                    state.stored_values = imported;
                }
                if read_failed {
                    state.error = Some(HookError::SessionRead);
                }
            });
        }
    }

    fn apply_remote_change(&self, event: &StorageChangeEvent) {
        if event.area != StorageArea::Session {
            return;
        }
        match &event.key {
            None => self.update(|state| state.stored_values.clear()),
            Some(key) if self.is_expiry_key(key) => {}
            Some(key) => {
                let value = event.new_value.as_deref().map(decode);
                self.update(|state| {
                    state.stored_values.insert(key.clone(), value);
                });
            }
        }
    }

    fn write_pair(&self, key: &str, value: &str, ttl_ms: u64) -> Result<(), String> {
        let inner = &self.inner;
        let encoded = serde_json::to_string(value).map_err(|e| e.to_string())?;
        inner.storage.set_item(key, &encoded)?;
        let expiry_key = self.expiry_key(key);
        if ttl_ms > 0 {
            let expiry = inner.clock.now_ms().saturating_add(ttl_ms);
            inner.storage.set_item(&expiry_key, &expiry.to_string())
        } else {
            inner.storage.remove_item(&expiry_key)
        }
    }

    fn remove_pair(&self, key: &str) -> Result<(), String> {
        self.inner.storage.remove_item(key)?;
        self.inner.storage.remove_item(&self.expiry_key(key))
    }

    fn is_expired(&self, key: &str, now_ms: u64) -> bool {
        match self.inner.storage.get_item(&self.expiry_key(key)) {
            Ok(Some(raw)) => raw
                .trim()
                .parse::<u64>()
                .is_ok_and(|expiry| now_ms > expiry),
            Ok(None) => false,
            Err(err) => {
                logging::warn!("sessionStorage expiry read of {key} failed: {err}");
                false
            }
        }
    }

    fn expiry_key(&self, key: &str) -> String {
        format!("{key}{}", self.inner.expiry_suffix)
    }

    fn is_expiry_key(&self, key: &str) -> bool {
        key.ends_with(self.inner.expiry_suffix.as_str())
    }

    fn update(&self, apply: impl FnOnce(&mut SessionStoreSnapshot)) {
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            apply(&mut state);
            state.clone()
        };
        self.inner.listeners.notify(&snapshot);
    }
}

fn upgrade(weak: &Weak<SessionInner>) -> Option<SessionStore> {
    weak.upgrade().map(|inner| SessionStore { inner })
}

/// Decodes a stored JSON string; anything else is kept as raw text.
fn decode(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(text)) => text,
        _ => raw.to_string(),
    }
}
