//! Leptos bindings for the hook components.
//!
//! Each `use_*` function builds its component from the [`HostServices`] in context (falling back
//! to [`platform_host_web::build_host_services`]), activates it, mirrors its state into signals,
//! and deactivates it when the reactive owner is cleaned up.

use std::collections::BTreeMap;

use leptos::*;
use platform_host::{GeoPosition, HostServices};
use platform_host_web::build_host_services;

use crate::{
    ClipboardAccessor, ClipboardSnapshot, GeolocationOptions, GeolocationSnapshot,
    GeolocationTracker, HookError, HooksConfig, LocalStore, LocalStoreSnapshot, SessionStore,
    SessionStoreSnapshot, StoredEntry,
};

/// Provides `services` to every hook created below the current owner.
pub fn provide_host_services(services: HostServices) {
    provide_context(services);
}

/// Returns the host bundle from context, or the compile-time selected bundle.
pub fn use_host_services() -> HostServices {
    use_context::<HostServices>().unwrap_or_else(build_host_services)
}

/// Provides `config` to every hook created below the current owner.
pub fn provide_hooks_config(config: HooksConfig) {
    provide_context(config);
}

/// Returns the hook configuration from context, or the defaults.
pub fn use_hooks_config() -> HooksConfig {
    use_context::<HooksConfig>().unwrap_or_default()
}

#[derive(Clone, Copy)]
/// Reactive clipboard handle returned by [`use_clipboard`].
pub struct UseClipboard {
    /// Text last written or read successfully.
    pub content: Signal<Option<String>>,
    /// Failure of the most recent operation.
    pub error: Signal<Option<HookError>>,
    accessor: StoredValue<ClipboardAccessor>,
}

impl UseClipboard {
    /// Starts writing `text` to the clipboard.
    pub fn copy_to_clipboard(&self, text: impl Into<String>) {
        let accessor = self.accessor.get_value();
        let text = text.into();
        spawn_local(async move { accessor.copy_to_clipboard(&text).await });
    }

    /// Starts reading the clipboard.
    pub fn read_from_clipboard(&self) {
        let accessor = self.accessor.get_value();
        spawn_local(async move { accessor.read_from_clipboard().await });
    }

    /// Returns the underlying accessor.
    pub fn accessor(&self) -> ClipboardAccessor {
        self.accessor.get_value()
    }
}

/// Clipboard hook over the host bundle in context.
pub fn use_clipboard() -> UseClipboard {
    use_clipboard_with(&use_host_services())
}

/// Clipboard hook over `services`.
pub fn use_clipboard_with(services: &HostServices) -> UseClipboard {
    let accessor = ClipboardAccessor::from_services(services);
    let state = create_rw_signal(accessor.snapshot());
    let subscription =
        accessor.subscribe(move |snapshot: &ClipboardSnapshot| state.set(snapshot.clone()));
    on_cleanup(move || drop(subscription));

    UseClipboard {
        content: Signal::derive(move || state.with(|s| s.content.clone())),
        error: Signal::derive(move || state.with(|s| s.error.clone())),
        accessor: store_value(accessor),
    }
}

#[derive(Clone, Copy)]
/// Reactive position handle returned by [`use_geolocation`].
pub struct UseGeolocation {
    /// Most recent fix.
    pub position: Signal<Option<GeoPosition>>,
    /// Most recent failure; a later fix does not clear it.
    pub error: Signal<Option<HookError>>,
}

/// Geolocation hook over the host bundle in context.
///
/// Changing `options` while mounted replaces the outstanding watch.
pub fn use_geolocation(options: impl Into<MaybeSignal<GeolocationOptions>>) -> UseGeolocation {
    use_geolocation_with(&use_host_services(), options)
}

/// Geolocation hook over the host bundle in context, using the options from
/// [`use_hooks_config`].
pub fn use_geolocation_from_config() -> UseGeolocation {
    use_geolocation_with(&use_host_services(), use_hooks_config().geolocation)
}

/// Geolocation hook over `services`.
pub fn use_geolocation_with(
    services: &HostServices,
    options: impl Into<MaybeSignal<GeolocationOptions>>,
) -> UseGeolocation {
    let options = options.into();
    let tracker = GeolocationTracker::from_services(services, options.get_untracked());
    let state = create_rw_signal(tracker.snapshot());
    let subscription =
        tracker.subscribe(move |snapshot: &GeolocationSnapshot| state.set(snapshot.clone()));
    tracker.activate();

    let effect_tracker = tracker.clone();
    create_effect(move |_| effect_tracker.set_options(options.get()));
    on_cleanup(move || {
        tracker.deactivate();
        drop(subscription);
    });

    UseGeolocation {
        position: Signal::derive(move || state.with(|s| s.position)),
        error: Signal::derive(move || state.with(|s| s.error.clone())),
    }
}

#[derive(Clone, Copy)]
/// Reactive durable-storage handle returned by [`use_local_storage`].
pub struct UseLocalStorage {
    /// Live entries by key.
    pub stored_values: Signal<BTreeMap<String, StoredEntry>>,
    /// Failure of the most recent failing operation.
    pub error: Signal<Option<HookError>>,
    store: StoredValue<LocalStore>,
}

impl UseLocalStorage {
    /// See [`LocalStore::set_value`].
    pub fn set_value(&self, key: &str, value: Option<&str>, expire_in_ms: u64) {
        self.store.with_value(|store| store.set_value(key, value, expire_in_ms));
    }

    /// See [`LocalStore::add_key`].
    pub fn add_key(&self, key: &str, value: Option<&str>, expire_in_ms: u64) {
        self.store.with_value(|store| store.add_key(key, value, expire_in_ms));
    }

    /// See [`LocalStore::clear`].
    pub fn clear(&self, key: &str) {
        self.store.with_value(|store| store.clear(key));
    }

    /// See [`LocalStore::delete_key`].
    pub fn delete_key(&self, key: &str) {
        self.store.with_value(|store| store.delete_key(key));
    }

    /// See [`LocalStore::get_key`]. Not tracked; read `stored_values` to react to changes.
    pub fn get_key(&self, key: &str) -> Option<String> {
        self.store.with_value(|store| store.get_key(key))
    }

    /// See [`LocalStore::get_duration`].
    pub fn get_duration(&self, key: &str) -> Option<f64> {
        self.store.with_value(|store| store.get_duration(key))
    }

    /// Returns the underlying store.
    pub fn store(&self) -> LocalStore {
        self.store.get_value()
    }
}

/// Durable-storage hook over the host bundle in context.
pub fn use_local_storage() -> UseLocalStorage {
    use_local_storage_with(&use_host_services())
}

/// Durable-storage hook over `services`.
pub fn use_local_storage_with(services: &HostServices) -> UseLocalStorage {
    let store = LocalStore::from_services(services);
    let state = create_rw_signal(store.snapshot());
    let subscription =
        store.subscribe(move |snapshot: &LocalStoreSnapshot| state.set(snapshot.clone()));
    store.activate();

    let cleanup_store = store.clone();
    on_cleanup(move || {
        cleanup_store.deactivate();
        drop(subscription);
    });

    UseLocalStorage {
        stored_values: Signal::derive(move || state.with(|s| s.stored_values.clone())),
        error: Signal::derive(move || state.with(|s| s.error.clone())),
        store: store_value(store),
    }
}

#[derive(Clone, Copy)]
/// Reactive session-storage handle returned by [`use_session_storage`].
pub struct UseSessionStorage {
    /// Values by key.
    pub stored_values: Signal<BTreeMap<String, Option<String>>>,
    /// Failure of the most recent failing operation.
    pub error: Signal<Option<HookError>>,
    store: StoredValue<SessionStore>,
}

impl UseSessionStorage {
    /// See [`SessionStore::set_value`].
    pub fn set_value(&self, key: &str, value: Option<&str>, ttl_ms: u64) {
        self.store.with_value(|store| store.set_value(key, value, ttl_ms));
    }

    /// See [`SessionStore::add_key`].
    pub fn add_key(&self, key: &str, value: Option<&str>, ttl_ms: u64) {
        self.store.with_value(|store| store.add_key(key, value, ttl_ms));
    }

    /// See [`SessionStore::clear`].
    pub fn clear(&self, key: &str) {
        self.store.with_value(|store| store.clear(key));
    }

    /// See [`SessionStore::delete_key`].
    pub fn delete_key(&self, key: &str) {
        self.store.with_value(|store| store.delete_key(key));
    }

    /// See [`SessionStore::get_key`].
    pub fn get_key(&self, key: &str) -> Option<String> {
        self.store.with_value(|store| store.get_key(key))
    }

    /// See [`SessionStore::batch_set`].
    pub fn batch_set<I, K, V>(&self, items: I, ttl_ms: u64)
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.store.with_value(|store| store.batch_set(items, ttl_ms));
    }

    /// See [`SessionStore::batch_get`].
    pub fn batch_get<I, K>(&self, keys: I) -> BTreeMap<String, Option<String>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.store.with_value(|store| store.batch_get(keys))
    }

    /// Returns the underlying store.
    pub fn store(&self) -> SessionStore {
        self.store.get_value()
    }
}

/// Session-storage hook over the host bundle and configuration in context.
pub fn use_session_storage() -> UseSessionStorage {
    use_session_storage_with(&use_host_services(), &use_hooks_config())
}

/// Session-storage hook over `services`.
pub fn use_session_storage_with(services: &HostServices, config: &HooksConfig) -> UseSessionStorage {
    let store = SessionStore::from_services(services, config);
    let state = create_rw_signal(store.snapshot());
    let subscription =
        store.subscribe(move |snapshot: &SessionStoreSnapshot| state.set(snapshot.clone()));
    store.activate();

    let cleanup_store = store.clone();
    on_cleanup(move || {
        cleanup_store.deactivate();
        drop(subscription);
    });

    UseSessionStorage {
        stored_values: Signal::derive(move || state.with(|s| s.stored_values.clone())),
        error: Signal::derive(move || state.with(|s| s.error.clone())),
        store: store_value(store),
    }
}
