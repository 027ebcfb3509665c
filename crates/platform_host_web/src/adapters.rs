use std::rc::Rc;

use platform_host::{
    CapabilityStatus, ClipboardFuture, ClipboardService, GeolocationError, GeolocationService,
    HostCapabilities, HostServices, HostStrategy, KeyValueStore, NoopClipboardService,
    NoopGeolocationService, NoopKeyValueStore, NoopScheduler, NoopStorageEventSource,
    PositionCallback, PositionErrorCallback, PositionOptions, Scheduler, StorageChangeListener,
    StorageEventSource, Subscription, SystemClock, WatchId,
};

use crate::{
    WebClipboardService, WebGeolocationService, WebKeyValueStore, WebScheduler,
    WebStorageEventSource,
};

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "host-stub")]
    {
        HostStrategy::Stub
    }

    #[cfg(not(feature = "host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    selected_host_strategy().as_str()
}

/// Adapter enum that erases the concrete clipboard backend behind [`ClipboardService`].
#[derive(Debug, Clone, Copy)]
pub enum ClipboardServiceAdapter {
    /// Async Clipboard API.
    Browser(WebClipboardService),
    /// Always-failing fallback for stubbed hosts.
    Stub(NoopClipboardService),
}

impl ClipboardService for ClipboardServiceAdapter {
    fn write_text<'a>(&'a self, text: &'a str) -> ClipboardFuture<'a, Result<(), String>> {
        match self {
            Self::Browser(service) => service.write_text(text),
            Self::Stub(service) => service.write_text(text),
        }
    }

    fn read_text<'a>(&'a self) -> ClipboardFuture<'a, Result<String, String>> {
        match self {
            Self::Browser(service) => service.read_text(),
            Self::Stub(service) => service.read_text(),
        }
    }
}

/// Adapter enum that erases the concrete position backend behind [`GeolocationService`].
#[derive(Debug, Clone)]
pub enum GeolocationServiceAdapter {
    /// `navigator.geolocation`.
    Browser(WebGeolocationService),
    /// Unsupported fallback for stubbed hosts.
    Stub(NoopGeolocationService),
}

impl GeolocationService for GeolocationServiceAdapter {
    fn is_supported(&self) -> bool {
        match self {
            Self::Browser(service) => service.is_supported(),
            Self::Stub(service) => service.is_supported(),
        }
    }

    fn get_current_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) {
        match self {
            Self::Browser(service) => service.get_current_position(on_success, on_error, options),
            Self::Stub(service) => service.get_current_position(on_success, on_error, options),
        }
    }

    fn watch_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> Result<WatchId, GeolocationError> {
        match self {
            Self::Browser(service) => service.watch_position(on_success, on_error, options),
            Self::Stub(service) => service.watch_position(on_success, on_error, options),
        }
    }

    fn clear_watch(&self, id: WatchId) {
        match self {
            Self::Browser(service) => service.clear_watch(id),
            Self::Stub(service) => service.clear_watch(id),
        }
    }
}

/// Adapter enum that erases the concrete storage area backend behind [`KeyValueStore`].
#[derive(Debug, Clone, Copy)]
pub enum KeyValueStoreAdapter {
    /// Web Storage area.
    Browser(WebKeyValueStore),
    /// Empty fallback for stubbed hosts.
    Stub(NoopKeyValueStore),
}

impl KeyValueStore for KeyValueStoreAdapter {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        match self {
            Self::Browser(store) => store.get_item(key),
            Self::Stub(store) => store.get_item(key),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.set_item(key, value),
            Self::Stub(store) => store.set_item(key, value),
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.remove_item(key),
            Self::Stub(store) => store.remove_item(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        match self {
            Self::Browser(store) => store.keys(),
            Self::Stub(store) => store.keys(),
        }
    }
}

/// Adapter enum that erases the concrete change-notification backend behind
/// [`StorageEventSource`].
#[derive(Debug, Clone, Copy)]
pub enum StorageEventSourceAdapter {
    /// Window `storage` event.
    Browser(WebStorageEventSource),
    /// Silent fallback for stubbed hosts.
    Stub(NoopStorageEventSource),
}

impl StorageEventSource for StorageEventSourceAdapter {
    fn subscribe(&self, listener: StorageChangeListener) -> Result<Subscription, String> {
        match self {
            Self::Browser(source) => source.subscribe(listener),
            Self::Stub(source) => source.subscribe(listener),
        }
    }
}

/// Adapter enum that erases the concrete timer backend behind [`Scheduler`].
#[derive(Debug, Clone, Copy)]
pub enum SchedulerAdapter {
    /// `setTimeout` / `setInterval`.
    Browser(WebScheduler),
    /// Never-firing fallback for stubbed hosts.
    Stub(NoopScheduler),
}

impl Scheduler for SchedulerAdapter {
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> Subscription {
        match self {
            Self::Browser(scheduler) => scheduler.set_timeout(delay_ms, callback),
            Self::Stub(scheduler) => scheduler.set_timeout(delay_ms, callback),
        }
    }

    fn set_interval(&self, period_ms: u64, callback: Rc<dyn Fn()>) -> Subscription {
        match self {
            Self::Browser(scheduler) => scheduler.set_interval(period_ms, callback),
            Self::Stub(scheduler) => scheduler.set_interval(period_ms, callback),
        }
    }
}

/// Builds the clipboard adapter for the compile-time selected host strategy.
pub fn clipboard_service() -> ClipboardServiceAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => ClipboardServiceAdapter::Browser(WebClipboardService),
        HostStrategy::Stub | HostStrategy::Memory => {
            ClipboardServiceAdapter::Stub(NoopClipboardService)
        }
    }
}

/// Builds the geolocation adapter for the compile-time selected host strategy.
pub fn geolocation_service() -> GeolocationServiceAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => {
            GeolocationServiceAdapter::Browser(WebGeolocationService::default())
        }
        HostStrategy::Stub | HostStrategy::Memory => {
            GeolocationServiceAdapter::Stub(NoopGeolocationService)
        }
    }
}

/// Builds the durable (`localStorage`) adapter for the compile-time selected host strategy.
pub fn local_storage() -> KeyValueStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => KeyValueStoreAdapter::Browser(WebKeyValueStore::local()),
        HostStrategy::Stub | HostStrategy::Memory => KeyValueStoreAdapter::Stub(NoopKeyValueStore),
    }
}

/// Builds the session (`sessionStorage`) adapter for the compile-time selected host strategy.
pub fn session_storage() -> KeyValueStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => KeyValueStoreAdapter::Browser(WebKeyValueStore::session()),
        HostStrategy::Stub | HostStrategy::Memory => KeyValueStoreAdapter::Stub(NoopKeyValueStore),
    }
}

/// Builds the storage-change adapter for the compile-time selected host strategy.
pub fn storage_event_source() -> StorageEventSourceAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => StorageEventSourceAdapter::Browser(WebStorageEventSource),
        HostStrategy::Stub | HostStrategy::Memory => {
            StorageEventSourceAdapter::Stub(NoopStorageEventSource)
        }
    }
}

/// Builds the timer adapter for the compile-time selected host strategy.
pub fn scheduler() -> SchedulerAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => SchedulerAdapter::Browser(WebScheduler),
        HostStrategy::Stub | HostStrategy::Memory => SchedulerAdapter::Stub(NoopScheduler),
    }
}

/// Returns the capability snapshot for the selected strategy.
///
/// Browser geolocation is downgraded to unavailable when `navigator.geolocation` is missing.
pub fn host_capabilities() -> HostCapabilities {
    match selected_host_strategy() {
        HostStrategy::Browser => {
            let mut capabilities = HostCapabilities::browser();
            if !geolocation_service().is_supported() {
                capabilities.geolocation = CapabilityStatus::Unavailable;
            }
            capabilities
        }
        HostStrategy::Stub => HostCapabilities::stub(),
        HostStrategy::Memory => HostCapabilities::memory(),
    }
}

/// Builds the full host service bundle for the compile-time selected strategy.
pub fn build_host_services() -> HostServices {
    HostServices {
        clipboard: Rc::new(clipboard_service()),
        geolocation: Rc::new(geolocation_service()),
        local_storage: Rc::new(local_storage()),
        session_storage: Rc::new(session_storage()),
        storage_events: Rc::new(storage_event_source()),
        scheduler: Rc::new(scheduler()),
        clock: Rc::new(SystemClock),
        capabilities: host_capabilities(),
        host_strategy: selected_host_strategy(),
    }
}
