//! Typed host-domain contracts and shared models used by browser adapters and hooks.
//!
//! This crate is the API-first boundary for platform services. It exposes clipboard,
//! geolocation, key/value storage, storage-change, timer, and clock contracts together with
//! in-memory and no-op adapters, while concrete browser adapters live in `platform_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod clipboard;
pub mod geolocation;
pub mod host;
pub mod scheduler;
pub mod storage;
pub mod subscription;
pub mod time;

pub use clipboard::{
    ClipboardFuture, ClipboardService, MemoryClipboardService, NoopClipboardService,
};
pub use geolocation::{
    GeoPosition, GeolocationError, GeolocationErrorCode, GeolocationService,
    MemoryGeolocationService, NoopGeolocationService, PositionCallback, PositionErrorCallback,
    PositionOptions, WatchId, DEFAULT_POSITION_TIMEOUT_MS,
};
pub use host::{CapabilityStatus, HostCapabilities, HostServices, HostStrategy, MemoryHost};
pub use scheduler::{ManualScheduler, NoopScheduler, Scheduler};
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, MemoryStorageEventSource, NoopKeyValueStore,
    NoopStorageEventSource, RemoteContextStore, StorageArea, StorageChangeEvent,
    StorageChangeListener, StorageEventSource,
};
pub use subscription::{ListenerSet, Subscription};
pub use time::{unix_time_ms_now, Clock, ManualClock, SystemClock};
