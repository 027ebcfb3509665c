//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! This crate is the concrete browser-side host wiring layer for clipboard, geolocation,
//! Web Storage, cross-context storage events, and timers. On non-wasm targets every adapter
//! compiles to an inert fallback so hook crates can be built and tested natively.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
pub mod clipboard;
pub mod geolocation;
pub mod storage;
pub mod timers;

pub use adapters::{
    build_host_services, clipboard_service, geolocation_service, host_capabilities,
    host_strategy_name, local_storage, scheduler, selected_host_strategy, session_storage,
    storage_event_source, ClipboardServiceAdapter, GeolocationServiceAdapter,
    KeyValueStoreAdapter, SchedulerAdapter, StorageEventSourceAdapter,
};
pub use clipboard::WebClipboardService;
pub use geolocation::WebGeolocationService;
pub use storage::events::WebStorageEventSource;
pub use storage::web_storage::WebKeyValueStore;
pub use timers::WebScheduler;
