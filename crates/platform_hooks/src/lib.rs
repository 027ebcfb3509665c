//! Browser-integration hooks: clipboard text, device position, and durable/session key-value
//! storage with expiry.
//!
//! The components ([`ClipboardAccessor`], [`GeolocationTracker`], [`LocalStore`],
//! [`SessionStore`]) are framework-free state holders over the [`HostServices`] contracts. The
//! `use_*` functions bind them to Leptos signals and the owner lifecycle.
//!
//! # Example
//!
//! ```rust
//! use platform_hooks::{HostServices, LocalStore};
//!
//! let (services, host) = HostServices::memory(0);
//! let store = LocalStore::from_services(&services);
//! store.activate();
//! store.set_value("token", Some("abc"), 1_000);
//! assert_eq!(store.get_key("token").as_deref(), Some("abc"));
//!
//! host.scheduler.advance(1_000);
//! assert_eq!(store.get_key("token"), None);
//! ```

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod clipboard;
mod config;
mod error;
mod geolocation;
mod local_store;
mod reactive;
mod session_store;

pub use clipboard::{ClipboardAccessor, ClipboardSnapshot};
pub use config::{
    GeolocationOptions, HooksConfig, DEFAULT_EXPIRY_SUFFIX, DEFAULT_SESSION_SWEEP_INTERVAL_MS,
};
pub use error::{ErrorKind, HookError};
pub use geolocation::{GeolocationSnapshot, GeolocationTracker};
pub use local_store::{LocalStore, LocalStoreSnapshot, StoredEntry};
pub use platform_host::{GeoPosition, HostServices, MemoryHost, Subscription};
pub use reactive::{
    provide_host_services, provide_hooks_config, use_clipboard, use_clipboard_with,
    use_geolocation, use_geolocation_from_config, use_geolocation_with, use_host_services,
    use_hooks_config, use_local_storage, use_local_storage_with, use_session_storage,
    use_session_storage_with, UseClipboard, UseGeolocation, UseLocalStorage, UseSessionStorage,
};
pub use session_store::{SessionStore, SessionStoreSnapshot};
