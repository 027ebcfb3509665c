//! Storage-domain contracts: key/value areas and cross-context change notifications.

pub mod events;
pub mod key_value;

pub use events::{
    MemoryStorageEventSource, NoopStorageEventSource, StorageArea, StorageChangeEvent,
    StorageChangeListener, StorageEventSource,
};
pub use key_value::{KeyValueStore, MemoryKeyValueStore, NoopKeyValueStore, RemoteContextStore};
