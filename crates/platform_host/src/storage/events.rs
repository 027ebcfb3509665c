//! Storage change notifications raised when another browsing context mutates a storage area.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::subscription::{ListenerSet, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Browser storage area a key/value store or change event belongs to.
pub enum StorageArea {
    /// Durable per-origin storage (`localStorage`).
    Local,
    /// Per-session storage (`sessionStorage`).
    Session,
}

impl StorageArea {
    /// Returns the browser API name of the area for diagnostics.
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One change made to a storage area by another execution context.
pub struct StorageChangeEvent {
    /// Changed key; `None` when the whole area was cleared.
    pub key: Option<String>,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change; `None` when the key was removed.
    pub new_value: Option<String>,
    /// Area the change applies to.
    pub area: StorageArea,
}

/// Callback receiving storage change notifications.
pub type StorageChangeListener = Rc<dyn Fn(&StorageChangeEvent)>;

/// Host service delivering storage change notifications.
pub trait StorageEventSource {
    /// Registers `listener` for changes to any storage area until the handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the host refuses the listener registration.
    fn subscribe(&self, listener: StorageChangeListener) -> Result<Subscription, String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Event source that never raises notifications.
pub struct NoopStorageEventSource;

impl StorageEventSource for NoopStorageEventSource {
    fn subscribe(&self, _listener: StorageChangeListener) -> Result<Subscription, String> {
        Ok(Subscription::noop())
    }
}

#[derive(Clone, Default)]
/// In-process event source whose notifications are raised explicitly.
pub struct MemoryStorageEventSource {
    listeners: ListenerSet<StorageChangeEvent>,
}

impl MemoryStorageEventSource {
    /// Delivers `event` to every subscriber.
    pub fn emit(&self, event: &StorageChangeEvent) {
        self.listeners.notify(event);
    }

    /// Returns the underlying listener registry.
    pub fn listeners(&self) -> &ListenerSet<StorageChangeEvent> {
        &self.listeners
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for MemoryStorageEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorageEventSource")
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

impl StorageEventSource for MemoryStorageEventSource {
    fn subscribe(&self, listener: StorageChangeListener) -> Result<Subscription, String> {
        Ok(self.listeners.subscribe(move |event| listener(event)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn memory_source_delivers_until_unsubscribed() {
        let source = MemoryStorageEventSource::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = source
            .subscribe(Rc::new(move |_: &StorageChangeEvent| {
                counter.set(counter.get() + 1)
            }))
            .expect("subscribe");

        let event = StorageChangeEvent {
            key: Some("k".to_string()),
            old_value: None,
            new_value: Some("v".to_string()),
            area: StorageArea::Local,
        };
        source.emit(&event);
        drop(sub);
        source.emit(&event);

        assert_eq!(hits.get(), 1);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn storage_area_api_names() {
        assert_eq!(StorageArea::Local.api_name(), "localStorage");
        assert_eq!(StorageArea::Session.api_name(), "sessionStorage");
    }
}
