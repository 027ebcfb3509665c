//! Clipboard text access with last-outcome state.

use std::{cell::RefCell, rc::Rc};

use leptos::logging;
use platform_host::{ClipboardService, HostServices, ListenerSet, Subscription};

use crate::HookError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Outcome of the most recent clipboard operation.
pub struct ClipboardSnapshot {
    /// Text last written or read successfully.
    pub content: Option<String>,
    /// Failure of the most recent operation, if it failed.
    pub error: Option<HookError>,
}

#[derive(Clone)]
/// Reads and writes system clipboard text, keeping the last outcome as state.
///
/// Clones share state and listeners.
pub struct ClipboardAccessor {
    service: Rc<dyn ClipboardService>,
    state: Rc<RefCell<ClipboardSnapshot>>,
    listeners: ListenerSet<ClipboardSnapshot>,
}

impl ClipboardAccessor {
    /// Creates an accessor over `service`.
    pub fn new(service: Rc<dyn ClipboardService>) -> Self {
        Self {
            service,
            state: Rc::default(),
            listeners: ListenerSet::default(),
        }
    }

    /// Creates an accessor over the bundle's clipboard service.
    pub fn from_services(services: &HostServices) -> Self {
        Self::new(Rc::clone(&services.clipboard))
    }

    /// Writes `text` to the clipboard. On success `content` becomes `text`; on failure only
    /// `error` changes.
    pub async fn copy_to_clipboard(&self, text: &str) {
        match self.service.write_text(text).await {
            Ok(()) => self.update(|state| {
                state.content = Some(text.to_string());
                state.error = None;
            }),
            Err(err) => {
                logging::warn!("clipboard write failed: {err}");
                self.update(|state| state.error = Some(HookError::ClipboardWrite));
            }
        }
    }

    /// Reads clipboard text into `content`.
    pub async fn read_from_clipboard(&self) {
        match self.service.read_text().await {
            Ok(text) => self.update(|state| {
                state.content = Some(text);
                state.error = None;
            }),
            Err(err) => {
                logging::warn!("clipboard read failed: {err}");
                self.update(|state| state.error = Some(HookError::ClipboardRead));
            }
        }
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> ClipboardSnapshot {
        self.state.borrow().clone()
    }

    /// Registers `listener` for every state change.
    pub fn subscribe(&self, listener: impl Fn(&ClipboardSnapshot) + 'static) -> Subscription {
        self.listeners.subscribe(listener)
    }

    fn update(&self, apply: impl FnOnce(&mut ClipboardSnapshot)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            apply(&mut state);
            state.clone()
        };
        self.listeners.notify(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::MemoryClipboardService;
    use pretty_assertions::assert_eq;

    use super::*;

    fn accessor() -> (ClipboardAccessor, MemoryClipboardService) {
        let service = MemoryClipboardService::default();
        (ClipboardAccessor::new(Rc::new(service.clone())), service)
    }

    #[test]
    fn copy_success_sets_content_and_clears_error() {
        let (accessor, service) = accessor();
        service.deny_reads(true);
        block_on(accessor.read_from_clipboard());
        assert_eq!(accessor.snapshot().error, Some(HookError::ClipboardRead));

        block_on(accessor.copy_to_clipboard("hi"));
        assert_eq!(
            accessor.snapshot(),
            ClipboardSnapshot {
                content: Some("hi".to_string()),
                error: None,
            }
        );
        assert_eq!(service.contents().as_deref(), Some("hi"));
    }

    #[test]
    fn copy_failure_keeps_previous_content() {
        let (accessor, service) = accessor();
        block_on(accessor.copy_to_clipboard("first"));
        service.deny_writes(true);
        block_on(accessor.copy_to_clipboard("second"));

        let snapshot = accessor.snapshot();
        assert_eq!(snapshot.content.as_deref(), Some("first"));
        assert_eq!(
            snapshot.error.map(|err| err.to_string()).as_deref(),
            Some("Failed to copy to clipboard")
        );
    }

    #[test]
    fn read_replaces_content() {
        let (accessor, service) = accessor();
        service.set_contents("from elsewhere");
        block_on(accessor.read_from_clipboard());
        assert_eq!(
            accessor.snapshot().content.as_deref(),
            Some("from elsewhere")
        );
    }

    #[test]
    fn listeners_see_each_outcome() {
        let (accessor, service) = accessor();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _subscription = accessor.subscribe(move |snapshot: &ClipboardSnapshot| {
            sink.borrow_mut().push(snapshot.error.is_some())
        });

        block_on(accessor.copy_to_clipboard("a"));
        service.deny_writes(true);
        block_on(accessor.copy_to_clipboard("b"));
        assert_eq!(*seen.borrow(), vec![false, true]);
    }
}
