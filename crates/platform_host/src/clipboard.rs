//! Clipboard service contracts and in-memory/no-op adapters.

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
};

/// Object-safe boxed future used by [`ClipboardService`].
pub type ClipboardFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for reading and writing system clipboard text.
pub trait ClipboardService {
    /// Writes `text` to the clipboard.
    fn write_text<'a>(&'a self, text: &'a str) -> ClipboardFuture<'a, Result<(), String>>;

    /// Reads the current clipboard text.
    fn read_text<'a>(&'a self) -> ClipboardFuture<'a, Result<String, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Clipboard adapter for hosts without clipboard access; every call fails.
pub struct NoopClipboardService;

impl ClipboardService for NoopClipboardService {
    fn write_text<'a>(&'a self, _text: &'a str) -> ClipboardFuture<'a, Result<(), String>> {
        Box::pin(async { Err("clipboard unavailable on this host".to_string()) })
    }

    fn read_text<'a>(&'a self) -> ClipboardFuture<'a, Result<String, String>> {
        Box::pin(async { Err("clipboard unavailable on this host".to_string()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory clipboard with switchable failures, for tests and headless hosts.
///
/// Clones share contents and failure switches.
pub struct MemoryClipboardService {
    contents: Rc<RefCell<Option<String>>>,
    deny_writes: Rc<Cell<bool>>,
    deny_reads: Rc<Cell<bool>>,
}

impl MemoryClipboardService {
    /// Returns the current clipboard contents.
    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Replaces clipboard contents as if another program had copied `text`.
    pub fn set_contents(&self, text: impl Into<String>) {
        *self.contents.borrow_mut() = Some(text.into());
    }

    /// Makes subsequent writes fail with a permission error.
    pub fn deny_writes(&self, deny: bool) {
        self.deny_writes.set(deny);
    }

    /// Makes subsequent reads fail with a permission error.
    pub fn deny_reads(&self, deny: bool) {
        self.deny_reads.set(deny);
    }
}

impl ClipboardService for MemoryClipboardService {
    fn write_text<'a>(&'a self, text: &'a str) -> ClipboardFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if self.deny_writes.get() {
                return Err("clipboard write permission denied".to_string());
            }
            *self.contents.borrow_mut() = Some(text.to_string());
            Ok(())
        })
    }

    fn read_text<'a>(&'a self) -> ClipboardFuture<'a, Result<String, String>> {
        Box::pin(async move {
            if self.deny_reads.get() {
                return Err("clipboard read permission denied".to_string());
            }
            Ok(self.contents.borrow().clone().unwrap_or_default())
        })
    }
}
