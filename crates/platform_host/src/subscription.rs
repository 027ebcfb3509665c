//! RAII subscription handles and a small listener registry shared by host adapters and hooks.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// Handle for a registered callback, timer, or platform listener.
///
/// Dropping the handle (or calling [`Subscription::cancel`]) releases the underlying registration.
/// [`Subscription::detach`] releases the handle while leaving the registration running.
#[must_use = "dropping a subscription cancels it; call `detach` to keep it running"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `cancel` when dropped or cancelled.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
            detach: None,
        }
    }

    /// Creates a subscription with nothing to release.
    pub fn noop() -> Self {
        Self {
            cancel: None,
            detach: None,
        }
    }

    /// Sets the action run by [`Subscription::detach`] instead of cancellation.
    pub fn on_detach(mut self, detach: impl FnOnce() + 'static) -> Self {
        self.detach = Some(Box::new(detach));
        self
    }

    /// Releases the registration now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Drops the handle without cancelling the registration.
    pub fn detach(mut self) {
        self.cancel = None;
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

type Listener<T> = Rc<dyn Fn(&T)>;

/// Ordered set of listeners notified with a shared value.
///
/// Listeners may subscribe or unsubscribe from inside a notification; each notification
/// delivers to the listeners registered when it started.
pub struct ListenerSet<T: 'static> {
    inner: Rc<ListenerSetInner<T>>,
}

struct ListenerSetInner<T: 'static> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
}

impl<T: 'static> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(ListenerSetInner {
                next_id: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl<T: 'static> Clone for ListenerSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> ListenerSet<T> {
    /// Registers a listener; it stays registered until the returned handle is dropped.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.wrapping_add(1));
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .listeners
                    .borrow_mut()
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Delivers `value` to every registered listener in registration order.
    pub fn notify(&self, value: &T) {
        let listeners = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(value);
        }
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Returns whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_subscription_unregisters_listener() {
        let set = ListenerSet::<u32>::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = set.subscribe(move |value| sink.borrow_mut().push(*value));

        set.notify(&1);
        drop(sub);
        set.notify(&2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert!(set.is_empty());
    }

    #[test]
    fn detach_keeps_listener_registered() {
        let set = ListenerSet::<u32>::default();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        set.subscribe(move |_| counter.set(counter.get() + 1))
            .detach();

        set.notify(&7);
        set.notify(&8);
        assert_eq!(count.get(), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn listener_may_subscribe_during_notification() {
        let set = ListenerSet::<u32>::default();
        let nested = set.clone();
        let held = Rc::new(RefCell::new(Vec::new()));
        let holder = Rc::clone(&held);
        set.subscribe(move |_| holder.borrow_mut().push(nested.subscribe(|_| {})))
            .detach();

        set.notify(&1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn detach_runs_detach_action_not_cancel() {
        let cancelled = Rc::new(Cell::new(false));
        let detached = Rc::new(Cell::new(false));
        let (c, d) = (Rc::clone(&cancelled), Rc::clone(&detached));
        Subscription::new(move || c.set(true))
            .on_detach(move || d.set(true))
            .detach();

        assert!(!cancelled.get());
        assert!(detached.get());
    }
}
