//! Device position tracking with one-shot and watch modes.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use leptos::logging;
use platform_host::{
    GeoPosition, GeolocationError, GeolocationService, HostServices, ListenerSet, Subscription,
    WatchId,
};

use crate::{GeolocationOptions, HookError};

#[derive(Debug, Clone, Default, PartialEq)]
/// Latest position and failure reported to a tracker.
pub struct GeolocationSnapshot {
    /// Most recent fix; replaced wholesale.
    pub position: Option<GeoPosition>,
    /// Most recent failure. A later fix does not clear it.
    pub error: Option<HookError>,
}

struct TrackerInner {
    service: Rc<dyn GeolocationService>,
    options: Cell<GeolocationOptions>,
    state: RefCell<GeolocationSnapshot>,
    active: Cell<bool>,
    // Bumped on every stop so callbacks from earlier requests are ignored.
    generation: Cell<u64>,
    watch: Cell<Option<WatchId>>,
    listeners: ListenerSet<GeolocationSnapshot>,
}

#[derive(Clone)]
/// Requests device position from the host geolocation service.
///
/// Nothing is requested until [`GeolocationTracker::activate`]. In watch mode exactly one
/// platform watch is held while active; changing options replaces it.
pub struct GeolocationTracker {
    inner: Rc<TrackerInner>,
}

impl GeolocationTracker {
    /// Creates an inactive tracker.
    pub fn new(service: Rc<dyn GeolocationService>, options: GeolocationOptions) -> Self {
        Self {
            inner: Rc::new(TrackerInner {
                service,
                options: Cell::new(options),
                state: RefCell::default(),
                active: Cell::new(false),
                generation: Cell::new(0),
                watch: Cell::new(None),
                listeners: ListenerSet::default(),
            }),
        }
    }

    /// Creates an inactive tracker over the bundle's geolocation service.
    pub fn from_services(services: &HostServices, options: GeolocationOptions) -> Self {
        Self::new(Rc::clone(&services.geolocation), options)
    }

    /// Starts requesting positions. Calling it while active does nothing.
    pub fn activate(&self) {
        if self.inner.active.replace(true) {
            return;
        }
        self.start();
    }

    /// Stops the watch, if any; callbacks that arrive afterwards are ignored.
    pub fn deactivate(&self) {
        if self.inner.active.replace(false) {
            self.stop();
        }
    }

    /// Returns whether the tracker is active.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Returns the current options.
    pub fn options(&self) -> GeolocationOptions {
        self.inner.options.get()
    }

    /// Replaces the options. While active, an outstanding watch is cleared and the request is
    /// issued again with the new options.
    pub fn set_options(&self, options: GeolocationOptions) {
        if self.inner.options.replace(options) == options {
            return;
        }
        if self.is_active() {
            self.stop();
            self.start();
        }
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> GeolocationSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Registers `listener` for every state change.
    pub fn subscribe(&self, listener: impl Fn(&GeolocationSnapshot) + 'static) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    fn start(&self) {
        let inner = &self.inner;
        if !inner.service.is_supported() {
            update(inner, |state| {
                state.error = Some(HookError::GeolocationUnsupported)
            });
            return;
        }

        let generation = inner.generation.get();
        let weak = Rc::downgrade(inner);
        let on_success = {
            let weak = Weak::clone(&weak);
            Rc::new(move |position: GeoPosition| {
                if let Some(inner) = live(&weak, generation) {
                    update(&inner, |state| state.position = Some(position));
                }
            })
        };
        let on_error = Rc::new(move |err: GeolocationError| {
            if let Some(inner) = live(&weak, generation) {
                update(&inner, |state| state.error = Some(err.into()));
            }
        });

        let options = inner.options.get();
        let position_options = options.to_position_options();
        if options.watch {
            match inner
                .service
                .watch_position(on_success, on_error, &position_options)
            {
                Ok(id) => inner.watch.set(Some(id)),
                Err(err) => {
                    logging::warn!("geolocation watch registration failed: {err}");
                    update(inner, |state| state.error = Some(err.into()));
                }
            }
        } else {
            inner
                .service
                .get_current_position(on_success, on_error, &position_options);
        }
    }

    fn stop(&self) {
        let inner = &self.inner;
        inner.generation.set(inner.generation.get().wrapping_add(1));
        if let Some(id) = inner.watch.take() {
            inner.service.clear_watch(id);
        }
    }
}

fn live(weak: &Weak<TrackerInner>, generation: u64) -> Option<Rc<TrackerInner>> {
    let inner = weak.upgrade()?;
    (inner.active.get() && inner.generation.get() == generation).then_some(inner)
}

fn update(inner: &TrackerInner, apply: impl FnOnce(&mut GeolocationSnapshot)) {
    let snapshot = {
        let mut state = inner.state.borrow_mut();
        apply(&mut state);
        state.clone()
    };
    inner.listeners.notify(&snapshot);
}
