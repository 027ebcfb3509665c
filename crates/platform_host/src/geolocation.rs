//! Geolocation service contracts, position models, and an in-memory adapter.

use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use serde::{Deserialize, Serialize};

/// Default position-request timeout in milliseconds.
pub const DEFAULT_POSITION_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A single position fix.
pub struct GeoPosition {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Options passed to the platform position request.
pub struct PositionOptions {
    /// Requests the most accurate fix the device can provide.
    pub enable_high_accuracy: bool,
    /// Maximum time allowed for a fix, in milliseconds.
    #[serde(rename = "timeout")]
    pub timeout_ms: u32,
    /// Maximum age of a cached fix the platform may return, in milliseconds.
    #[serde(rename = "maximumAge")]
    pub maximum_age_ms: u32,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout_ms: DEFAULT_POSITION_TIMEOUT_MS,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Platform failure categories reported by position requests.
pub enum GeolocationErrorCode {
    /// The user or policy refused location access.
    PermissionDenied,
    /// The device could not determine a position.
    PositionUnavailable,
    /// The request exceeded its timeout.
    Timeout,
    /// Any other platform failure.
    Unknown,
}

impl GeolocationErrorCode {
    /// Maps the numeric W3C `GeolocationPositionError.code`.
    pub const fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Failure reported by a position request, carrying the platform message verbatim.
pub struct GeolocationError {
    /// Failure category.
    pub code: GeolocationErrorCode,
    /// Human-readable platform message.
    pub message: String,
}

impl GeolocationError {
    /// Creates an error with the given category and message.
    pub fn new(code: GeolocationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GeolocationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifier of an active position watch.
pub struct WatchId(pub i32);

/// Callback receiving a successful position fix.
pub type PositionCallback = Rc<dyn Fn(GeoPosition)>;
/// Callback receiving a position-request failure.
pub type PositionErrorCallback = Rc<dyn Fn(GeolocationError)>;

/// Host service for device position.
pub trait GeolocationService {
    /// Returns whether the host exposes a geolocation capability at all.
    fn is_supported(&self) -> bool;

    /// Requests a single position fix; exactly one of the callbacks eventually runs.
    fn get_current_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    );

    /// Registers a continuous watch delivering every fix until [`GeolocationService::clear_watch`].
    ///
    /// # Errors
    ///
    /// Returns an error when the platform refuses to register the watch.
    fn watch_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> Result<WatchId, GeolocationError>;

    /// Cancels a watch. Unknown ids are ignored.
    fn clear_watch(&self, id: WatchId);
}

#[derive(Debug, Clone, Copy, Default)]
/// Geolocation adapter for hosts without a position capability.
pub struct NoopGeolocationService;

impl GeolocationService for NoopGeolocationService {
    fn is_supported(&self) -> bool {
        false
    }

    fn get_current_position(
        &self,
        _on_success: PositionCallback,
        on_error: PositionErrorCallback,
        _options: &PositionOptions,
    ) {
        on_error(unsupported());
    }

    fn watch_position(
        &self,
        _on_success: PositionCallback,
        _on_error: PositionErrorCallback,
        _options: &PositionOptions,
    ) -> Result<WatchId, GeolocationError> {
        Err(unsupported())
    }

    fn clear_watch(&self, _id: WatchId) {}
}

fn unsupported() -> GeolocationError {
    GeolocationError::new(
        GeolocationErrorCode::PositionUnavailable,
        "geolocation unavailable on this host",
    )
}

struct PendingRequest {
    on_success: PositionCallback,
    on_error: PositionErrorCallback,
}

struct ActiveWatch {
    on_success: PositionCallback,
    on_error: PositionErrorCallback,
    options: PositionOptions,
}

struct MemoryGeolocationState {
    supported: bool,
    next_watch_id: i32,
    pending: Vec<PendingRequest>,
    watches: BTreeMap<WatchId, ActiveWatch>,
    one_shot_requests: usize,
    watch_registrations: usize,
    last_options: Option<PositionOptions>,
}

#[derive(Clone)]
/// Scripted geolocation host for tests and simulations.
///
/// One-shot requests stay pending until [`MemoryGeolocationService::resolve_pending`] or
/// [`MemoryGeolocationService::fail_pending`]; watches receive every
/// [`MemoryGeolocationService::push_fix`] / [`MemoryGeolocationService::push_error`].
pub struct MemoryGeolocationService {
    state: Rc<RefCell<MemoryGeolocationState>>,
}

impl Default for MemoryGeolocationService {
    fn default() -> Self {
        Self::with_support(true)
    }
}

impl MemoryGeolocationService {
    /// Creates a scripted host that reports the capability as present or absent.
    pub fn with_support(supported: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryGeolocationState {
                supported,
                next_watch_id: 1,
                pending: Vec::new(),
                watches: BTreeMap::new(),
                one_shot_requests: 0,
                watch_registrations: 0,
                last_options: None,
            })),
        }
    }

    /// Completes every pending one-shot request with `position`.
    pub fn resolve_pending(&self, position: GeoPosition) {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        for request in pending {
            (request.on_success)(position);
        }
    }

    /// Fails every pending one-shot request with `error`.
    pub fn fail_pending(&self, error: GeolocationError) {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        for request in pending {
            (request.on_error)(error.clone());
        }
    }

    /// Delivers `position` to every active watch.
    pub fn push_fix(&self, position: GeoPosition) {
        let callbacks = self
            .state
            .borrow()
            .watches
            .values()
            .map(|watch| Rc::clone(&watch.on_success))
            .collect::<Vec<_>>();
        for callback in callbacks {
            callback(position);
        }
    }

    /// Delivers `error` to every active watch.
    pub fn push_error(&self, error: GeolocationError) {
        let callbacks = self
            .state
            .borrow()
            .watches
            .values()
            .map(|watch| Rc::clone(&watch.on_error))
            .collect::<Vec<_>>();
        for callback in callbacks {
            callback(error.clone());
        }
    }

    /// Returns the number of currently registered watches.
    pub fn active_watch_count(&self) -> usize {
        self.state.borrow().watches.len()
    }

    /// Returns the options of each active watch, in registration order.
    pub fn active_watch_options(&self) -> Vec<PositionOptions> {
        self.state
            .borrow()
            .watches
            .values()
            .map(|watch| watch.options)
            .collect()
    }

    /// Returns how many watches were ever registered.
    pub fn watch_registrations(&self) -> usize {
        self.state.borrow().watch_registrations
    }

    /// Returns how many one-shot requests were ever issued.
    pub fn one_shot_requests(&self) -> usize {
        self.state.borrow().one_shot_requests
    }

    /// Returns the options passed to the most recent request or watch.
    pub fn last_options(&self) -> Option<PositionOptions> {
        self.state.borrow().last_options
    }
}

impl GeolocationService for MemoryGeolocationService {
    fn is_supported(&self) -> bool {
        self.state.borrow().supported
    }

    fn get_current_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) {
        let mut state = self.state.borrow_mut();
        state.one_shot_requests += 1;
        state.last_options = Some(*options);
        state.pending.push(PendingRequest {
            on_success,
            on_error,
        });
    }

    fn watch_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> Result<WatchId, GeolocationError> {
        let mut state = self.state.borrow_mut();
        let id = WatchId(state.next_watch_id);
        state.next_watch_id += 1;
        state.watch_registrations += 1;
        state.last_options = Some(*options);
        state.watches.insert(
            id,
            ActiveWatch {
                on_success,
                on_error,
                options: *options,
            },
        );
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        self.state.borrow_mut().watches.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn fix(latitude: f64) -> GeoPosition {
        GeoPosition {
            latitude,
            longitude: 4.9,
            accuracy: 12.0,
        }
    }

    #[test]
    fn position_options_serialize_with_platform_field_names() {
        let value = serde_json::to_value(PositionOptions::default()).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"enableHighAccuracy": false, "timeout": 10000, "maximumAge": 0})
        );
    }

    #[test]
    fn error_code_maps_w3c_codes() {
        assert_eq!(
            GeolocationErrorCode::from_code(1),
            GeolocationErrorCode::PermissionDenied
        );
        assert_eq!(GeolocationErrorCode::from_code(3), GeolocationErrorCode::Timeout);
        assert_eq!(GeolocationErrorCode::from_code(42), GeolocationErrorCode::Unknown);
    }

    #[test]
    fn memory_service_resolves_one_shot_once() {
        let service = MemoryGeolocationService::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        service.get_current_position(
            Rc::new(move |_: GeoPosition| counter.set(counter.get() + 1)),
            Rc::new(|_: GeolocationError| {}),
            &PositionOptions::default(),
        );

        service.resolve_pending(fix(52.3));
        service.resolve_pending(fix(52.4));
        assert_eq!(hits.get(), 1);
        assert_eq!(service.one_shot_requests(), 1);
    }

    #[test]
    fn cleared_watch_receives_nothing() {
        let service = MemoryGeolocationService::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = service
            .watch_position(
                Rc::new(move |_: GeoPosition| counter.set(counter.get() + 1)),
                Rc::new(|_: GeolocationError| {}),
                &PositionOptions::default(),
            )
            .expect("watch");

        service.push_fix(fix(1.0));
        service.clear_watch(id);
        service.push_fix(fix(2.0));
        assert_eq!(hits.get(), 1);
        assert_eq!(service.active_watch_count(), 0);
    }

    #[test]
    fn noop_service_reports_unsupported() {
        let service = NoopGeolocationService;
        assert!(!service.is_supported());
        assert!(service
            .watch_position(
                Rc::new(|_: GeoPosition| {}),
                Rc::new(|_: GeolocationError| {}),
                &PositionOptions::default(),
            )
            .is_err());
    }
}
