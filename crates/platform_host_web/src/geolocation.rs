//! Geolocation API adapter backed by `navigator.geolocation`.

use platform_host::{
    GeolocationError, GeolocationService, PositionCallback, PositionErrorCallback,
    PositionOptions, WatchId,
};

#[derive(Clone, Default)]
/// Browser geolocation adapter.
///
/// Watch callbacks are owned by the adapter until [`GeolocationService::clear_watch`] so the
/// browser can keep invoking them.
pub struct WebGeolocationService {
    #[cfg(target_arch = "wasm32")]
    watches: std::rc::Rc<std::cell::RefCell<std::collections::HashMap<i32, imp::WatchClosures>>>,
}

impl std::fmt::Debug for WebGeolocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebGeolocationService").finish_non_exhaustive()
    }
}

impl GeolocationService for WebGeolocationService {
    fn is_supported(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            imp::geolocation().is_some()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    fn get_current_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) {
        #[cfg(target_arch = "wasm32")]
        {
            imp::get_current_position(on_success, on_error, options);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (on_success, options);
            on_error(unsupported());
        }
    }

    fn watch_position(
        &self,
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> Result<WatchId, GeolocationError> {
        #[cfg(target_arch = "wasm32")]
        {
            let (id, closures) = imp::watch_position(on_success, on_error, options)?;
            self.watches.borrow_mut().insert(id, closures);
            Ok(WatchId(id))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (on_success, on_error, options);
            Err(unsupported())
        }
    }

    fn clear_watch(&self, id: WatchId) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(geolocation) = imp::geolocation() {
                geolocation.clear_watch(id.0);
            }
            self.watches.borrow_mut().remove(&id.0);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = id;
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn unsupported() -> GeolocationError {
    GeolocationError::new(
        platform_host::GeolocationErrorCode::PositionUnavailable,
        "Geolocation API is only available when compiled for wasm32",
    )
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use js_sys::{Function, Reflect};
    use platform_host::{
        GeoPosition, GeolocationError, GeolocationErrorCode, PositionCallback,
        PositionErrorCallback, PositionOptions,
    };
    use wasm_bindgen::{closure::Closure, JsCast, JsValue};

    pub struct WatchClosures {
        _success: Closure<dyn FnMut(JsValue)>,
        _error: Closure<dyn FnMut(JsValue)>,
    }

    pub fn geolocation() -> Option<web_sys::Geolocation> {
        let navigator = web_sys::window()?.navigator();
        let value = Reflect::get(&navigator, &JsValue::from_str("geolocation")).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
        Some(value.unchecked_into())
    }

    fn number(target: &JsValue, field: &str) -> Option<f64> {
        Reflect::get(target, &JsValue::from_str(field))
            .ok()
            .and_then(|value| value.as_f64())
    }

    fn position_from_js(value: &JsValue) -> Option<GeoPosition> {
        let coords = Reflect::get(value, &JsValue::from_str("coords")).ok()?;
        Some(GeoPosition {
            latitude: number(&coords, "latitude")?,
            longitude: number(&coords, "longitude")?,
            accuracy: number(&coords, "accuracy")?,
        })
    }

    fn error_from_js(value: &JsValue) -> GeolocationError {
        let code = number(value, "code").unwrap_or(0.0) as u16;
        let message = Reflect::get(value, &JsValue::from_str("message"))
            .ok()
            .and_then(|message| message.as_string())
            .unwrap_or_else(|| format!("{value:?}"));
        GeolocationError::new(GeolocationErrorCode::from_code(code), message)
    }

    fn options_to_js(
        options: &PositionOptions,
    ) -> Result<web_sys::PositionOptions, GeolocationError> {
        serde_wasm_bindgen::to_value(options)
            .map(|value| value.unchecked_into::<web_sys::PositionOptions>())
            .map_err(|e| platform_error(format!("invalid position options: {e}")))
    }

    fn platform_error(message: String) -> GeolocationError {
        GeolocationError::new(GeolocationErrorCode::Unknown, message)
    }

    fn success_handler(
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
    ) -> impl FnMut(JsValue) {
        move |value: JsValue| match position_from_js(&value) {
            Some(position) => on_success(position),
            None => on_error(platform_error("position fix had no coordinates".to_string())),
        }
    }

    pub fn get_current_position(
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) {
        let Some(geolocation) = geolocation() else {
            on_error(platform_error("navigator.geolocation is unavailable".to_string()));
            return;
        };
        let options = match options_to_js(options) {
            Ok(options) => options,
            Err(err) => {
                on_error(err);
                return;
            }
        };

        let error_callback = {
            let on_error = on_error.clone();
            Closure::once_into_js(move |value: JsValue| on_error(error_from_js(&value)))
        };
        let mut handle_success = success_handler(on_success, on_error.clone());
        let success_callback = Closure::once_into_js(move |value: JsValue| handle_success(value));

        if let Err(err) = geolocation.get_current_position_with_error_callback_and_options(
            success_callback.unchecked_ref::<Function>(),
            Some(error_callback.unchecked_ref::<Function>()),
            &options,
        ) {
            on_error(platform_error(format!("getCurrentPosition failed: {err:?}")));
        }
    }

    pub fn watch_position(
        on_success: PositionCallback,
        on_error: PositionErrorCallback,
        options: &PositionOptions,
    ) -> Result<(i32, WatchClosures), GeolocationError> {
        let geolocation = geolocation()
            .ok_or_else(|| platform_error("navigator.geolocation is unavailable".to_string()))?;
        let options = options_to_js(options)?;

        let error_callback = {
            let on_error = on_error.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
                on_error(error_from_js(&value))
            })
        };
        let success_callback =
            Closure::<dyn FnMut(JsValue)>::new(success_handler(on_success, on_error));

        let id = geolocation
            .watch_position_with_error_callback_and_options(
                success_callback.as_ref().unchecked_ref(),
                Some(error_callback.as_ref().unchecked_ref()),
                &options,
            )
            .map_err(|e| platform_error(format!("watchPosition failed: {e:?}")))?;

        Ok((
            id,
            WatchClosures {
                _success: success_callback,
                _error: error_callback,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use platform_host::{GeoPosition, GeolocationErrorCode};

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_geolocation_is_unsupported_and_fails_requests() {
        let service = WebGeolocationService::default();
        assert!(!service.is_supported());

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        service.get_current_position(
            Rc::new(|_: GeoPosition| {}),
            Rc::new(move |err: GeolocationError| *sink.borrow_mut() = Some(err.code)),
            &PositionOptions::default(),
        );
        assert_eq!(
            *seen.borrow(),
            Some(GeolocationErrorCode::PositionUnavailable)
        );
        assert!(service
            .watch_position(
                Rc::new(|_: GeoPosition| {}),
                Rc::new(|_: GeolocationError| {}),
                &PositionOptions::default(),
            )
            .is_err());
    }
}
