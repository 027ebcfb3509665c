//! Window `storage` event adapter.

use platform_host::{StorageChangeListener, StorageEventSource, Subscription};

#[derive(Debug, Clone, Copy, Default)]
/// Browser storage-change source backed by the window `storage` event.
///
/// The browser raises the event only for changes made by other browsing contexts.
pub struct WebStorageEventSource;

impl StorageEventSource for WebStorageEventSource {
    fn subscribe(&self, listener: StorageChangeListener) -> Result<Subscription, String> {
        #[cfg(target_arch = "wasm32")]
        {
            imp::subscribe(listener)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = listener;
            Ok(Subscription::noop())
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use platform_host::{StorageArea, StorageChangeEvent, StorageChangeListener, Subscription};
    use wasm_bindgen::{closure::Closure, JsCast, JsValue};

    pub fn subscribe(listener: StorageChangeListener) -> Result<Subscription, String> {
        let window = web_sys::window().ok_or_else(|| "window unavailable".to_string())?;

        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Some(event) = event.dyn_ref::<web_sys::StorageEvent>() else {
                return;
            };
            let Some(area) = event_area(event) else {
                return;
            };
            listener(&StorageChangeEvent {
                key: event.key(),
                old_value: event.old_value(),
                new_value: event.new_value(),
                area,
            });
        });

        window
            .add_event_listener_with_callback("storage", callback.as_ref().unchecked_ref())
            .map_err(|e| format!("storage listener registration failed: {e:?}"))?;

        Ok(Subscription::new(move || {
            if let Some(window) = web_sys::window() {
                let _ = window.remove_event_listener_with_callback(
                    "storage",
                    callback.as_ref().unchecked_ref(),
                );
            }
        }))
    }

    fn event_area(event: &web_sys::StorageEvent) -> Option<StorageArea> {
        let area = event.storage_area()?;
        let window = web_sys::window()?;
        let area_value: &JsValue = area.as_ref();
        let same = |candidate: Option<web_sys::Storage>| {
            candidate.is_some_and(|storage| {
                let storage_value: &JsValue = storage.as_ref();
                storage_value == area_value
            })
        };
        if same(window.session_storage().ok().flatten()) {
            Some(StorageArea::Session)
        } else if same(window.local_storage().ok().flatten()) {
            Some(StorageArea::Local)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use platform_host::StorageChangeEvent;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_subscription_is_inert() {
        let subscription = WebStorageEventSource
            .subscribe(Rc::new(|_: &StorageChangeEvent| {}))
            .expect("subscribe");
        subscription.cancel();
    }
}
