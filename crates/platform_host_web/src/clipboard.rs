//! Async Clipboard API adapter.

use platform_host::{ClipboardFuture, ClipboardService};

#[derive(Debug, Clone, Copy, Default)]
/// Browser clipboard adapter backed by `navigator.clipboard`.
///
/// The API is looked up per call, so insecure contexts (where `navigator.clipboard` is absent)
/// surface as errors instead of JS exceptions.
pub struct WebClipboardService;

impl ClipboardService for WebClipboardService {
    fn write_text<'a>(&'a self, text: &'a str) -> ClipboardFuture<'a, Result<(), String>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                imp::call_clipboard("writeText", Some(text))
                    .await
                    .map(|_| ())
                    .map_err(|e| format!("clipboard write failed: {e}"))
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = text;
                Err(unsupported())
            }
        })
    }

    fn read_text<'a>(&'a self) -> ClipboardFuture<'a, Result<String, String>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                let value = imp::call_clipboard("readText", None)
                    .await
                    .map_err(|e| format!("clipboard read failed: {e}"))?;
                value
                    .as_string()
                    .ok_or_else(|| "clipboard read returned non-text data".to_string())
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                Err(unsupported())
            }
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn unsupported() -> String {
    "Clipboard API is only available when compiled for wasm32".to_string()
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use js_sys::{Function, Promise, Reflect};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    pub async fn call_clipboard(method: &str, arg: Option<&str>) -> Result<JsValue, String> {
        let navigator = web_sys::window()
            .ok_or_else(|| "window unavailable".to_string())?
            .navigator();
        let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard"))
            .map_err(|e| format!("{e:?}"))?;
        if clipboard.is_undefined() || clipboard.is_null() {
            return Err("navigator.clipboard is unavailable".to_string());
        }

        let function = Reflect::get(&clipboard, &JsValue::from_str(method))
            .map_err(|e| format!("{e:?}"))?
            .dyn_into::<Function>()
            .map_err(|_| format!("navigator.clipboard.{method} is not a function"))?;
        let returned = match arg {
            Some(arg) => function.call1(&clipboard, &JsValue::from_str(arg)),
            None => function.call0(&clipboard),
        }
        .map_err(|e| format!("{e:?}"))?;
        let promise = returned
            .dyn_into::<Promise>()
            .map_err(|_| format!("navigator.clipboard.{method} did not return a promise"))?;

        JsFuture::from(promise).await.map_err(|e| format!("{e:?}"))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_clipboard_reports_unsupported() {
        let service: &dyn ClipboardService = &WebClipboardService;
        assert_eq!(
            block_on(service.write_text("x")).expect_err("write should fail"),
            "Clipboard API is only available when compiled for wasm32"
        );
        assert!(block_on(service.read_text()).is_err());
    }
}
