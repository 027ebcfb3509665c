//! `localStorage` / `sessionStorage`-backed key/value store implementation.
//!
//! The Web Storage API is synchronous, so this adapter maps one-to-one onto
//! [`platform_host::KeyValueStore`].

use platform_host::{KeyValueStore, StorageArea};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Browser key/value store backed by `window.localStorage` or `window.sessionStorage`.
pub struct WebKeyValueStore {
    area: StorageArea,
}

impl WebKeyValueStore {
    /// Store over `window.localStorage`.
    pub const fn local() -> Self {
        Self {
            area: StorageArea::Local,
        }
    }

    /// Store over `window.sessionStorage`.
    pub const fn session() -> Self {
        Self {
            area: StorageArea::Session,
        }
    }

    /// Returns the storage area this store writes to.
    pub const fn area(self) -> StorageArea {
        self.area
    }

    #[cfg(target_arch = "wasm32")]
    fn storage(self) -> Result<web_sys::Storage, String> {
        let name = self.area.api_name();
        let window = web_sys::window().ok_or_else(|| format!("{name} unavailable: no window"))?;
        let storage = match self.area {
            StorageArea::Local => window.local_storage(),
            StorageArea::Session => window.session_storage(),
        };
        storage
            .map_err(|e| format!("{name} unavailable: {e:?}"))?
            .ok_or_else(|| format!("{name} unavailable"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn unsupported(area: StorageArea) -> String {
    format!(
        "{} is only available when compiled for wasm32",
        area.api_name()
    )
}

impl KeyValueStore for WebKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        #[cfg(target_arch = "wasm32")]
        {
            let name = self.area.api_name();
            self.storage()?
                .get_item(key)
                .map_err(|e| format!("{name} get_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let name = self.area.api_name();
            self.storage()?
                .set_item(key, value)
                .map_err(|e| format!("{name} set_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, value);
            Err(unsupported(self.area))
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let name = self.area.api_name();
            self.storage()?
                .remove_item(key)
                .map_err(|e| format!("{name} remove_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        #[cfg(target_arch = "wasm32")]
        {
            let name = self.area.api_name();
            let storage = self.storage()?;
            let len = storage
                .length()
                .map_err(|e| format!("{name} length failed: {e:?}"))?;
            Ok((0..len)
                .filter_map(|index| storage.key(index).ok().flatten())
                .collect())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Ok(Vec::new())
        }
    }
}
