//! Hook configuration.

use platform_host::{PositionOptions, DEFAULT_POSITION_TIMEOUT_MS};
use serde::{Deserialize, Serialize};

/// Default period of the session-store expiry sweep.
pub const DEFAULT_SESSION_SWEEP_INTERVAL_MS: u64 = 10_000;
/// Default suffix of the companion key holding a session entry's expiry.
pub const DEFAULT_EXPIRY_SUFFIX: &str = "_expiry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Options of a [`crate::GeolocationTracker`].
pub struct GeolocationOptions {
    /// Requests the most accurate fix the device can provide.
    pub enable_high_accuracy: bool,
    /// Request timeout; `0` falls back to the default.
    pub timeout_ms: u32,
    /// Maximum age of a cached fix, in milliseconds.
    pub maximum_age_ms: u32,
    /// Keeps a continuous watch instead of a single request.
    pub watch: bool,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout_ms: DEFAULT_POSITION_TIMEOUT_MS,
            maximum_age_ms: 0,
            watch: false,
        }
    }
}

impl GeolocationOptions {
    /// Options for a continuous watch with default accuracy and timeout.
    pub fn watching() -> Self {
        Self {
            watch: true,
            ..Self::default()
        }
    }

    /// Converts to the platform request options. The platform never receives a zero timeout.
    pub fn to_position_options(self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout_ms: if self.timeout_ms == 0 {
                DEFAULT_POSITION_TIMEOUT_MS
            } else {
                self.timeout_ms
            },
            maximum_age_ms: self.maximum_age_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Settings shared by the hooks built from one host bundle.
pub struct HooksConfig {
    /// Period of the session-store expiry sweep, in milliseconds.
    pub session_sweep_interval_ms: u64,
    /// Suffix of the companion key holding a session entry's expiry.
    pub expiry_suffix: String,
    /// Options used by `use_geolocation_from_config`.
    pub geolocation: GeolocationOptions,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            session_sweep_interval_ms: DEFAULT_SESSION_SWEEP_INTERVAL_MS,
            expiry_suffix: DEFAULT_EXPIRY_SUFFIX.to_string(),
            geolocation: GeolocationOptions::default(),
        }
    }
}

impl HooksConfig {
    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when `raw` is not valid JSON for this shape, or when `expiry_suffix` is
    /// empty.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        if config.expiry_suffix.is_empty() {
            return Err("expiry_suffix must not be empty".to_string());
        }
        Ok(config)
    }
}
