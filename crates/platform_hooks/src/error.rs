//! Error values recorded in hook state.

use platform_host::{GeolocationError, GeolocationErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Broad failure categories shared by every hook.
pub enum ErrorKind {
    /// The host does not expose the capability at all.
    CapabilityUnavailable,
    /// The platform call failed or the user refused it.
    PlatformFailure,
    /// A storage read, write, or removal failed.
    StorageIo,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failure recorded in a hook's `error` field.
///
/// Hooks never return these to callers; the `Display` text is the message exposed to views.
pub enum HookError {
    /// Clipboard write was rejected.
    #[error("Failed to copy to clipboard")]
    ClipboardWrite,
    /// Clipboard read was rejected.
    #[error("Failed to read from clipboard")]
    ClipboardRead,
    /// The host has no geolocation capability.
    #[error("Geolocation is not supported by your browser")]
    GeolocationUnsupported,
    /// A position request failed; the platform message is kept verbatim.
    #[error("{message}")]
    Geolocation {
        /// Platform failure category.
        code: GeolocationErrorCode,
        /// Platform-supplied message.
        message: String,
    },
    /// Durable storage write failed.
    #[error("Failed to write to localStorage")]
    LocalWrite,
    /// Durable storage enumeration failed or held an unparsable entry.
    #[error("Failed to read from localStorage")]
    LocalRead,
    /// Durable storage removal through `clear` failed.
    #[error("Failed to clear localStorage")]
    LocalClear,
    /// Durable storage removal through `delete_key` failed.
    #[error("Failed to delete key from localStorage")]
    LocalDelete,
    /// Session storage write failed.
    #[error("Failed to write to sessionStorage")]
    SessionWrite,
    /// Session storage enumeration failed.
    #[error("Failed to read from sessionStorage")]
    SessionRead,
    /// Session storage removal failed.
    #[error("Failed to clear sessionStorage")]
    SessionClear,
}

impl HookError {
    /// Returns the failure category.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::GeolocationUnsupported => ErrorKind::CapabilityUnavailable,
            Self::ClipboardWrite | Self::ClipboardRead | Self::Geolocation { .. } => {
                ErrorKind::PlatformFailure
            }
            Self::LocalWrite
            | Self::LocalRead
            | Self::LocalClear
            | Self::LocalDelete
            | Self::SessionWrite
            | Self::SessionRead
            | Self::SessionClear => ErrorKind::StorageIo,
        }
    }
}

impl From<GeolocationError> for HookError {
    fn from(err: GeolocationError) -> Self {
        Self::Geolocation {
            code: err.code,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_fixed_messages() {
        assert_eq!(
            HookError::ClipboardWrite.to_string(),
            "Failed to copy to clipboard"
        );
        assert_eq!(
            HookError::LocalDelete.to_string(),
            "Failed to delete key from localStorage"
        );
        assert_eq!(
            HookError::SessionClear.to_string(),
            "Failed to clear sessionStorage"
        );
        assert_eq!(
            HookError::GeolocationUnsupported.to_string(),
            "Geolocation is not supported by your browser"
        );
    }

    #[test]
    fn geolocation_errors_keep_platform_message() {
        let err = HookError::from(GeolocationError::new(
            GeolocationErrorCode::Timeout,
            "Timeout expired",
        ));
        assert_eq!(err.to_string(), "Timeout expired");
        assert_eq!(err.kind(), ErrorKind::PlatformFailure);
    }

    #[test]
    fn kinds_group_failures() {
        assert_eq!(
            HookError::GeolocationUnsupported.kind(),
            ErrorKind::CapabilityUnavailable
        );
        assert_eq!(
            HookError::from(GeolocationError::new(
                GeolocationErrorCode::PermissionDenied,
                "User denied Geolocation",
            ))
            .kind(),
            ErrorKind::PlatformFailure
        );
        assert_eq!(HookError::LocalWrite.kind(), ErrorKind::StorageIo);
        assert_eq!(HookError::ClipboardRead.kind(), ErrorKind::PlatformFailure);
    }
}
