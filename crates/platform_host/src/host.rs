//! Shared host-bundle and capability models for browser and headless composition.

use std::rc::Rc;

use crate::{
    ClipboardService, Clock, GeolocationService, KeyValueStore, ManualClock, ManualScheduler,
    MemoryClipboardService, MemoryGeolocationService, MemoryKeyValueStore,
    MemoryStorageEventSource, Scheduler, StorageEventSource,
};

/// Stable host strategy selected for the current build/runtime composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Browser-backed runtime composition.
    Browser,
    /// Composition with placeholder/no-op adapters.
    Stub,
    /// In-memory composition for tests and simulations.
    Memory,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics and runtime inspection.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Stub => "stub",
            Self::Memory => "memory",
        }
    }
}

/// Host availability state for one capability domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityStatus {
    /// Capability is available.
    Available,
    /// Capability is not implemented or not supported on the active host.
    Unavailable,
    /// Capability exists but the platform asks the user before granting it.
    RequiresPermission,
}

impl CapabilityStatus {
    /// Returns whether the capability can be used without a further grant.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Host capability snapshot exposed to hook wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// System clipboard text access.
    pub clipboard: CapabilityStatus,
    /// Device position access.
    pub geolocation: CapabilityStatus,
    /// Durable per-origin key/value storage.
    pub local_storage: CapabilityStatus,
    /// Session-scoped key/value storage.
    pub session_storage: CapabilityStatus,
    /// Cross-context storage change notifications.
    pub storage_events: CapabilityStatus,
}

impl HostCapabilities {
    /// Browser-default capability posture.
    pub const fn browser() -> Self {
        Self {
            clipboard: CapabilityStatus::RequiresPermission,
            geolocation: CapabilityStatus::RequiresPermission,
            local_storage: CapabilityStatus::Available,
            session_storage: CapabilityStatus::Available,
            storage_events: CapabilityStatus::Available,
        }
    }

    /// Stub capability posture.
    pub const fn stub() -> Self {
        Self {
            clipboard: CapabilityStatus::Unavailable,
            geolocation: CapabilityStatus::Unavailable,
            local_storage: CapabilityStatus::Unavailable,
            session_storage: CapabilityStatus::Unavailable,
            storage_events: CapabilityStatus::Unavailable,
        }
    }

    /// In-memory capability posture; everything is available.
    pub const fn memory() -> Self {
        Self {
            clipboard: CapabilityStatus::Available,
            geolocation: CapabilityStatus::Available,
            local_storage: CapabilityStatus::Available,
            session_storage: CapabilityStatus::Available,
            storage_events: CapabilityStatus::Available,
        }
    }
}

/// Runtime-selected host service bundle injected into hooks.
///
/// All environment-specific service selection happens before this bundle is built, which keeps
/// hook logic decoupled from browser adapter details.
#[derive(Clone)]
pub struct HostServices {
    /// System clipboard service.
    pub clipboard: Rc<dyn ClipboardService>,
    /// Device position service.
    pub geolocation: Rc<dyn GeolocationService>,
    /// Durable per-origin key/value store.
    pub local_storage: Rc<dyn KeyValueStore>,
    /// Session-scoped key/value store.
    pub session_storage: Rc<dyn KeyValueStore>,
    /// Cross-context storage change notifications.
    pub storage_events: Rc<dyn StorageEventSource>,
    /// Timer service.
    pub scheduler: Rc<dyn Scheduler>,
    /// Wall-clock source used for timestamps and expiry checks.
    pub clock: Rc<dyn Clock>,
    /// Host availability snapshot.
    pub capabilities: HostCapabilities,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

/// Concrete handles of a [`HostServices::memory`] bundle, for driving simulations.
#[derive(Clone, Default)]
pub struct MemoryHost {
    /// Clipboard contents and failure switches.
    pub clipboard: MemoryClipboardService,
    /// Scripted geolocation host.
    pub geolocation: MemoryGeolocationService,
    /// Durable storage area.
    pub local_storage: MemoryKeyValueStore,
    /// Session storage area.
    pub session_storage: MemoryKeyValueStore,
    /// Change notifications from simulated other contexts.
    pub storage_events: MemoryStorageEventSource,
    /// Simulated-time scheduler; its clock is the bundle clock.
    pub scheduler: ManualScheduler,
}

impl MemoryHost {
    /// Creates an in-memory host whose clock starts at `start_ms`.
    pub fn starting_at(start_ms: u64) -> Self {
        Self {
            scheduler: ManualScheduler::new(ManualClock::starting_at(start_ms)),
            ..Self::default()
        }
    }

    /// Returns the shared simulated clock.
    pub fn clock(&self) -> ManualClock {
        self.scheduler.clock()
    }

    /// Builds a service bundle backed by these handles.
    pub fn services(&self) -> HostServices {
        HostServices {
            clipboard: Rc::new(self.clipboard.clone()),
            geolocation: Rc::new(self.geolocation.clone()),
            local_storage: Rc::new(self.local_storage.clone()),
            session_storage: Rc::new(self.session_storage.clone()),
            storage_events: Rc::new(self.storage_events.clone()),
            scheduler: Rc::new(self.scheduler.clone()),
            clock: Rc::new(self.scheduler.clock()),
            capabilities: HostCapabilities::memory(),
            host_strategy: HostStrategy::Memory,
        }
    }
}

impl HostServices {
    /// Builds an in-memory bundle and returns it with its concrete handles.
    pub fn memory(start_ms: u64) -> (Self, MemoryHost) {
        let host = MemoryHost::starting_at(start_ms);
        (host.services(), host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_bundle_shares_clock_with_scheduler() {
        let (services, host) = HostServices::memory(1_000);
        host.scheduler.advance(500);
        assert_eq!(services.clock.now_ms(), 1_500);
        assert_eq!(services.host_strategy.as_str(), "memory");
    }

    #[test]
    fn memory_bundle_shares_storage_with_handles() {
        let (services, host) = HostServices::memory(0);
        services.local_storage.set_item("k", "v").expect("set");
        assert!(host.local_storage.contains("k"));
        assert!(!host.session_storage.contains("k"));
    }

    #[test]
    fn capability_postures() {
        assert!(HostCapabilities::browser().local_storage.is_available());
        assert!(!HostCapabilities::browser().clipboard.is_available());
        assert!(!HostCapabilities::stub().session_storage.is_available());
    }
}
