use std::rc::Rc;

use futures::executor::block_on;
use platform_hooks::{
    ClipboardAccessor, GeolocationOptions, GeolocationTracker, HookError, HooksConfig,
    HostServices, LocalStore, SessionStore,
};
use platform_host::{KeyValueStore, StorageArea, StorageChangeEvent};
use pretty_assertions::assert_eq;

#[test]
fn local_value_with_ttl_expires_after_simulated_time() {
    let (services, host) = HostServices::memory(50_000);
    let store = LocalStore::from_services(&services);
    store.activate();

    store.set_value("session-token", Some("abc"), 3_000);
    assert_eq!(store.get_key("session-token").as_deref(), Some("abc"));

    host.scheduler.advance(2_999);
    assert_eq!(store.get_key("session-token").as_deref(), Some("abc"));

    host.scheduler.advance(1);
    assert_eq!(store.get_key("session-token"), None);
    assert!(!host.local_storage.contains("session-token"));
}

#[test]
fn deleted_local_key_is_not_reintroduced() {
    let (services, host) = HostServices::memory(0);
    let store = LocalStore::from_services(&services);
    store.activate();
    store.set_value("draft", Some("hello"), 0);
    let raw = host
        .local_storage
        .get_item("draft")
        .expect("read")
        .expect("stored");

    store.delete_key("draft");
    host.local_storage.set_item("draft", &raw).expect("restore");
    store.reload();

    assert_eq!(store.get_key("draft"), None);
    assert!(!store.snapshot().stored_values.contains_key("draft"));
    assert!(host.local_storage.contains("draft"));
}

#[test]
fn deleted_keys_are_tracked_per_instance() {
    let (services, host) = HostServices::memory(0);
    let first = LocalStore::from_services(&services);
    let second = LocalStore::from_services(&services);
    first.activate();
    first.set_value("shared", Some("1"), 0);
    first.delete_key("shared");

    host.local_storage
        .set_item(
            "shared",
            r#"{"value":"2","timestamp":0,"expiry":null}"#,
        )
        .expect("write");
    second.activate();
    assert_eq!(second.get_key("shared").as_deref(), Some("2"));
    first.reload();
    assert_eq!(first.get_key("shared"), None);
}

#[test]
fn clearing_twice_equals_clearing_once() {
    let (services, host) = HostServices::memory(0);
    let local = LocalStore::from_services(&services);
    local.set_value("k", Some("v"), 0);
    local.clear("k");
    let once = local.snapshot();
    local.clear("k");
    assert_eq!(local.snapshot(), once);
    local.clear("never-written");
    assert_eq!(local.snapshot().error, None);

    let session = SessionStore::from_services(&services, &HooksConfig::default());
    session.set_value("k", Some("v"), 1_000);
    session.clear("k");
    let once = session.snapshot();
    session.clear("k");
    assert_eq!(session.snapshot(), once);
    assert_eq!(session.snapshot().error, None);
    assert!(host.session_storage.is_empty());
}

#[test]
fn storage_event_overwrites_session_mirror_without_ttl_check() {
    let (services, host) = HostServices::memory(0);
    let session = SessionStore::from_services(&services, &HooksConfig::default());
    session.activate();
    session.set_value("k", Some("old"), 10);
    host.clock().advance(1_000);

    host.storage_events.emit(&StorageChangeEvent {
        key: Some("k".to_string()),
        old_value: Some("\"old\"".to_string()),
        new_value: Some("\"v\"".to_string()),
        area: StorageArea::Session,
    });
    assert_eq!(
        session.snapshot().stored_values.get("k"),
        Some(&Some("v".to_string()))
    );
}

#[test]
fn watch_option_change_registers_exactly_one_new_watch() {
    let (services, host) = HostServices::memory(0);
    let tracker = GeolocationTracker::from_services(&services, GeolocationOptions::watching());
    tracker.activate();
    assert_eq!(host.geolocation.watch_registrations(), 1);

    tracker.set_options(GeolocationOptions {
        timeout_ms: 5_000,
        ..GeolocationOptions::watching()
    });
    assert_eq!(host.geolocation.watch_registrations(), 2);
    assert_eq!(host.geolocation.active_watch_count(), 1);
    assert_eq!(
        host.geolocation
            .active_watch_options()
            .first()
            .map(|options| options.timeout_ms),
        Some(5_000)
    );
}

#[test]
fn clipboard_outcomes() {
    let (services, host) = HostServices::memory(0);
    let clipboard = ClipboardAccessor::from_services(&services);

    block_on(clipboard.copy_to_clipboard("hi"));
    assert_eq!(clipboard.snapshot().content.as_deref(), Some("hi"));
    assert_eq!(clipboard.snapshot().error, None);

    host.clipboard.deny_writes(true);
    block_on(clipboard.copy_to_clipboard("x"));
    assert_eq!(clipboard.snapshot().content.as_deref(), Some("hi"));
    assert_eq!(
        clipboard.snapshot().error.map(|err| err.to_string()).as_deref(),
        Some("Failed to copy to clipboard")
    );
}

#[test]
fn duration_counts_minutes_since_write() {
    let (services, host) = HostServices::memory(0);
    let store = LocalStore::from_services(&services);
    store.set_value("a", Some("1"), 0);
    assert_eq!(store.get_key("a").as_deref(), Some("1"));
    assert!(store.get_duration("a").expect("present") < 1e-9);

    host.scheduler.advance(60_000);
    let minutes = store.get_duration("a").expect("present");
    assert!((minutes - 1.0).abs() < 1e-9);
    assert_eq!(store.get_duration("missing"), None);
}

#[test]
fn unsupported_geolocation_reports_capability_error() {
    let (mut services, _host) = HostServices::memory(0);
    services.geolocation = Rc::new(platform_host::NoopGeolocationService);
    let tracker = GeolocationTracker::from_services(&services, GeolocationOptions::default());
    tracker.activate();
    assert_eq!(
        tracker.snapshot().error,
        Some(HookError::GeolocationUnsupported)
    );
}
