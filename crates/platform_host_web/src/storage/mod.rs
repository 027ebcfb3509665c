//! Browser storage adapters: Web Storage key/value areas and the `storage` change event.

pub mod events;
pub mod web_storage;
