// Adapters layer: concrete implementations for external systems (files, record store, http).

pub mod http;
pub mod record_store;
pub mod storage;

pub use http::HttpGeocodeClient;
pub use record_store::FileRecordStore;
pub use storage::LocalStorage;
