use crate::domain::model::{GeocodeResponse, Record};
use crate::domain::summary::RunSummary;
use crate::utils::error::{GeocodeError, Result, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Persistent record collection the pipeline reads from and writes back to.
pub trait RecordStore: Send + Sync {
    /// Replaces the whole collection, giving every record a fresh id.
    fn import_all(
        &self,
        records: Vec<Record>,
    ) -> impl std::future::Future<Output = std::result::Result<usize, StoreError>> + Send;

    /// Records without a geocode status, in insertion order.
    fn find_unprocessed(
        &self,
    ) -> impl std::future::Future<Output = std::result::Result<Vec<Record>, StoreError>> + Send;

    fn update(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> impl std::future::Future<Output = std::result::Result<(), StoreError>> + Send;

    /// Every record, internal id stripped.
    fn find_all(
        &self,
    ) -> impl std::future::Future<Output = std::result::Result<Vec<Record>, StoreError>> + Send;

    /// Number of live records.
    fn count(&self) -> impl std::future::Future<Output = usize> + Send;
}

#[async_trait]
pub trait GeocodeClient: Send + Sync {
    async fn geocode(&self, address: &str) -> std::result::Result<GeocodeResponse, GeocodeError>;
}

pub trait ConfigProvider: Send + Sync {
    fn address_fields(&self) -> &[String];
    fn throttle(&self) -> Duration;
    fn show_progress(&self) -> bool;
}

/// Import-or-resume, geocode, export.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<RunSummary>;
    async fn load(&self, summary: &RunSummary) -> Result<String>;
}
