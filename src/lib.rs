pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{FileRecordStore, HttpGeocodeClient, LocalStorage};
pub use config::Settings;
pub use crate::core::{
    etl::{EtlEngine, GeocodeJob, JobPlan, RecordSource},
    pipeline::GeocodePipeline,
};
pub use domain::summary::RunSummary;
pub use utils::error::{EtlError, Result};
