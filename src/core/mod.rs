pub mod address;
pub mod etl;
pub mod export;
pub mod formats;
pub mod pipeline;
pub mod rate;
pub mod response;

pub use crate::domain::model::{GeocodeOutcome, GeocodeResponse, Record};
pub use crate::domain::ports::{ConfigProvider, GeocodeClient, Pipeline, RecordStore, Storage};
pub use crate::utils::error::Result;
