#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::http::{endpoint_url, DEFAULT_GEOCODE_PATH};
use crate::core::etl::{JobPlan, RecordSource};
use crate::core::export::{output_path_for, store_path_for, DEFAULT_OUTPUT_SUFFIX};
use crate::core::formats::DataFormat;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_non_negative_seconds, validate_path,
    validate_positive_number, validate_url, Validate,
};
use std::path::PathBuf;
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Fully resolved run configuration: defaults, then the TOML file, then
/// command line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub file: Option<String>,
    pub format: DataFormat,
    pub database: Option<String>,
    pub address_fields: Vec<String>,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub timeout_seconds: u64,
    pub throttle_seconds: f64,
    pub output_suffix: String,
    pub show_progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file: None,
            format: DataFormat::Json,
            database: None,
            address_fields: Vec::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_GEOCODE_PATH.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            throttle_seconds: 0.0,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            show_progress: true,
        }
    }
}

impl Settings {
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(file) = &config.input.file {
            settings.file = Some(file.clone());
        }
        if let Some(format) = &config.input.format {
            settings.format = format.parse()?;
        }
        if let Some(database) = &config.input.database {
            settings.database = Some(database.clone());
        }
        if let Some(fields) = &config.input.address_fields {
            settings.address_fields = normalize_fields(fields);
        }
        if let Some(host) = &config.geocoder.host {
            settings.host = host.clone();
        }
        if let Some(port) = config.geocoder.port {
            settings.port = port;
        }
        if let Some(path) = &config.geocoder.path {
            settings.path = path.clone();
        }
        if let Some(timeout) = config.geocoder.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        if let Some(delay) = config.throttle.delay_seconds {
            settings.throttle_seconds = delay;
        }
        if let Some(suffix) = &config.output.suffix {
            settings.output_suffix = suffix.clone();
        }

        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Store backing this run: the given database, or `{stem}.db` next to
    /// the input file.
    pub fn store_path(&self) -> Result<PathBuf> {
        match (&self.database, &self.file) {
            (Some(database), _) => Ok(PathBuf::from(database)),
            (None, Some(file)) => Ok(store_path_for(file)),
            (None, None) => Err(EtlError::MissingConfigError {
                field: "file".to_string(),
            }),
        }
    }

    pub fn job_plan(&self) -> Result<JobPlan> {
        let source = match (&self.database, &self.file) {
            (Some(_), _) => RecordSource::Store,
            (None, Some(file)) => RecordSource::File {
                path: file.clone(),
                format: self.format,
            },
            (None, None) => {
                return Err(EtlError::MissingConfigError {
                    field: "file".to_string(),
                })
            }
        };

        // 輸出檔名以輸入檔為主，只有資料庫時才用資料庫檔名
        let naming_source = self
            .file
            .as_deref()
            .or(self.database.as_deref())
            .unwrap_or_default();

        Ok(JobPlan {
            source,
            output_path: output_path_for(naming_source, &self.output_suffix, self.format),
            output_format: self.format,
        })
    }
}

/// Trims names and drops empty entries from a field list.
pub fn normalize_fields<S: AsRef<str>>(fields: &[S]) -> Vec<String> {
    fields
        .iter()
        .map(|f| f.as_ref().trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

impl ConfigProvider for Settings {
    fn address_fields(&self) -> &[String] {
        &self.address_fields
    }

    fn throttle(&self) -> Duration {
        Duration::try_from_secs_f64(self.throttle_seconds).unwrap_or_default()
    }

    fn show_progress(&self) -> bool {
        self.show_progress
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if self.file.is_none() && self.database.is_none() {
            return Err(EtlError::MissingConfigError {
                field: "file".to_string(),
            });
        }
        if let Some(file) = &self.file {
            validate_path("file", file)?;
        }
        if let Some(database) = &self.database {
            validate_path("database", database)?;
        }

        if self.address_fields.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "fields".to_string(),
            });
        }
        for field in &self.address_fields {
            validate_non_empty_string("fields", field)?;
        }

        validate_non_empty_string("host", &self.host)?;
        validate_positive_number("port", self.port as usize, 1)?;
        let endpoint = endpoint_url(&self.host, self.port, &self.path)?;
        validate_url("host", endpoint.as_str())?;

        validate_positive_number("timeout", self.timeout_seconds as usize, 1)?;
        validate_non_negative_seconds("throttle", self.throttle_seconds)?;

        Ok(())
    }
}
