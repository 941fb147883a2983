use crate::core::export::Exporter;
use crate::core::formats::{parse_records, DataFormat};
use crate::core::pipeline::GeocodePipeline;
use crate::core::{ConfigProvider, GeocodeClient, Pipeline, Record, RecordStore, Storage};
use crate::domain::summary::RunSummary;
use crate::utils::error::{EtlError, Result};

/// Where the records for this run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// Parse the file and load it into a freshly cleared store.
    File { path: String, format: DataFormat },
    /// Reuse whatever the store already holds.
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPlan {
    pub source: RecordSource,
    pub output_path: String,
    pub output_format: DataFormat,
}

/// One geocoding job: import-or-resume, geocode, export.
pub struct GeocodeJob<R, G, C, S>
where
    R: RecordStore,
    G: GeocodeClient,
    C: ConfigProvider,
    S: Storage,
{
    pipeline: GeocodePipeline<R, G, C>,
    storage: S,
    exporter: Exporter<S>,
    plan: JobPlan,
}

impl<R, G, C, S> GeocodeJob<R, G, C, S>
where
    R: RecordStore,
    G: GeocodeClient,
    C: ConfigProvider,
    S: Storage + Clone,
{
    pub fn new(pipeline: GeocodePipeline<R, G, C>, storage: S, plan: JobPlan) -> Self {
        Self {
            pipeline,
            exporter: Exporter::new(storage.clone()),
            storage,
            plan,
        }
    }

    async fn import(&self, path: &str, format: DataFormat) -> Result<()> {
        let bytes = self
            .storage
            .read_file(path)
            .await
            .map_err(|e| EtlError::import(format!("cannot read {}: {}", path, e)))?;

        let records = match parse_records(&bytes, format) {
            Ok(records) => records,
            Err(e @ EtlError::ImportError { .. }) => return Err(e),
            Err(e) => return Err(EtlError::import(format!("cannot parse {}: {}", path, e))),
        };

        let imported = self
            .pipeline
            .store()
            .import_all(records)
            .await
            .map_err(|e| EtlError::import(format!("store write failed: {}", e)))?;

        tracing::info!("📥 Imported {} records.", imported);
        println!("Imported {} records.", imported);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R, G, C, S> Pipeline for GeocodeJob<R, G, C, S>
where
    R: RecordStore,
    G: GeocodeClient,
    C: ConfigProvider,
    S: Storage + Clone,
{
    async fn extract(&self) -> Result<Vec<Record>> {
        match &self.plan.source {
            RecordSource::File { path, format } => {
                tracing::info!("📁 Loading {} records from {}", format, path);
                self.import(path, *format).await?;
            }
            RecordSource::Store => {
                let stored = self.pipeline.store().count().await;
                tracing::info!("📁 Resuming from existing store ({} records)", stored);
            }
        }

        let pending = self.pipeline.store().find_unprocessed().await?;
        tracing::info!("📋 {} records waiting for a geocode status", pending.len());
        Ok(pending)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<RunSummary> {
        Ok(self.pipeline.process_batch(data).await)
    }

    async fn load(&self, summary: &RunSummary) -> Result<String> {
        tracing::debug!("Exporting after {} geocoded records", summary.processed);

        let records = self
            .pipeline
            .store()
            .find_all()
            .await
            .map_err(|e| EtlError::ExportError {
                path: self.plan.output_path.clone(),
                message: e.to_string(),
            })?;

        self.exporter
            .export(&records, self.plan.output_format, &self.plan.output_path)
            .await
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<(RunSummary, String)> {
        tracing::info!("🚀 Starting geocoding run");

        let pending = self.pipeline.extract().await?;

        let summary = self.pipeline.transform(pending).await?;

        println!("Summary:");
        println!("{}", summary.to_pretty_json()?);
        tracing::info!("📊 Status summary: {:?}", summary.counts);

        let output_path = self.pipeline.load(&summary).await?;
        println!("Writing to {}... done.", output_path);

        Ok((summary, output_path))
    }
}
