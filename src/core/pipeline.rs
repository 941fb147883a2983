use crate::core::address::build_address;
use crate::core::rate::RatePolicy;
use crate::core::response::interpret;
use crate::core::{ConfigProvider, GeocodeClient, Record, RecordStore};
use crate::domain::model::{GeocodeOutcome, ERROR_STATUS, ZERO_RESULTS};
use crate::domain::summary::RunSummary;
use crate::utils::error::{EtlError, Result, StoreError};
use crate::utils::progress::ProgressReporter;

/// Drives unprocessed records through the geocoder one at a time and writes
/// each result back before moving on.
pub struct GeocodePipeline<R: RecordStore, G: GeocodeClient, C: ConfigProvider> {
    store: R,
    client: G,
    config: C,
    rate: RatePolicy,
}

impl<R: RecordStore, G: GeocodeClient, C: ConfigProvider> GeocodePipeline<R, G, C> {
    pub fn new(store: R, client: G, config: C) -> Self {
        let rate = RatePolicy::fixed_delay(config.throttle());
        Self {
            store,
            client,
            config,
            rate,
        }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Geocodes everything still lacking a status.
    pub async fn run(&self) -> Result<RunSummary> {
        let pending = self.store.find_unprocessed().await?;
        Ok(self.process_batch(pending).await)
    }

    /// Processes `records` strictly in sequence. Per-record failures are
    /// counted as `ERROR` and never abort the batch.
    pub async fn process_batch(&self, records: Vec<Record>) -> RunSummary {
        let mut summary = RunSummary::new();
        let mut progress = ProgressReporter::new(records.len(), self.config.show_progress());

        tracing::info!(
            "🌍 Geocoding {} records (throttle {:?})",
            records.len(),
            self.rate.delay()
        );

        for record in &records {
            match self.process_record(record).await {
                Ok(status) if status == ERROR_STATUS => summary.record_failure(&status),
                Ok(status) => summary.record(&status),
                Err(e) => {
                    tracing::error!(
                        "❌ Could not save geocode result for record {:?}: {}",
                        record.id,
                        e
                    );
                    summary.record_failure(ERROR_STATUS);
                }
            }

            progress.tick();
            self.rate.pace().await;
        }

        tracing::info!(
            "✅ Geocoded {} records in {:?} ({} failed)",
            summary.processed,
            progress.elapsed(),
            summary.failures
        );

        summary
    }

    /// Geocodes one record and persists the outcome. Returns the status
    /// written to the store; `Err` only when the write itself failed.
    async fn process_record(&self, record: &Record) -> Result<String> {
        let address = build_address(record, self.config.address_fields());
        tracing::debug!("Geocoding '{}'", address);

        let outcome = match self
            .client
            .geocode(&address)
            .await
            .and_then(|response| interpret(&response))
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("❌ Geocoding failed for '{}': {}", address, e);
                if let Some(raw) = e.raw_payload() {
                    tracing::error!("Raw geocoder response: {}", raw);
                }
                GeocodeOutcome::error()
            }
        };

        if outcome.status == ZERO_RESULTS {
            tracing::warn!("🔶 No results for '{}'", address);
        }

        let id = record.id.as_deref().ok_or_else(|| {
            EtlError::StoreError(StoreError::NotFound {
                id: "<unsaved record>".to_string(),
            })
        })?;

        let status = outcome.status.clone();
        self.store.update(id, outcome.into_fields(&address)).await?;
        Ok(status)
    }
}
