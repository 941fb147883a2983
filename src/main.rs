use batch_geocoder::utils::error::ErrorSeverity;
use batch_geocoder::utils::{logger, validation::Validate};
use batch_geocoder::{
    CliConfig, EtlEngine, EtlError, FileRecordStore, GeocodeJob, GeocodePipeline,
    HttpGeocodeClient, LocalStorage, Settings,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting batch-geocoder");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match config.into_settings().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => exit_with(e),
    };

    if let Err(e) = run(settings).await {
        exit_with(e);
    }

    Ok(())
}

async fn run(settings: Settings) -> batch_geocoder::Result<()> {
    let plan = settings.job_plan()?;
    let store_path = settings.store_path()?;
    tracing::info!("🗄️ Using store {}", store_path.display());

    let store = FileRecordStore::open(&store_path)
        .await
        .map_err(|e| EtlError::import(format!("cannot open store: {}", e)))?;
    let client = HttpGeocodeClient::new(
        &settings.host,
        settings.port,
        &settings.path,
        settings.timeout(),
    )?;
    tracing::info!("📡 Geocoder endpoint: {}", client.endpoint());

    let pipeline = GeocodePipeline::new(store, client, settings);
    let job = GeocodeJob::new(pipeline, LocalStorage::default(), plan);
    let engine = EtlEngine::new(job);

    let (summary, output_path) = engine.run().await?;
    tracing::info!(
        "✅ Geocoding run completed: {} records processed, {} failed",
        summary.processed,
        summary.failures
    );
    tracing::info!("📁 Output saved to: {}", output_path);
    Ok(())
}

fn exit_with(e: EtlError) -> ! {
    tracing::error!(
        "❌ Geocoding run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
