use anyhow::Context;
use clap::Parser;
use harvest_etl::domain::ports::Connector;
use harvest_etl::utils::error::ErrorSeverity;
use harvest_etl::utils::{logger, validation::Validate};
use harvest_etl::{
    BatchJob, CliArgs, FileStore, GeoNetworkConnector, HarvestConfig, LocalStorage,
    MetadataTransformer, MetadataValidator, NotificationService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting harvest-etl");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = HarvestConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let since = args.resolve_since(config.lookback_days())?;
    tracing::info!(
        "✅ Configuration loaded: job '{}', harvesting changes since {}",
        config.job_name(),
        since.to_rfc3339()
    );

    let connector = GeoNetworkConnector::new(config.source.clone())?;

    if args.dry_run {
        let query = connector.construct_query(Some(since));
        println!("🔍 Dry run: search query for {}", config.source.url);
        println!("{}", serde_json::to_string_pretty(query.as_json())?);
        return Ok(());
    }

    let validator = MetadataValidator::from_config(&config.validator)?;
    tracing::debug!("Validator loaded with {} rules", validator.rule_count());
    let transformer = MetadataTransformer::new()?;
    let store = FileStore::new(LocalStorage::new(config.output_path().to_string()));
    let notifications = NotificationService::from_config(&config.notifications);

    let job = BatchJob::new(connector, validator, transformer, store, notifications)
        .with_since(since);

    match job.run().await {
        Ok(stats) => {
            tracing::info!("✅ Harvest {}", stats.status());
            println!(
                "✅ Harvest {}: {} fetched, {} saved, {} invalid, {} failed",
                stats.status(),
                stats.fetched,
                stats.saved,
                stats.invalid,
                stats.failed
            );
            println!("📁 Records saved under: {}/records", config.output_path());
        }
        Err(e) => {
            tracing::error!(
                "❌ Harvest failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            if e.is_retryable() {
                eprintln!("🔁 The failure looks transient; rerunning the harvest may succeed");
            }

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
