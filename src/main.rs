use anyhow::Context;
use clap::Parser;
use qc_responses_etl::utils::{logger, validation::Validate};
use qc_responses_etl::{CliConfig, EtlEngine, InputSource, LocalStorage, ResponsesPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting qc-responses-etl");
    tracing::debug!("CLI config: {:?}", config);

    let settings = config
        .resolve()
        .context("failed to load configuration")?;

    if let Err(e) = settings.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    let storage = LocalStorage::new(settings.output_path.clone());
    let input = InputSource::from_arg(config.input.clone());
    let pipeline = ResponsesPipeline::new(storage, settings, input);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("ETL process completed, {} file(s) written", summary.output_files.len());
            for file in &summary.output_files {
                println!("{}", file);
            }
        }
        Err(e) => {
            tracing::error!("ETL process failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
