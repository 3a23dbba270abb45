use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Json,
}

/// Diagnostics go to stderr; stdout is left for the run summary.
pub fn init_cli_logger(verbose: bool) {
    let level = if verbose { "debug,info" } else { "info" };
    install(level, LogFormat::Compact);
}

/// JSON lines on stderr, for runs collected by a log shipper.
pub fn init_json_logger() {
    install("info", LogFormat::Json);
}

/// `RUST_LOG` wins over the crate level picked here.
fn install(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("qc_responses_etl={level}")));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry.with(layer.compact()).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
    }
}
