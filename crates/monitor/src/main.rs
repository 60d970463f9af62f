//! pricewatch - multi-source crypto price monitor
//!
//! Main entry point for the monitoring service

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pricewatch_core::LogFormat;
use pricewatch_monitor::{settings, CycleDriver, CycleOutcome};
use pricewatch_price_feed::PriceReconciler;
use pricewatch_reporter::{BackendReporter, PriceReporter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Log format comes from config, so load errors are reported by anyhow on stderr
    let config = settings::load()?;

    init_logging(config.log_format);

    info!("Starting pricewatch v{}", env!("CARGO_PKG_VERSION"));

    let source_names: Vec<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
    info!("Sources: {}", source_names.join(" + "));

    let reconciler = PriceReconciler::from_config(&config)?;

    let reporter: Option<Arc<dyn PriceReporter>> = match &config.reporter {
        Some(reporter_config) => {
            let reporter = BackendReporter::new(reporter_config.clone())?;
            info!("Reporting to {}", reporter.endpoint());
            Some(Arc::new(reporter) as Arc<dyn PriceReporter>)
        }
        None => None,
    };

    let driver = CycleDriver::new(reconciler, reporter, config.interval())
        .with_asset(config.asset.clone());

    if config.run_once {
        return match driver.run_cycle().await {
            CycleOutcome::Failed(e) => Err(e.into()),
            _ => Ok(()),
        };
    }

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to install signal handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    info!("Press Ctrl+C to shutdown");
    driver.run(shutdown_rx).await;

    info!("Shutdown complete");
    Ok(())
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
