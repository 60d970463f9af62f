//! Cycle driver - runs poll → reconcile → report on a fixed interval

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use pricewatch_core::{ReconcileError, ReconciledPrice, ReportResult};
use pricewatch_price_feed::PriceReconciler;
use pricewatch_reporter::{PriceReporter, ReportAck};

/// Result of one monitoring cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// A price was produced; `report` is `None` when no reporter is configured
    Completed {
        price: ReconciledPrice,
        report: Option<ReportResult<ReportAck>>,
    },
    Failed(ReconcileError),
    /// Another cycle was still in flight
    Skipped,
}

impl CycleOutcome {
    pub fn price(&self) -> Option<&ReconciledPrice> {
        match self {
            CycleOutcome::Completed { price, .. } => Some(price),
            _ => None,
        }
    }
}

/// Driver statistics
#[derive(Debug, Clone, Default)]
pub struct DriverStats {
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub report_failures: u64,
    pub last_price: Option<f64>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// Periodic monitoring loop
pub struct CycleDriver {
    reconciler: PriceReconciler,
    reporter: Option<Arc<dyn PriceReporter>>,
    interval: Duration,
    asset: String,
    cycle_lock: Mutex<()>,
    stats: RwLock<DriverStats>,
}

impl CycleDriver {
    pub fn new(
        reconciler: PriceReconciler,
        reporter: Option<Arc<dyn PriceReporter>>,
        interval: Duration,
    ) -> Self {
        Self {
            reconciler,
            reporter,
            interval,
            asset: "BTC".to_string(),
            cycle_lock: Mutex::new(()),
            stats: RwLock::new(DriverStats::default()),
        }
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = asset.into();
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run cycles until `shutdown` fires: once immediately, then every interval.
    ///
    /// Ticks missed while a cycle is running are skipped, not queued.
    /// Shutdown takes effect between cycles; an in-flight cycle runs to completion.
    pub async fn run(&self, mut shutdown: oneshot::Receiver<()>) {
        info!(
            "Monitoring {} from {} source(s) every {:?}",
            self.asset,
            self.reconciler.source_count(),
            self.interval
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                _ = &mut shutdown => {
                    info!("Cycle driver shutdown requested");
                    break;
                }
            }
        }
    }

    /// Execute a single cycle. Never panics or propagates; failures are logged.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            warn!("Previous cycle still running, skipping this one");
            self.stats.write().skipped += 1;
            return CycleOutcome::Skipped;
        };

        let start = Instant::now();
        info!("Starting {} monitoring cycle", self.asset);

        let observations = self.reconciler.observe().await;
        let price = match PriceReconciler::reconcile(&observations) {
            Ok(price) => price,
            Err(e) => {
                error!("Cycle failed after {:?}: {}", start.elapsed(), e);
                let mut stats = self.stats.write();
                stats.failed += 1;
                stats.last_cycle_at = Some(Utc::now());
                return CycleOutcome::Failed(e);
            }
        };

        if price.contributor_count() > 1 {
            info!(
                price = price.value,
                contributors = price.contributor_count(),
                "Average of {}: ${:.2}",
                price.contributors.join(" + "),
                price.value
            );
        } else {
            info!(
                price = price.value,
                contributors = price.contributor_count(),
                "Using {} only: ${:.2}",
                price.contributors.join(""),
                price.value
            );
        }

        let report = match &self.reporter {
            Some(reporter) => {
                let result = reporter.report(&price).await;
                if let Err(e) = &result {
                    warn!("Price ${:.2} computed but report failed: {}", price.value, e);
                }
                Some(result)
            }
            None => None,
        };

        {
            let mut stats = self.stats.write();
            stats.completed += 1;
            stats.last_price = Some(price.value);
            stats.last_cycle_at = Some(price.computed_at);
            if matches!(report, Some(Err(_))) {
                stats.report_failures += 1;
            }
        }

        debug!("Cycle completed in {:?}", start.elapsed());
        info!("Final {} price: ${:.2}", self.asset, price.value);

        CycleOutcome::Completed { price, report }
    }

    pub fn stats(&self) -> DriverStats {
        self.stats.read().clone()
    }
}
