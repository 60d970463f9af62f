//! Price reconciler - fans out to every source and averages the survivors

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use pricewatch_core::{
    FetchError, MonitorConfig, ReconcileError, ReconcileResult, ReconciledPrice,
    SourceObservation,
};
use crate::feeds::{build_http_client, HttpPriceSource, PriceSource};

/// Queries all sources concurrently and reduces them to one price
pub struct PriceReconciler {
    sources: Vec<Arc<dyn PriceSource>>,
    fetch_timeout: Duration,
}

impl PriceReconciler {
    pub fn new(sources: Vec<Arc<dyn PriceSource>>, fetch_timeout: Duration) -> Self {
        Self {
            sources,
            fetch_timeout,
        }
    }

    /// One HTTP source per configured descriptor, sharing a single client
    pub fn from_config(config: &MonitorConfig) -> anyhow::Result<Self> {
        let client = build_http_client(config.request_timeout())?;

        let sources = config
            .sources
            .iter()
            .map(|descriptor| {
                Arc::new(HttpPriceSource::new(descriptor.clone(), client.clone()))
                    as Arc<dyn PriceSource>
            })
            .collect();

        Ok(Self::new(sources, config.request_timeout()))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Query every source in parallel and wait for all of them to settle.
    ///
    /// Observations come back in source order, one per source.
    pub async fn observe(&self) -> Vec<SourceObservation> {
        let fetches = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let timeout = self.fetch_timeout;

            async move {
                let start = Instant::now();
                let outcome = match tokio::time::timeout(timeout, source.fetch_price()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FetchError::Transport(format!("timed out after {:?}", timeout))),
                };

                SourceObservation {
                    source: source.name().to_string(),
                    outcome,
                    elapsed: start.elapsed(),
                }
            }
        });

        let observations = join_all(fetches).await;

        for obs in &observations {
            let latency_ms = obs.elapsed.as_millis() as u64;
            match &obs.outcome {
                Ok(price) => info!(
                    source = %obs.source,
                    price = *price,
                    latency_ms,
                    "{}: ${:.2}", obs.source, price
                ),
                Err(e) => warn!(
                    source = %obs.source,
                    error = %e,
                    latency_ms,
                    "{} unavailable: {}", obs.source, e
                ),
            }
        }

        observations
    }

    /// Average every successful observation.
    ///
    /// Fails with `AllSourcesUnavailable` when nothing succeeded.
    pub fn reconcile(observations: &[SourceObservation]) -> ReconcileResult<ReconciledPrice> {
        let (contributors, values): (Vec<String>, Vec<f64>) = observations
            .iter()
            .filter_map(|obs| obs.price().map(|price| (obs.source.clone(), price)))
            .unzip();

        if values.is_empty() {
            return Err(ReconcileError::AllSourcesUnavailable {
                polled: observations.len(),
            });
        }

        let value = values.iter().sum::<f64>() / values.len() as f64;

        Ok(ReconciledPrice {
            value,
            contributors,
            sources_polled: observations.len(),
            computed_at: Utc::now(),
        })
    }

    /// Observe all sources, then reconcile
    pub async fn fetch_reconciled(&self) -> ReconcileResult<ReconciledPrice> {
        let observations = self.observe().await;
        Self::reconcile(&observations)
    }
}
