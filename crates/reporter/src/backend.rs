//! Price submission to the alerting backend

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info};

use pricewatch_core::{ReconciledPrice, ReportError, ReportResult, ReporterConfig};
use crate::ack::ReportAck;

/// Anything that can accept a reconciled price
#[async_trait]
pub trait PriceReporter: Send + Sync {
    async fn report(&self, price: &ReconciledPrice) -> ReportResult<ReportAck>;
}

/// HTTP reporter posting `{ "<price_field>": <value> }`
pub struct BackendReporter {
    config: ReporterConfig,
    client: Client,
}

impl BackendReporter {
    pub fn new(config: ReporterConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()?;

        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.url
    }

    fn build_body(&self, price: &ReconciledPrice) -> Value {
        let mut body = Map::new();
        body.insert(self.config.price_field.clone(), Value::from(price.value));
        Value::Object(body)
    }
}

#[async_trait]
impl PriceReporter for BackendReporter {
    async fn report(&self, price: &ReconciledPrice) -> ReportResult<ReportAck> {
        let body = self.build_body(price);
        debug!("Posting {} to {}", body, self.config.url);

        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        let ack: ReportAck = serde_json::from_slice(&bytes)
            .map_err(|e| ReportError::MalformedAck(e.to_string()))?;

        if !ack.success {
            return Err(ReportError::Rejected(ack.message));
        }

        info!(
            "Backend accepted ${:.2}: {} alert(s) triggered",
            price.value, ack.alerts_triggered
        );
        for alert in &ack.alerts {
            info!(
                subject = %alert.subject_id,
                level_pct = alert.level_pct,
                gain_usd = alert.gain_usd,
                "Alert triggered for {} at {:.1}% (gain ${:.2})",
                alert.subject_id, alert.level_pct, alert.gain_usd
            );
        }

        Ok(ack)
    }
}
