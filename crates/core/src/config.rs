//! Configuration types

use http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::{CoreError, CoreResult, FieldPath, SourceDescriptor};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Backend reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub url: String,
    /// JSON key the price is sent under
    #[serde(default = "default_price_field")]
    pub price_field: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ReporterConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            price_field: default_price_field(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Asset label used in logs
    pub asset: String,
    pub interval_secs: u64,
    pub request_timeout_ms: u64,
    pub sources: Vec<SourceDescriptor>,
    pub reporter: Option<ReporterConfig>,
    /// Run a single cycle and exit
    pub run_once: bool,
    pub log_format: LogFormat,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            asset: "BTC".to_string(),
            interval_secs: 300,  // 5 minutes
            request_timeout_ms: default_timeout_ms(),
            sources: default_sources(),
            reporter: None,
            run_once: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn get_source(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.sources.is_empty() {
            return Err(CoreError::InvalidConfig("at least one price source is required".into()));
        }
        if self.interval_secs == 0 {
            return Err(CoreError::InvalidConfig("interval_secs must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig("request_timeout_ms must be positive".into()));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(CoreError::InvalidConfig("source name must not be empty".into()));
            }
            if source.url.trim().is_empty() {
                return Err(CoreError::InvalidConfig(format!(
                    "source '{}' has no url",
                    source.name
                )));
            }
            for (name, value) in &source.headers {
                if HeaderName::from_bytes(name.as_bytes()).is_err() {
                    return Err(CoreError::InvalidConfig(format!(
                        "source '{}' has invalid header name '{}'",
                        source.name, name
                    )));
                }
                if HeaderValue::from_str(value).is_err() {
                    return Err(CoreError::InvalidConfig(format!(
                        "source '{}' has invalid value for header '{}'",
                        source.name, name
                    )));
                }
            }
            if !seen.insert(source.name.as_str()) {
                return Err(CoreError::InvalidConfig(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }

        if let Some(reporter) = &self.reporter {
            if reporter.url.trim().is_empty() {
                return Err(CoreError::InvalidConfig("reporter url must not be empty".into()));
            }
            if reporter.price_field.trim().is_empty() {
                return Err(CoreError::InvalidConfig("reporter price_field must not be empty".into()));
            }
        }

        Ok(())
    }
}

/// CoinGecko and CryptoCompare BTC/USD quotes
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(
            "coingecko",
            "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd",
            FieldPath::from_segments(["bitcoin", "usd"]),
        )
        .with_header("User-Agent", BROWSER_USER_AGENT),
        SourceDescriptor::new(
            "cryptocompare",
            "https://min-api.cryptocompare.com/data/price?fsym=BTC&tsyms=USD",
            FieldPath::from_segments(["USD"]),
        ),
    ]
}

fn default_price_field() -> String {
    "price".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}
