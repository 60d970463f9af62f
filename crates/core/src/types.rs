//! Core type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{CoreError, FetchResult};

/// Dot-separated path into a JSON document, e.g. `bitcoin.usd` or `data.0.price`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build from known-good segments without validation
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Walk the path. Numeric segments index into arrays.
    pub fn resolve<'a>(&self, root: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        self.segments.iter().try_fold(root, |value, segment| match value {
            serde_json::Value::Object(map) => map.get(segment),
            serde_json::Value::Array(items) => {
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        })
    }
}

impl FromStr for FieldPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidFieldPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        if s.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let segments: Vec<String> = s.split('.').map(|seg| seg.trim().to_string()).collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(invalid("empty segment"));
        }

        Ok(Self { segments })
    }
}

impl TryFrom<String> for FieldPath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// One upstream price endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub field_path: FieldPath,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>, field_path: FieldPath) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            field_path,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Outcome of querying one source during a cycle
#[derive(Debug, Clone)]
pub struct SourceObservation {
    pub source: String,
    pub outcome: FetchResult<f64>,
    pub elapsed: Duration,
}

impl SourceObservation {
    pub fn price(&self) -> Option<f64> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Final price of one monitoring cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledPrice {
    pub value: f64,
    /// Sources whose values were averaged, in configuration order
    pub contributors: Vec<String>,
    pub sources_polled: usize,
    pub computed_at: DateTime<Utc>,
}

impl ReconciledPrice {
    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }

    /// True when at least one polled source did not contribute
    pub fn is_degraded(&self) -> bool {
        self.contributors.len() < self.sources_polled
    }
}
