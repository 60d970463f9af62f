//! Error types

use thiserror::Error;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },
}

/// Errors from querying a single price source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

/// Errors from reconciling one monitoring cycle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("All {polled} price sources unavailable")]
    AllSourcesUnavailable { polled: usize },
}

/// Errors from forwarding a price to the backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Backend returned HTTP {0}")]
    Status(u16),

    #[error("Malformed acknowledgment: {0}")]
    MalformedAck(String),

    #[error("Backend rejected price: {0}")]
    Rejected(String),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
pub type FetchResult<T> = Result<T, FetchError>;
pub type ReconcileResult<T> = Result<T, ReconcileError>;
pub type ReportResult<T> = Result<T, ReportError>;
