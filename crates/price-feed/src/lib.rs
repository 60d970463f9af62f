//! Multi-source price feed
//!
//! Features:
//! - Data-driven HTTP sources (url + headers + field path)
//! - Concurrent fan-out with all-settle join
//! - Per-fetch timeouts
//! - Symmetric averaging over surviving sources

pub mod aggregator;
pub mod feeds;

pub use aggregator::PriceReconciler;
pub use feeds::{extract_price, HttpPriceSource, PriceSource};
