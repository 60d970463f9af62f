//! Core types and utilities for the price monitor
//!
//! This crate provides shared types used across all components:
//! - Source descriptors and field-path extraction rules
//! - Fetch outcomes and reconciled prices
//! - Monitor and reporter configuration
//! - Error taxonomy

pub mod types;
pub mod config;
pub mod errors;

pub use types::*;
pub use config::*;
pub use errors::*;
