//! Price monitor service
//!
//! Drives the poll → reconcile → report cycle on a fixed interval

pub mod driver;
pub mod settings;

pub use driver::{CycleDriver, CycleOutcome, DriverStats};
