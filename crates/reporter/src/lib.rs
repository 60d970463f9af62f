//! Backend reporting for reconciled prices

pub mod ack;
pub mod backend;

pub use ack::{ReportAck, SubjectId, TriggeredAlert};
pub use backend::{BackendReporter, PriceReporter};
