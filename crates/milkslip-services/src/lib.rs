//! Milkslip Services Library
//!
//! Flow-level orchestration on top of the processing, vision, and db crates:
//! the ingest state machine that carries one receipt from capture to
//! persistence, and the month-wise aggregation of saved receipts.

pub mod aggregate;
pub mod ingest;

pub use aggregate::{group, GroupedReceipts, MonthGroup};
pub use ingest::{ApplyOutcome, IngestSession, IngestStage};
