//! celwrite-core: question catalog, exam session and evaluation contract.
//!
//! This crate holds the data model, the phase-gated session state machine,
//! the countdown ticker, the draft-store seam and the evaluation client that
//! the rest of celwrite builds on. It has no knowledge of any particular
//! scoring backend or storage engine.

pub mod bank;
pub mod catalog;
pub mod draft;
pub mod error;
pub mod evaluation;
pub mod exam;
pub mod model;
pub mod report;
pub mod session;
pub mod timer;
pub mod traits;
