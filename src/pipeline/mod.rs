//! The discovery-and-audit pipeline.
//!
//! An ordered list of steps runs over the shared record set. Every step is
//! a barrier: per-record work fans out concurrently inside it, and the next
//! step never starts until the current one has finished for every record.
//! After each mutating step the full record set is snapshotted so the run
//! can resume.

pub mod context;
pub mod orchestrator;
pub mod step;
pub mod steps;

pub use context::{RunContext, RunServices};
pub use orchestrator::Orchestrator;
pub use step::Step;
