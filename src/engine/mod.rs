// src/engine/mod.rs

//! Session driving.
//!
//! - [`core`] is the synchronous driver API ([`SessionManager`]): open,
//!   plan, record results, checkpoint, close.
//! - [`runner`] abstracts job execution behind [`JobRunner`].
//! - [`runtime`] is the async loop that feeds jobs to a runner and reacts to
//!   [`DriverEvent`]s between jobs.

pub mod core;
pub mod runner;
pub mod runtime;

pub use self::core::{JobApplied, OpenMode, SessionManager};
pub use runner::{JobReport, JobRunner};
pub use runtime::{RunSummary, Runtime};

/// External requests delivered to the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// Stop after the current job and skip everything that is left.
    AbortRequested,
}
