// src/task/mod.rs

//! The two values that cross the coordinator/worker boundary.
//!
//! - [`descriptor`] holds [`TaskDescriptor`]: what to run and how the
//!   coordinator should interpret the outcome.
//! - [`envelope`] holds [`ResultEnvelope`]: the self-contained record the
//!   worker sends back for a single invocation.

pub mod descriptor;
pub mod envelope;

pub use descriptor::{TaskDescriptor, TaskDescriptorBuilder};
pub use envelope::{CapturedFailure, FailureKind, LINE_SEPARATOR, NOT_DETERMINED, ResultEnvelope};
