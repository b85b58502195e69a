//! Jobs Module
//!
//! Runs long-lived work off the request path and exposes a polling protocol
//! for its status and result.

mod status;
mod tracker;

pub use status::{JobId, JobStatus};
pub use tracker::{JobContext, JobTracker};
