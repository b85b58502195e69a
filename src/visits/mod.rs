//! Visit Counter Module
//!
//! Per-path request counts, fed by the API middleware.

mod counter;

pub use counter::VisitCounter;
