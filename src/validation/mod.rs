//! Checklist and topology validation.
//!
//! Both checks are pure functions over document data and are recomputed on demand.

mod checklist;
mod topology;

pub use checklist::{compute_is_detailed, details_satisfy, is_attribute_satisfied, missing_attributes};
pub use topology::{TopologyReport, validate};
