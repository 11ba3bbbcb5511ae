//! Resource, conflict, risk and confidence scoring of a planned decomposition.

mod confidence;
mod conflicts;
mod resources;
mod risk;

pub use confidence::compute_confidence;
pub use conflicts::detect_conflicts;
pub use resources::{assess_resources, overall_complexity};
pub use risk::assess_risk;
