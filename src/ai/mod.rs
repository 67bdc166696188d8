//! Agent behavior module
//!
//! Provides patrol selection, threat response with the bounded escape
//! search, and the per-tick coordinator that arbitrates between them.

mod coordinator;
mod patrol;
mod threat;

pub use coordinator::{Coordinator, Mode};
pub use patrol::{GoalHistory, PatrolRoute, Waypoint, WaypointId};
pub use threat::{EscapeOutcome, EscapeReport, ThreatConfig, ThreatResponder};
