//! Autonomous-agent navigation AI
//!
//! This crate provides:
//! - Patrol behavior over a fixed waypoint set with recency exclusion
//! - Reactive flee behavior with a bounded escape search
//! - A pluggable path-planning oracle (grid-based reference included)
//! - A per-tick coordinator state machine driving it all

pub mod ai;
pub mod core;
pub mod nav;
pub mod world;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        Coordinator, EscapeOutcome, EscapeReport, GoalHistory, Mode, PatrolRoute, ThreatConfig,
        ThreatResponder, Waypoint, WaypointId,
    };
    pub use crate::core::{AgentSpawn, EventQueue, GridSpec, Scenario, SimEvent, Time};
    pub use crate::nav::{MovementProfile, NavAgent, NavGrid, Path, PathPlanner, PathStatus};
    pub use crate::world::{Name, World};
    pub use glam::{Quat, Vec2, Vec3};
}
