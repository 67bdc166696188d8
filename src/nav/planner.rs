//! Path-planning oracle contract
//!
//! The agent core never computes walkability itself; it asks a planner for
//! paths and walkable samples and tolerates whatever comes back. `NavGrid`
//! implements this contract for tests and the demo; a production navmesh
//! engine plugs in the same way.

use glam::Vec3;
use smallvec::SmallVec;

/// Status of a computed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// The path reaches the requested goal
    Valid,
    /// No path exists (or the endpoints are off the walkable surface)
    Invalid,
}

/// A computed path through walkable space
#[derive(Debug, Clone)]
pub struct Path {
    /// Corner points in world coordinates, from start to end
    pub corners: SmallVec<[Vec3; 8]>,
    /// Whether the path reaches the goal
    pub status: PathStatus,
}

impl Path {
    /// A path that failed to compute
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            corners: SmallVec::new(),
            status: PathStatus::Invalid,
        }
    }

    /// Check whether the path is usable: valid status and at least one corner
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.status == PathStatus::Valid && !self.corners.is_empty()
    }

    /// The final corner of the path, if any
    #[must_use]
    pub fn end(&self) -> Option<Vec3> {
        self.corners.last().copied()
    }

    /// Total polyline length of the path
    #[must_use]
    pub fn length(&self) -> f32 {
        let mut length = 0.0;
        for i in 1..self.corners.len() {
            length += self.corners[i].distance(self.corners[i - 1]);
        }
        length
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Contract for an external path-planning service.
///
/// Implementations must be pure with respect to the agents: planning a path
/// mutates nothing, so any number of agents can query the same planner
/// within a tick.
pub trait PathPlanner {
    /// Compute a path between two world positions.
    fn plan(&self, from: Vec3, to: Vec3) -> Path;

    /// Sample a walkable point within `max_radius` of `near`.
    ///
    /// Returns `None` when no walkable surface exists in range.
    fn sample(&self, near: Vec3, max_radius: f32) -> Option<Vec3>;
}
