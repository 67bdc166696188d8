//! Navigation agent
//!
//! Wraps the path planner behind a "request a destination, follow the
//! corners" surface. Destinations always succeed from the caller's point of
//! view; an unreachable target simply leaves the agent with no remaining
//! path, which the coordinator re-polls and recovers from.

use glam::{Quat, Vec3};
use smallvec::SmallVec;

use crate::nav::PathPlanner;

/// Movement parameters applied to an agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementProfile {
    /// Linear speed in units per second
    pub speed: f32,
    /// Turn rate in degrees per second
    pub angular_speed: f32,
}

impl MovementProfile {
    /// Normal patrol gait
    pub const WALK: Self = Self {
        speed: 3.5,
        angular_speed: 120.0,
    };

    /// Elevated gait used while escaping a threat
    pub const FLEE: Self = Self {
        speed: 10.0,
        angular_speed: 500.0,
    };

    /// Create a movement profile
    #[must_use]
    pub const fn new(speed: f32, angular_speed: f32) -> Self {
        Self {
            speed,
            angular_speed,
        }
    }
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self::WALK
    }
}

/// An agent that plans and follows paths on a walkable surface
#[derive(Debug, Clone)]
pub struct NavAgent {
    /// Current world position
    position: Vec3,
    /// Current facing
    heading: Quat,
    /// Corners of the active path, start to end
    corners: SmallVec<[Vec3; 8]>,
    /// Index of the corner currently being approached
    next_corner: usize,
    /// Active movement parameters
    profile: MovementProfile,
    /// Distance to the path end below which the agent counts as arrived
    arrival_tolerance: f32,
}

impl NavAgent {
    /// Default arrival tolerance in distance units
    pub const DEFAULT_ARRIVAL_TOLERANCE: f32 = 1.75;

    /// How close the agent must get to an intermediate corner to pass it
    const CORNER_EPSILON: f32 = 0.1;

    /// Create an agent at a position, facing +Z, with the walk profile
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            heading: Quat::IDENTITY,
            corners: SmallVec::new(),
            next_corner: 0,
            profile: MovementProfile::WALK,
            arrival_tolerance: Self::DEFAULT_ARRIVAL_TOLERANCE,
        }
    }

    /// Current world position
    #[must_use]
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Teleport the agent (external actuators may also drive position)
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Current facing
    #[must_use]
    #[inline]
    pub fn heading(&self) -> Quat {
        self.heading
    }

    /// Set the facing directly
    pub fn set_heading(&mut self, heading: Quat) {
        self.heading = heading;
    }

    /// Forward direction of the current heading (+Z in local space)
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.heading * Vec3::Z
    }

    /// Request a path from the current position to `target`.
    ///
    /// Always succeeds from the caller's perspective. If the planner cannot
    /// reach the target, the active path is cleared and
    /// [`has_path_remaining`](Self::has_path_remaining) stays false.
    pub fn set_destination(&mut self, planner: &dyn PathPlanner, target: Vec3) {
        let path = planner.plan(self.position, target);
        if path.is_valid() {
            self.corners = path.corners;
            self.next_corner = 0;
        } else {
            self.reset_path();
        }
    }

    /// Clear the active path immediately
    pub fn reset_path(&mut self) {
        self.corners.clear();
        self.next_corner = 0;
    }

    /// The end of the active path, or the current position when idle
    #[must_use]
    pub fn path_end(&self) -> Vec3 {
        self.corners.last().copied().unwrap_or(self.position)
    }

    /// Whether the agent still has meaningful distance left to travel.
    ///
    /// True iff the straight-line distance from the current position to the
    /// path end exceeds the arrival tolerance.
    #[must_use]
    pub fn has_path_remaining(&self) -> bool {
        self.position.distance(self.path_end()) > self.arrival_tolerance
    }

    /// Replace the movement parameters. Side effect only.
    pub fn set_movement_profile(&mut self, profile: MovementProfile) {
        self.profile = profile;
    }

    /// Active movement parameters
    #[must_use]
    #[inline]
    pub fn movement_profile(&self) -> MovementProfile {
        self.profile
    }

    /// Arrival tolerance in distance units
    #[must_use]
    #[inline]
    pub fn arrival_tolerance(&self) -> f32 {
        self.arrival_tolerance
    }

    /// Override the arrival tolerance
    pub fn set_arrival_tolerance(&mut self, tolerance: f32) {
        self.arrival_tolerance = tolerance;
    }

    /// Advance along the active path by one time step.
    ///
    /// Moves at the profile speed toward the next corner and turns the
    /// heading toward the travel direction at most `angular_speed` degrees
    /// per second.
    pub fn advance(&mut self, dt: f32) {
        let mut budget = self.profile.speed * dt;

        while budget > 0.0 {
            let Some(&corner) = self.corners.get(self.next_corner) else {
                break;
            };

            let to_corner = corner - self.position;
            let distance = to_corner.length();

            if distance <= Self::CORNER_EPSILON {
                self.next_corner += 1;
                continue;
            }

            let direction = to_corner / distance;
            self.turn_towards(direction, dt);

            let step = budget.min(distance);
            self.position += direction * step;
            budget -= step;

            if step >= distance {
                self.next_corner += 1;
            }
        }
    }

    /// Rotate the heading toward `direction`, limited by the turn rate
    fn turn_towards(&mut self, direction: Vec3, dt: f32) {
        let planar = Vec3::new(direction.x, 0.0, direction.z);
        if planar.length_squared() < 1e-8 {
            return;
        }

        let target = Quat::from_rotation_y(planar.x.atan2(planar.z));
        let max_step = self.profile.angular_speed.to_radians() * dt;
        let angle = self.heading.angle_between(target);

        if angle <= max_step || angle < 1e-4 {
            self.heading = target;
        } else {
            self.heading = self.heading.slerp(target, max_step / angle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavGrid;

    fn open_grid() -> NavGrid {
        NavGrid::new(20, 20, 1.0)
    }

    #[test]
    fn test_new_agent_has_no_path() {
        let agent = NavAgent::new(Vec3::new(1.0, 0.0, 1.0));
        assert!(!agent.has_path_remaining());
        assert_eq!(agent.path_end(), agent.position());
    }

    #[test]
    fn test_set_destination_creates_path() {
        let grid = open_grid();
        let mut agent = NavAgent::new(Vec3::new(1.5, 0.0, 1.5));

        agent.set_destination(&grid, Vec3::new(15.5, 0.0, 1.5));

        assert!(agent.has_path_remaining());
        assert_eq!(agent.path_end(), Vec3::new(15.5, 0.0, 1.5));
    }

    #[test]
    fn test_unreachable_destination_leaves_no_path() {
        let mut grid = open_grid();
        // Wall off the right half
        for y in 0..20 {
            grid.set_walkable(10, y, false);
        }
        let mut agent = NavAgent::new(Vec3::new(1.5, 0.0, 1.5));

        agent.set_destination(&grid, Vec3::new(15.5, 0.0, 1.5));

        assert!(!agent.has_path_remaining());
    }

    #[test]
    fn test_arrival_tolerance_boundary() {
        let grid = open_grid();
        let mut agent = NavAgent::new(Vec3::new(1.5, 0.0, 1.5));
        agent.set_destination(&grid, Vec3::new(4.5, 0.0, 1.5));

        // 3.0 away: still traveling
        assert!(agent.has_path_remaining());

        // Within the 1.75 tolerance: counts as arrived
        agent.set_position(Vec3::new(3.5, 0.0, 1.5));
        assert!(!agent.has_path_remaining());
    }

    #[test]
    fn test_advance_reaches_destination() {
        let grid = open_grid();
        let mut agent = NavAgent::new(Vec3::new(1.5, 0.0, 1.5));
        agent.set_destination(&grid, Vec3::new(10.5, 0.0, 1.5));

        for _ in 0..600 {
            agent.advance(1.0 / 60.0);
            if !agent.has_path_remaining() {
                break;
            }
        }

        assert!(!agent.has_path_remaining(), "agent should arrive within 10s");
        assert!(agent.position().distance(Vec3::new(10.5, 0.0, 1.5)) < 2.0);
    }

    #[test]
    fn test_advance_turns_toward_travel_direction() {
        let grid = open_grid();
        let mut agent = NavAgent::new(Vec3::new(1.5, 0.0, 1.5));
        agent.set_destination(&grid, Vec3::new(1.5, 0.0, 10.5));

        for _ in 0..120 {
            agent.advance(1.0 / 60.0);
        }

        // Travelling along +Z, the forward vector should line up with it
        assert!(agent.forward().dot(Vec3::Z) > 0.95);
    }

    #[test]
    fn test_reset_path_clears_travel() {
        let grid = open_grid();
        let mut agent = NavAgent::new(Vec3::new(1.5, 0.0, 1.5));
        agent.set_destination(&grid, Vec3::new(15.5, 0.0, 15.5));
        assert!(agent.has_path_remaining());

        agent.reset_path();

        assert!(!agent.has_path_remaining());
        let before = agent.position();
        agent.advance(1.0);
        assert_eq!(agent.position(), before);
    }

    #[test]
    fn test_movement_profile_swap() {
        let mut agent = NavAgent::new(Vec3::ZERO);
        assert_eq!(agent.movement_profile(), MovementProfile::WALK);

        agent.set_movement_profile(MovementProfile::FLEE);
        assert_eq!(agent.movement_profile().speed, 10.0);
        assert_eq!(agent.movement_profile().angular_speed, 500.0);
    }
}
