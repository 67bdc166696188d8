//! Waypoint patrol selection
//!
//! Agents walk a fixed set of waypoints, never revisiting any of the last
//! three goals, always preferring the nearest remaining candidate. Physical
//! distance ties are common on symmetric layouts, so ties break by the
//! waypoints' stable ordering key (their name) to keep runs deterministic.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A fixed patrol destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Stable ordering key, unique within a route
    pub name: String,
    /// World-space position
    pub position: Vec3,
}

impl Waypoint {
    /// Create a waypoint
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Index of a waypoint within a route's snapshot
pub type WaypointId = usize;

/// Fixed-capacity ring of the most recently visited waypoints.
///
/// Holds the current goal and the two before it; pushing a fourth entry
/// evicts the oldest. The ring's contents are exactly the waypoints a pick
/// must exclude.
#[derive(Debug, Clone, Default)]
pub struct GoalHistory {
    slots: [Option<WaypointId>; 3],
    /// Slot the next push writes into (the oldest entry)
    cursor: usize,
}

impl GoalHistory {
    /// Record a visited waypoint, evicting the oldest entry
    pub fn push(&mut self, id: WaypointId) {
        self.slots[self.cursor] = Some(id);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Whether the waypoint is among the last three goals
    #[must_use]
    pub fn contains(&self, id: WaypointId) -> bool {
        self.slots.contains(&Some(id))
    }

    /// The most recently pushed goal, if any
    #[must_use]
    pub fn current(&self) -> Option<WaypointId> {
        let last = (self.cursor + self.slots.len() - 1) % self.slots.len();
        self.slots[last]
    }

    /// Forget all recorded goals
    pub fn clear(&mut self) {
        self.slots = [None; 3];
        self.cursor = 0;
    }
}

/// A patrol route: a waypoint snapshot plus goal recency.
///
/// The snapshot is taken once at agent spawn and sorted by name, so the
/// route's iteration order is the stable tie-break order.
#[derive(Debug, Clone)]
pub struct PatrolRoute {
    waypoints: Vec<Waypoint>,
    history: GoalHistory,
}

impl PatrolRoute {
    /// Snapshot a waypoint set into a route, ordering it deterministically
    #[must_use]
    pub fn new(mut waypoints: Vec<Waypoint>) -> Self {
        waypoints.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            waypoints,
            history: GoalHistory::default(),
        }
    }

    /// The snapshot, in stable order
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Look up a waypoint by id
    #[must_use]
    pub fn get(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.get(id)
    }

    /// Number of waypoints in the route
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the route has no waypoints
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// The goal recency ring
    #[must_use]
    pub fn history(&self) -> &GoalHistory {
        &self.history
    }

    /// Pick the next patrol goal from `position`.
    ///
    /// Excludes the last three goals, then takes the nearest candidate;
    /// ties break toward the smaller ordering key. Routes with fewer than
    /// four waypoints cannot honor the exclusion and fall back to the
    /// nearest waypoint overall. Returns `None` only for an empty route.
    pub fn pick_next(&mut self, position: Vec3) -> Option<WaypointId> {
        let selected = self
            .nearest(position, true)
            .or_else(|| self.nearest(position, false))?;

        self.history.push(selected);
        Some(selected)
    }

    /// Nearest waypoint to `position`, optionally skipping recent goals
    fn nearest(&self, position: Vec3, exclude_recent: bool) -> Option<WaypointId> {
        let mut best: Option<(WaypointId, f32)> = None;

        for (id, waypoint) in self.waypoints.iter().enumerate() {
            if exclude_recent && self.history.contains(id) {
                continue;
            }
            let distance = waypoint.position.distance(position);
            // Strict comparison: on a tie the earlier (smaller key) wins
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((id, distance));
            }
        }

        best.map(|(id, _)| id)
    }
}
