//! Grid-based reference planner
//!
//! A* navigation over a walkable-cell grid on the XZ plane. This is the
//! in-crate implementation of [`PathPlanner`](crate::nav::PathPlanner),
//! used by the tests and the demo; real deployments can substitute any
//! navmesh engine behind the same trait.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::nav::{Path, PathPlanner, PathStatus};

/// A 2D walkability grid laid out on the world's XZ plane
#[derive(Debug, Clone)]
pub struct NavGrid {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    /// Cell size in world units
    pub cell_size: f32,
    /// Walkable cells (true = walkable)
    cells: Vec<bool>,
    /// World origin offset (x, z)
    pub origin: Vec2,
}

impl NavGrid {
    /// Create a new grid (all cells walkable by default)
    #[must_use]
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            cells: vec![true; width * height],
            origin: Vec2::ZERO,
        }
    }

    /// Set a cell's walkability
    pub fn set_walkable(&mut self, x: usize, y: usize, walkable: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = walkable;
        }
    }

    /// Check if a cell is walkable
    #[must_use]
    pub fn is_walkable(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x]
    }

    /// Convert a world position to grid coordinates
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec3) -> (i32, i32) {
        let local = Vec2::new(pos.x, pos.z) - self.origin;
        (
            (local.x / self.cell_size).floor() as i32,
            (local.y / self.cell_size).floor() as i32,
        )
    }

    /// Convert grid coordinates to a world position (center of cell, y = 0)
    #[must_use]
    pub fn grid_to_world(&self, x: usize, y: usize) -> Vec3 {
        let planar = self.origin
            + Vec2::new(
                (x as f32 + 0.5) * self.cell_size,
                (y as f32 + 0.5) * self.cell_size,
            );
        Vec3::new(planar.x, 0.0, planar.y)
    }

    /// Get neighbors of a cell (4-directional)
    fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(4);

        if x > 0 && self.is_walkable(x - 1, y) {
            result.push((x - 1, y));
        }
        if x + 1 < self.width && self.is_walkable(x + 1, y) {
            result.push((x + 1, y));
        }
        if y > 0 && self.is_walkable(x, y - 1) {
            result.push((x, y - 1));
        }
        if y + 1 < self.height && self.is_walkable(x, y + 1) {
            result.push((x, y + 1));
        }

        result
    }

    /// Collapse a cell path to its corners: cells where the direction of
    /// travel changes, plus both endpoints.
    fn collapse_corners(&self, cells: &[(usize, usize)]) -> SmallVec<[Vec3; 8]> {
        let mut corners = SmallVec::new();

        let Some(&first) = cells.first() else {
            return corners;
        };
        corners.push(self.grid_to_world(first.0, first.1));

        for window in cells.windows(3) {
            let &[a, b, c] = window else { continue };
            let dir_in = (b.0 as i32 - a.0 as i32, b.1 as i32 - a.1 as i32);
            let dir_out = (c.0 as i32 - b.0 as i32, c.1 as i32 - b.1 as i32);
            if dir_in != dir_out {
                corners.push(self.grid_to_world(b.0, b.1));
            }
        }

        if cells.len() > 1 {
            let last = cells[cells.len() - 1];
            corners.push(self.grid_to_world(last.0, last.1));
        }

        corners
    }
}

/// A* node for the priority queue
#[derive(Debug, Clone)]
struct Node {
    x: usize,
    y: usize,
    f_cost: f32, // cost from start + heuristic
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PathPlanner for NavGrid {
    fn plan(&self, from: Vec3, to: Vec3) -> Path {
        let (start_x, start_y) = self.world_to_grid(from);
        let (goal_x, goal_y) = self.world_to_grid(to);

        // Validate coordinates
        if start_x < 0 || start_y < 0 || goal_x < 0 || goal_y < 0 {
            return Path::invalid();
        }

        let start_x = start_x as usize;
        let start_y = start_y as usize;
        let goal_x = goal_x as usize;
        let goal_y = goal_y as usize;

        if !self.is_walkable(start_x, start_y) || !self.is_walkable(goal_x, goal_y) {
            return Path::invalid();
        }

        if (start_x, start_y) == (goal_x, goal_y) {
            let mut corners = SmallVec::new();
            corners.push(self.grid_to_world(goal_x, goal_y));
            return Path {
                corners,
                status: PathStatus::Valid,
            };
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: FxHashMap<(usize, usize), (usize, usize)> = FxHashMap::default();
        let mut g_score: FxHashMap<(usize, usize), f32> = FxHashMap::default();

        let heuristic = |x: usize, y: usize| -> f32 {
            let dx = (x as f32 - goal_x as f32).abs();
            let dy = (y as f32 - goal_y as f32).abs();
            dx + dy // Manhattan distance
        };

        g_score.insert((start_x, start_y), 0.0);
        open_set.push(Node {
            x: start_x,
            y: start_y,
            f_cost: heuristic(start_x, start_y),
        });

        while let Some(current) = open_set.pop() {
            if current.x == goal_x && current.y == goal_y {
                // Reconstruct the cell path
                let mut cells = vec![(goal_x, goal_y)];
                let mut curr = (goal_x, goal_y);

                while let Some(&prev) = came_from.get(&curr) {
                    cells.push(prev);
                    curr = prev;
                }

                cells.reverse();

                return Path {
                    corners: self.collapse_corners(&cells),
                    status: PathStatus::Valid,
                };
            }

            for (nx, ny) in self.neighbors(current.x, current.y) {
                let tentative_g = g_score.get(&(current.x, current.y)).unwrap_or(&f32::MAX) + 1.0;

                if tentative_g < *g_score.get(&(nx, ny)).unwrap_or(&f32::MAX) {
                    came_from.insert((nx, ny), (current.x, current.y));
                    g_score.insert((nx, ny), tentative_g);

                    open_set.push(Node {
                        x: nx,
                        y: ny,
                        f_cost: tentative_g + heuristic(nx, ny),
                    });
                }
            }
        }

        // No path found
        Path::invalid()
    }

    fn sample(&self, near: Vec3, max_radius: f32) -> Option<Vec3> {
        if max_radius <= 0.0 {
            return None;
        }

        let anchor = Vec2::new(near.x, near.z);

        // Scan the cell range covered by the sample radius, clamped to the
        // grid, and keep the nearest walkable center.
        let min = ((anchor - Vec2::splat(max_radius)) - self.origin) / self.cell_size;
        let max = ((anchor + Vec2::splat(max_radius)) - self.origin) / self.cell_size;

        let x_min = (min.x.floor().max(0.0)) as usize;
        let y_min = (min.y.floor().max(0.0)) as usize;
        let x_max = (max.x.ceil().max(0.0) as usize).min(self.width.saturating_sub(1));
        let y_max = (max.y.ceil().max(0.0) as usize).min(self.height.saturating_sub(1));

        if min.x > self.width as f32 || min.y > self.height as f32 {
            return None;
        }

        let mut best: Option<(Vec3, f32)> = None;
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                if !self.is_walkable(x, y) {
                    continue;
                }
                let center = self.grid_to_world(x, y);
                let distance = Vec2::new(center.x, center.z).distance(anchor);
                if distance > max_radius {
                    continue;
                }
                match best {
                    Some((_, best_distance)) if distance >= best_distance => {}
                    _ => best = Some((center, distance)),
                }
            }
        }

        best.map(|(center, _)| center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_pathfinding_around_wall() {
        let mut grid = NavGrid::new(10, 10, 1.0);

        // Create a wall
        for y in 2..8 {
            grid.set_walkable(5, y, false);
        }

        let path = grid.plan(Vec3::new(2.5, 0.0, 5.5), Vec3::new(8.5, 0.0, 5.5));

        assert!(path.is_valid());
        assert!(path.corners.len() > 2); // Should go around the wall
        assert_eq!(path.end(), Some(Vec3::new(8.5, 0.0, 5.5)));
    }

    #[test]
    fn test_direct_path_collapses_to_endpoints() {
        let grid = NavGrid::new(10, 10, 1.0);

        let path = grid.plan(Vec3::new(0.5, 0.0, 0.5), Vec3::new(6.5, 0.0, 0.5));

        assert!(path.is_valid());
        // A straight run keeps only its endpoints as corners
        assert_eq!(path.corners.len(), 2);
        assert!((path.length() - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_path_is_invalid() {
        let mut grid = NavGrid::new(5, 5, 1.0);

        // Block everything around the goal
        grid.set_walkable(3, 2, false);
        grid.set_walkable(3, 4, false);
        grid.set_walkable(2, 3, false);
        grid.set_walkable(4, 3, false);

        let path = grid.plan(Vec3::new(0.5, 0.0, 0.5), Vec3::new(3.5, 0.0, 3.5));

        assert_eq!(path.status, PathStatus::Invalid);
        assert!(!path.is_valid());
    }

    #[test]
    fn test_plan_off_grid_is_invalid() {
        let grid = NavGrid::new(5, 5, 1.0);

        let path = grid.plan(Vec3::new(-3.0, 0.0, 0.5), Vec3::new(2.5, 0.0, 2.5));
        assert!(!path.is_valid());
    }

    #[test]
    fn test_same_cell_path_is_single_corner() {
        let grid = NavGrid::new(5, 5, 1.0);

        let path = grid.plan(Vec3::new(2.2, 0.0, 2.2), Vec3::new(2.8, 0.0, 2.8));
        assert!(path.is_valid());
        assert_eq!(path.corners.len(), 1);
    }

    #[test]
    fn test_sample_returns_nearest_walkable() {
        let mut grid = NavGrid::new(5, 5, 1.0);
        grid.set_walkable(2, 2, false);

        // The blocked center cell falls back to an adjacent walkable center
        let sampled = grid.sample(Vec3::new(2.5, 0.0, 2.5), 2.0);
        let point = sampled.expect("a walkable neighbor is in range");
        assert!(point.distance(Vec3::new(2.5, 0.0, 2.5)) <= 2.0);
        let (x, y) = grid.world_to_grid(point);
        assert!(grid.is_walkable(x as usize, y as usize));
    }

    #[test]
    fn test_sample_fails_when_nothing_in_range() {
        let mut grid = NavGrid::new(4, 4, 1.0);
        for y in 0..4 {
            for x in 0..4 {
                grid.set_walkable(x, y, false);
            }
        }

        assert!(grid.sample(Vec3::new(2.0, 0.0, 2.0), 5.0).is_none());
    }

    #[test]
    fn test_sample_far_outside_grid() {
        let grid = NavGrid::new(4, 4, 1.0);

        // Anchor far away: nothing within the radius
        assert!(grid.sample(Vec3::new(100.0, 0.0, 100.0), 3.0).is_none());

        // Anchor outside but within reach of the border cells
        let sampled = grid.sample(Vec3::new(-1.0, 0.0, 0.5), 2.0);
        assert_eq!(sampled, Some(Vec3::new(0.5, 0.0, 0.5)));
    }
}
