//! Scenario serialization and deserialization
//!
//! Supports saving and loading simulation setups - walkability grid,
//! waypoint set, and agent spawns - in RON (Rusty Object Notation) and JSON
//! formats.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::ai::Waypoint;
use crate::nav::NavGrid;

/// Serializable description of a walkability grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    /// Cell size in world units
    pub cell_size: f32,
    /// World origin offset (x, z)
    #[serde(default)]
    pub origin: Vec2,
    /// Unwalkable cells as (x, y) grid coordinates
    #[serde(default)]
    pub blocked: Vec<(usize, usize)>,
}

impl GridSpec {
    /// Build the runtime grid this spec describes
    #[must_use]
    pub fn build(&self) -> NavGrid {
        let mut grid = NavGrid::new(self.width, self.height, self.cell_size);
        grid.origin = self.origin;
        for &(x, y) in &self.blocked {
            grid.set_walkable(x, y, false);
        }
        grid
    }
}

/// An agent to spawn when the scenario loads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpawn {
    /// Agent name, for logs and events
    pub name: String,
    /// Spawn position
    pub position: Vec3,
    /// RNG seed for this agent's randomized escape probes
    #[serde(default)]
    pub seed: u64,
}

/// A complete simulation setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Scenario version for compatibility
    pub version: u32,
    /// Walkability grid
    pub grid: GridSpec,
    /// Patrol waypoints shared by all agents
    pub waypoints: Vec<Waypoint>,
    /// Agents to spawn
    pub agents: Vec<AgentSpawn>,
}

impl Scenario {
    /// Create an empty scenario over the given grid
    #[must_use]
    pub fn new(name: impl Into<String>, grid: GridSpec) -> Self {
        Self {
            name: name.into(),
            version: 1,
            grid,
            waypoints: Vec::new(),
            agents: Vec::new(),
        }
    }

    /// Save the scenario to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ScenarioError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scenario from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content =
            fs::read_to_string(path).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        let scenario: Scenario =
            ron::from_str(&content).map_err(|e| ScenarioError::DeserializeError(e.to_string()))?;
        Ok(scenario)
    }

    /// Save the scenario to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ScenarioError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scenario from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content =
            fs::read_to_string(path).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        let scenario: Scenario = serde_json::from_str(&content)
            .map_err(|e| ScenarioError::DeserializeError(e.to_string()))?;
        Ok(scenario)
    }

    /// Number of waypoints in the scenario
    #[must_use]
    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    /// Number of agents the scenario spawns
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

/// Errors that can occur during scenario operations
#[derive(Debug, Clone)]
pub enum ScenarioError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ScenarioError {}
