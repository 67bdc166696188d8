//! Core simulation module
//!
//! Contains the simulation clock, the event queue, and scenario I/O.

mod events;
mod scenario;
mod time;

pub use events::{EventQueue, SimEvent};
pub use scenario::{AgentSpawn, GridSpec, Scenario, ScenarioError};
pub use time::Time;
