//! World wrapper around hecs for multi-agent simulation
//!
//! Owns the walkability grid, the simulation clock, and the event queue.
//! Waypoints are registered as entities; each agent snapshots the registry
//! once at spawn and keeps its own patrol state from then on.

use glam::Vec3;
use hecs::Entity;

use crate::ai::{Coordinator, Mode, PatrolRoute, Waypoint};
use crate::core::{EventQueue, SimEvent, Time};
use crate::nav::{NavAgent, NavGrid};

/// Name component for logs and events
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    /// Create a name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Simulation world containing all waypoints and agents
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
    planner: NavGrid,
    events: EventQueue,
    time: Time,
}

impl World {
    /// Create an empty world over the given grid
    #[must_use]
    pub fn new(planner: NavGrid) -> Self {
        Self {
            inner: hecs::World::new(),
            planner,
            events: EventQueue::new(),
            time: Time::new(),
        }
    }

    /// Build a world from a scenario: grid, waypoints, then agents
    #[must_use]
    pub fn from_scenario(scenario: &crate::core::Scenario) -> Self {
        let mut world = Self::new(scenario.grid.build());

        for waypoint in &scenario.waypoints {
            world.spawn_waypoint(waypoint.clone());
        }
        for spawn in &scenario.agents {
            world.spawn_agent(&spawn.name, spawn.position, spawn.seed);
        }

        log::info!(
            "loaded scenario '{}': {} waypoints, {} agents",
            scenario.name,
            scenario.waypoint_count(),
            scenario.agent_count()
        );
        world
    }

    /// The path planner shared by every agent
    #[must_use]
    pub fn planner(&self) -> &NavGrid {
        &self.planner
    }

    /// The simulation clock
    #[must_use]
    pub fn time(&self) -> Time {
        self.time
    }

    /// Events from the previous tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Mutable access to the event queue, e.g. for external detection
    /// systems pushing threat reports
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Register a patrol waypoint
    pub fn spawn_waypoint(&mut self, waypoint: Waypoint) -> Entity {
        self.inner.spawn((waypoint,))
    }

    /// Spawn an agent at `position`.
    ///
    /// The waypoint registry is snapshotted here, once; waypoints added
    /// later are invisible to this agent.
    pub fn spawn_agent(&mut self, name: &str, position: Vec3, seed: u64) -> Entity {
        let mut registry = self.inner.query::<&Waypoint>();
        let waypoints: Vec<Waypoint> = registry.iter().map(|(_, w)| w.clone()).collect();
        drop(registry);

        let route = PatrolRoute::new(waypoints);
        let coordinator = Coordinator::new(route).with_seed(seed);

        log::info!("spawning agent '{name}' at {position:?}");
        self.inner
            .spawn((Name::new(name), NavAgent::new(position), coordinator))
    }

    /// Report a threat to every agent.
    ///
    /// Safe to call at any point between ticks; delivery happens at the
    /// start of the next tick, before any agent's own update.
    pub fn report_threat(&mut self, position: Vec3) {
        self.events.push(SimEvent::ThreatSpotted { position });
    }

    /// Advance the simulation by one tick.
    ///
    /// Clock first, then the event swap, then per agent: threat delivery,
    /// the coordinator's decision, and kinematic movement. Mode transitions
    /// are published as events for the surrounding systems.
    pub fn tick(&mut self) {
        self.time.advance();
        let now = self.time.now();
        let dt = self.time.delta_seconds();

        self.events.swap();
        let threats: Vec<Vec3> = self
            .events
            .iter()
            .filter_map(|event| match event {
                SimEvent::ThreatSpotted { position } => Some(*position),
                _ => None,
            })
            .collect();

        for (entity, (agent, coordinator)) in self
            .inner
            .query_mut::<(&mut NavAgent, &mut Coordinator)>()
        {
            let before = coordinator.mode();

            for &threat in &threats {
                coordinator.on_threat_detected(agent, &self.planner, threat, now);
            }
            coordinator.tick(agent, &self.planner, now);
            agent.advance(dt);

            match (before, coordinator.mode()) {
                (Mode::Fleeing, Mode::Fleeing) => {}
                (_, Mode::Fleeing) => self.events.push(SimEvent::FleeStarted {
                    agent: entity,
                    destination: agent.path_end(),
                }),
                (Mode::Fleeing, _) => self.events.push(SimEvent::FleeEnded { agent: entity }),
                (Mode::Idle, Mode::Patrolling) => {
                    self.events.push(SimEvent::PatrolResumed {
                        agent: entity,
                        destination: agent.path_end(),
                    });
                }
                _ => {}
            }
        }
    }

    /// Behavior state of an agent entity
    #[must_use]
    pub fn agent_mode(&self, entity: Entity) -> Option<Mode> {
        self.inner
            .get::<&Coordinator>(entity)
            .ok()
            .map(|c| c.mode())
    }

    /// World position of an agent entity
    #[must_use]
    pub fn agent_position(&self, entity: Entity) -> Option<Vec3> {
        self.inner
            .get::<&NavAgent>(entity)
            .ok()
            .map(|a| a.position())
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Check if an entity exists
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    #[must_use]
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
