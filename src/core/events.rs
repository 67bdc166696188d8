//! Event Queue for Decoupled Agent Communication
//!
//! This module provides a type-safe, double-buffered event queue that carries
//! threat reports into the simulation and behavior notifications out of it.
//! Events are written during one tick and processed in the next, ensuring
//! consistent behavior regardless of system update order.
//!
//! # Design Principles
//!
//! - **Type Safety**: All events are strongly typed via the `SimEvent` enum
//! - **Double Buffering**: Events are tick-consistent (no mid-tick mutations)
//! - **Simplicity**: No complex pub/sub - just push and iterate
//!
//! # Example
//!
//! ```ignore
//! // From a detection system, at any point between ticks
//! world.events_mut().push(SimEvent::ThreatSpotted {
//!     position: Vec3::new(4.0, 0.0, 7.0),
//! });
//!
//! // In an audio or animation layer, after the tick
//! for event in world.events().iter() {
//!     if let SimEvent::FleeStarted { agent, .. } = event {
//!         play_panic_animation(*agent);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

// ============================================================================
// Event Types
// ============================================================================

/// Simulation events flowing between the agent core and surrounding systems.
///
/// `ThreatSpotted` flows inward (detection systems push it, coordinators
/// consume it at the start of the next tick). The remaining variants flow
/// outward so that animation, audio, and UI layers can react without being
/// coupled to the agent internals.
///
/// # Extensibility
///
/// The `#[non_exhaustive]` attribute allows adding new variants without
/// breaking downstream code that uses wildcard patterns.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SimEvent {
    /// A threat was detected somewhere in the world.
    ///
    /// Delivered to every agent's coordinator before its next per-tick
    /// update. Agents outside their detection radius ignore it.
    ThreatSpotted {
        /// World-space threat position
        position: Vec3,
    },

    /// An agent started fleeing toward an escape destination.
    FleeStarted {
        /// The fleeing agent
        agent: Entity,
        /// The escape destination it is heading for
        destination: Vec3,
    },

    /// An agent reached its escape destination and calmed down.
    FleeEnded {
        /// The agent that arrived
        agent: Entity,
    },

    /// An agent picked a patrol waypoint and started walking.
    PatrolResumed {
        /// The patrolling agent
        agent: Entity,
        /// The waypoint position it is heading for
        destination: Vec3,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for tick-consistent event processing.
///
/// Events pushed during tick N are available for reading during tick N+1.
/// This is what makes the threat source safe to invoke at any point between
/// ticks: the push lands in the pending buffer and is only observed at the
/// next frame boundary.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<SimEvent>,
    /// Events from the previous tick, ready for processing
    processing: VecDeque<SimEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next tick.
    ///
    /// Events are not immediately visible to iterators. `swap()` at the
    /// frame boundary makes them available.
    #[inline]
    pub fn push(&mut self, event: SimEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// Called once per tick at the frame boundary. After swapping, `iter()`
    /// returns events from the previous tick and `push()` writes to a fresh
    /// pending queue.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous tick.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.processing.iter()
    }

    /// Drain all events from the previous tick.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any events to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pending for next tick.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
