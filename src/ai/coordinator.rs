//! Per-tick arbitration between patrol and flee behavior
//!
//! The coordinator is the top of each agent's decision loop. Once per tick,
//! in this order:
//!
//! 1. A due deferred recheck re-runs the stored threat.
//! 2. Otherwise, an agent with no path remaining either finishes a flee
//!    (reset path, restore the walk gait, go idle) or picks the next patrol
//!    waypoint.
//!
//! Threat reports may also arrive directly between ticks via
//! [`Coordinator::on_threat_detected`]; a newer threat simply overwrites
//! the single pending-recheck slot.

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ai::{PatrolRoute, ThreatConfig, ThreatResponder, Waypoint};
use crate::nav::{MovementProfile, NavAgent, PathPlanner};

/// Behavior state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No destination and no decision yet this tick
    Idle,
    /// Walking a patrol waypoint
    Patrolling,
    /// Escaping a threat
    Fleeing,
}

/// Top-level decision loop for one agent
#[derive(Debug)]
pub struct Coordinator {
    mode: Mode,
    route: PatrolRoute,
    responder: ThreatResponder,
    /// Gait restored when a flee ends
    walk_profile: MovementProfile,
    /// Seconds between a flee decision and its deferred re-evaluation
    recheck_delay: f32,
    /// When the pending recheck was armed, if any
    pending_recheck_at: Option<f32>,
    /// Last threat that triggered a response
    threat_position: Option<Vec3>,
    rng: ChaCha8Rng,
}

impl Coordinator {
    /// Default delay before a deferred threat recheck fires
    pub const DEFAULT_RECHECK_DELAY: f32 = 0.5;

    /// Create a coordinator for an agent patrolling `route`
    #[must_use]
    pub fn new(route: PatrolRoute) -> Self {
        Self {
            mode: Mode::Idle,
            route,
            responder: ThreatResponder::default(),
            walk_profile: MovementProfile::WALK,
            recheck_delay: Self::DEFAULT_RECHECK_DELAY,
            pending_recheck_at: None,
            threat_position: None,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    /// Seed the coordinator's RNG (runs are deterministic per seed)
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Replace the patrol gait
    #[must_use]
    pub fn with_walk_profile(mut self, profile: MovementProfile) -> Self {
        self.walk_profile = profile;
        self
    }

    /// Replace the threat tuning
    #[must_use]
    pub fn with_threat_config(mut self, config: ThreatConfig) -> Self {
        self.responder = ThreatResponder::new(config);
        self
    }

    /// Replace the deferred-recheck delay
    #[must_use]
    pub fn with_recheck_delay(mut self, delay: f32) -> Self {
        self.recheck_delay = delay;
        self
    }

    /// Current behavior state
    #[must_use]
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the agent is escaping a threat
    #[must_use]
    #[inline]
    pub fn is_fleeing(&self) -> bool {
        self.mode == Mode::Fleeing
    }

    /// When the pending recheck was armed, if one is outstanding
    #[must_use]
    pub fn pending_recheck_at(&self) -> Option<f32> {
        self.pending_recheck_at
    }

    /// The patrol route this agent walks
    #[must_use]
    pub fn route(&self) -> &PatrolRoute {
        &self.route
    }

    /// The waypoint most recently chosen as a patrol goal
    #[must_use]
    pub fn current_goal(&self) -> Option<&Waypoint> {
        self.route.history().current().and_then(|id| self.route.get(id))
    }

    /// Report a threat at `threat`.
    ///
    /// Safe to call at any point between ticks. Threats outside the
    /// detection radius change nothing. Inside it, the agent re-aims and
    /// runs the escape search; on success the mode switches to `Fleeing`,
    /// and a shrunken or randomized search arms the deferred recheck.
    pub fn on_threat_detected(
        &mut self,
        agent: &mut NavAgent,
        planner: &dyn PathPlanner,
        threat: Vec3,
        now: f32,
    ) {
        let Some(report) = self.responder.respond(agent, planner, &mut self.rng, threat) else {
            return;
        };

        self.threat_position = Some(threat);
        if report.fled() {
            self.mode = Mode::Fleeing;
            log::debug!(
                "fleeing via {:?} toward {:?}",
                report.outcome,
                agent.path_end()
            );
        } else {
            log::warn!("no escape found from threat at {threat:?}, retrying shortly");
        }
        if report.wants_recheck {
            self.pending_recheck_at = Some(now);
        }
    }

    /// Evaluate one simulation tick.
    ///
    /// `now` is the current simulation time in seconds; movement itself is
    /// advanced separately by the caller.
    pub fn tick(&mut self, agent: &mut NavAgent, planner: &dyn PathPlanner, now: f32) {
        if let Some(armed_at) = self.pending_recheck_at {
            if now > armed_at + self.recheck_delay {
                self.pending_recheck_at = None;
                if let Some(threat) = self.threat_position {
                    self.on_threat_detected(agent, planner, threat, now);
                }
                return;
            }
        }

        if agent.has_path_remaining() {
            return;
        }

        match self.mode {
            Mode::Fleeing => self.finish_flee(agent),
            Mode::Idle | Mode::Patrolling => self.pick_patrol_goal(agent, planner),
        }
    }

    /// Arrival at (or abandonment of) a flee destination
    fn finish_flee(&mut self, agent: &mut NavAgent) {
        agent.reset_path();
        agent.set_movement_profile(self.walk_profile);
        self.mode = Mode::Idle;
        self.pending_recheck_at = None;
        log::debug!("flee finished at {:?}", agent.position());
    }

    /// Choose and head for the next patrol waypoint
    fn pick_patrol_goal(&mut self, agent: &mut NavAgent, planner: &dyn PathPlanner) {
        let Some(id) = self.route.pick_next(agent.position()) else {
            return;
        };

        // Route ids always resolve; pick_next only hands out indexes into
        // its own snapshot
        if let Some(waypoint) = self.route.get(id) {
            let destination = waypoint.position;
            agent.set_destination(planner, destination);
            self.mode = Mode::Patrolling;
            log::debug!("patrolling toward '{}'", waypoint.name);
        }
    }
}
