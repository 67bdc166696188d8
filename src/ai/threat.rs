//! Threat response and escape search
//!
//! When a threat lands inside the detection radius, the agent turns away
//! from it and runs a bounded search for a reachable escape point:
//!
//! 1. Plan directly to `position + direction * distance`.
//! 2. Failing that, sample the walkable surface for a substitute point.
//! 3. Failing that, halve the distance and try again - at most three times.
//! 4. Past the halving budget (or below 10% of the flee radius), scramble:
//!    up to thirty random walkability probes around the agent.
//!
//! Every shrink of the search arms a deferred recheck, so the coordinator
//! revisits the threat half a second later looking for a better way out -
//! a retry bias that applies even when the shrunken search succeeded.

use glam::{Quat, Vec3};
use rand::Rng;

use crate::nav::{MovementProfile, NavAgent, PathPlanner};

/// Tuning for threat detection and escape
#[derive(Debug, Clone)]
pub struct ThreatConfig {
    /// Planar distance inside which a threat is reacted to
    pub detection_radius: f32,
    /// Preferred escape distance; also the base of the shrinking search
    pub flee_radius: f32,
    /// Movement parameters applied while escaping
    pub flee_profile: MovementProfile,
    /// Cap on randomized walkability probes in the last-resort fallback
    pub max_random_attempts: u32,
    /// Cap on distance halvings before the randomized fallback takes over
    pub max_halvings: u32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            detection_radius: 10.0,
            flee_radius: 10.0,
            flee_profile: MovementProfile::FLEE,
            max_random_attempts: 30,
            max_halvings: 3,
        }
    }
}

/// How an escape search resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeOutcome {
    /// The planner reached the projected flee goal; the agent heads for the
    /// path's final corner
    DirectPath,
    /// The flee goal was unreachable but a surface sample stood in for it
    SampledSurface,
    /// A randomized probe found a walkable point
    Randomized,
    /// Every fallback failed; the agent keeps its previous destination
    Exhausted,
}

/// Result of one threat response
#[derive(Debug, Clone, Copy)]
pub struct EscapeReport {
    /// How the search resolved
    pub outcome: EscapeOutcome,
    /// Whether the threat should be re-evaluated after the recheck delay
    pub wants_recheck: bool,
}

impl EscapeReport {
    /// Whether a flee destination was set
    #[must_use]
    pub fn fled(&self) -> bool {
        self.outcome != EscapeOutcome::Exhausted
    }
}

/// Evaluates threats against an agent and drives the escape search
#[derive(Debug, Clone, Default)]
pub struct ThreatResponder {
    config: ThreatConfig,
}

impl ThreatResponder {
    /// Create a responder with the given tuning
    #[must_use]
    pub fn new(config: ThreatConfig) -> Self {
        Self { config }
    }

    /// The active tuning
    #[must_use]
    pub fn config(&self) -> &ThreatConfig {
        &self.config
    }

    /// React to a threat at `threat`.
    ///
    /// Returns `None` without touching any state when the threat is outside
    /// the detection radius. Otherwise re-aims the agent away from the
    /// threat, runs the escape search, applies the flee profile on success,
    /// and reports how the search resolved.
    pub fn respond(
        &self,
        agent: &mut NavAgent,
        planner: &dyn PathPlanner,
        rng: &mut impl Rng,
        threat: Vec3,
    ) -> Option<EscapeReport> {
        // The threat is judged on the agent's horizontal plane
        let planar_threat = Vec3::new(threat.x, agent.position().y, threat.z);
        if agent.position().distance(planar_threat) >= self.config.detection_radius {
            return None;
        }

        let away = (agent.position() - planar_threat).normalize_or_zero();
        let direction = if away == Vec3::ZERO {
            // Threat exactly on top of the agent: run wherever it was facing
            agent.forward()
        } else {
            away
        };

        // Half-step the heading toward the flee direction; repeated threat
        // events progressively re-aim the agent
        let target = Quat::from_rotation_y(direction.x.atan2(direction.z));
        agent.set_heading(agent.heading().slerp(target, 0.5));

        let report = self.find_escape(agent, planner, rng, direction);
        if report.fled() {
            agent.set_movement_profile(self.config.flee_profile);
        }

        Some(report)
    }

    /// The shrinking escape search.
    ///
    /// An explicit loop rather than recursion: the halving counter is the
    /// visible bound, alongside the 10%-of-flee-radius floor.
    fn find_escape(
        &self,
        agent: &mut NavAgent,
        planner: &dyn PathPlanner,
        rng: &mut impl Rng,
        direction: Vec3,
    ) -> EscapeReport {
        let mut distance = self.config.flee_radius;
        let mut halvings = 0;
        let mut wants_recheck = false;

        loop {
            let goal = agent.position() + direction * distance;

            let path = planner.plan(agent.position(), goal);
            if let Some(end) = path.end().filter(|_| path.is_valid()) {
                // Head for the path's final corner, not the raw goal - the
                // path may curve around obstacles
                agent.set_destination(planner, end);
                return EscapeReport {
                    outcome: EscapeOutcome::DirectPath,
                    wants_recheck,
                };
            }

            // The sample anchor is the bare direction vector treated as a
            // world point, not agent position + direction * distance.
            if let Some(point) = planner.sample(direction, distance) {
                agent.set_destination(planner, point);
                return EscapeReport {
                    outcome: EscapeOutcome::SampledSurface,
                    wants_recheck,
                };
            }

            if distance < self.config.flee_radius * 0.1 || halvings >= self.config.max_halvings {
                return self.scramble(agent, planner, rng, distance);
            }

            distance *= 0.5;
            halvings += 1;
            // Even a successful shrunken search gets revisited shortly - a
            // closer look may turn up a better escape
            wants_recheck = true;
        }
    }

    /// Last-resort randomized search near the agent.
    ///
    /// At most `max_random_attempts` walkability probes, first hit wins.
    /// The recheck is armed regardless of the result.
    fn scramble(
        &self,
        agent: &mut NavAgent,
        planner: &dyn PathPlanner,
        rng: &mut impl Rng,
        distance: f32,
    ) -> EscapeReport {
        for _ in 0..self.config.max_random_attempts {
            let probe = agent.position() + random_in_unit_sphere(rng) * (distance * 0.5);
            if let Some(point) = planner.sample(probe, distance) {
                agent.set_destination(planner, point);
                return EscapeReport {
                    outcome: EscapeOutcome::Randomized,
                    wants_recheck: true,
                };
            }
        }

        EscapeReport {
            outcome: EscapeOutcome::Exhausted,
            wants_recheck: true,
        }
    }
}

/// Uniform point inside the unit sphere, by rejection sampling
fn random_in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{NavGrid, Path, PathStatus};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use smallvec::SmallVec;
    use std::cell::Cell;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    /// Planner double that counts calls and answers from fixed rules
    struct ScriptedPlanner {
        plan_calls: Cell<u32>,
        sample_calls: Cell<u32>,
        /// Points the planner will admit paths to (everything else invalid)
        reachable: Vec<Vec3>,
        /// Rule answering sample queries from (near, max_radius)
        sample_rule: Box<dyn Fn(Vec3, f32) -> Option<Vec3>>,
    }

    impl ScriptedPlanner {
        fn unreachable() -> Self {
            Self {
                plan_calls: Cell::new(0),
                sample_calls: Cell::new(0),
                reachable: Vec::new(),
                sample_rule: Box::new(|_, _| None),
            }
        }
    }

    impl PathPlanner for ScriptedPlanner {
        fn plan(&self, from: Vec3, to: Vec3) -> Path {
            self.plan_calls.set(self.plan_calls.get() + 1);
            if self.reachable.iter().any(|p| p.distance(to) < 1e-4) {
                let mut corners = SmallVec::new();
                corners.push(from);
                corners.push(to);
                Path {
                    corners,
                    status: PathStatus::Valid,
                }
            } else {
                Path::invalid()
            }
        }

        fn sample(&self, near: Vec3, max_radius: f32) -> Option<Vec3> {
            self.sample_calls.set(self.sample_calls.get() + 1);
            (self.sample_rule)(near, max_radius)
        }
    }

    #[test]
    fn test_threat_outside_radius_is_ignored() {
        let responder = ThreatResponder::default();
        let planner = ScriptedPlanner::unreachable();
        let mut agent = NavAgent::new(Vec3::ZERO);
        let heading_before = agent.heading();

        let report = responder.respond(
            &mut agent,
            &planner,
            &mut rng(),
            Vec3::new(12.0, 0.0, 0.0),
        );

        assert!(report.is_none());
        assert_eq!(agent.heading(), heading_before);
        assert_eq!(planner.plan_calls.get(), 0);
        assert_eq!(planner.sample_calls.get(), 0);
    }

    #[test]
    fn test_threat_inside_radius_triggers_search() {
        let responder = ThreatResponder::default();
        let grid = NavGrid::new(40, 40, 1.0);
        let mut agent = NavAgent::new(Vec3::new(20.5, 0.0, 20.5));

        let report = responder
            .respond(
                &mut agent,
                &grid,
                &mut rng(),
                Vec3::new(12.5, 0.0, 20.5), // distance 8, inside radius 10
            )
            .expect("threat at distance 8 must trigger");

        assert_eq!(report.outcome, EscapeOutcome::DirectPath);
        assert!(!report.wants_recheck);
        assert!(agent.has_path_remaining());
        // Fleeing away from the threat: along +X
        assert!(agent.path_end().x > agent.position().x);
        assert_eq!(agent.movement_profile(), MovementProfile::FLEE);
    }

    #[test]
    fn test_vertical_offset_is_ignored_by_detection() {
        let responder = ThreatResponder::default();
        let grid = NavGrid::new(40, 40, 1.0);
        let mut agent = NavAgent::new(Vec3::new(20.5, 0.0, 20.5));

        // Planar distance 8 even though the 3D distance exceeds the radius
        let report = responder.respond(
            &mut agent,
            &grid,
            &mut rng(),
            Vec3::new(12.5, 30.0, 20.5),
        );

        assert!(report.is_some());
    }

    #[test]
    fn test_sampled_fallback_without_shrinking() {
        let responder = ThreatResponder::default();
        let sampled = Vec3::new(3.0, 0.0, 0.0);
        let mut planner = ScriptedPlanner::unreachable();
        planner.sample_rule = Box::new(move |_, _| Some(sampled));
        // The replan to the sampled point must succeed
        planner.reachable.push(sampled);
        let mut agent = NavAgent::new(Vec3::ZERO);

        let report = responder
            .respond(&mut agent, &planner, &mut rng(), Vec3::new(-5.0, 0.0, 0.0))
            .expect("in range");

        assert_eq!(report.outcome, EscapeOutcome::SampledSurface);
        assert!(!report.wants_recheck, "no shrinking happened");
        assert_eq!(agent.path_end(), sampled);
        // One sample for the fallback, no halving afterwards
        assert_eq!(planner.sample_calls.get(), 1);
        assert_eq!(agent.movement_profile(), MovementProfile::FLEE);
    }

    #[test]
    fn test_search_shrinks_at_most_three_times() {
        let responder = ThreatResponder::default();
        let planner = ScriptedPlanner::unreachable();
        let mut agent = NavAgent::new(Vec3::ZERO);

        let report = responder
            .respond(&mut agent, &planner, &mut rng(), Vec3::new(-5.0, 0.0, 0.0))
            .expect("in range");

        assert_eq!(report.outcome, EscapeOutcome::Exhausted);
        // Probes at 10, 5, 2.5 and 1.25 units, then the randomized fallback
        assert_eq!(planner.plan_calls.get(), 4);
        // Four fallback samples plus at most thirty randomized probes
        assert!(planner.sample_calls.get() <= 4 + 30);
        assert_eq!(planner.sample_calls.get(), 34);
    }

    #[test]
    fn test_randomized_fallback_finds_an_escape() {
        let responder = ThreatResponder::default();
        let start = Vec3::new(50.0, 0.0, 0.0);
        let escape = Vec3::new(50.5, 0.0, 0.5);

        let mut planner = ScriptedPlanner::unreachable();
        // Walkability only exists right around the agent, so the direct
        // fallback (anchored on the bare direction vector) misses and only
        // the randomized probes can hit
        planner.sample_rule = Box::new(move |near, _| (near.distance(start) < 5.0).then_some(escape));
        planner.reachable.push(escape);

        let mut agent = NavAgent::new(start);

        let report = responder
            .respond(
                &mut agent,
                &planner,
                &mut rng(),
                start + Vec3::new(-5.0, 0.0, 0.0),
            )
            .expect("in range");

        assert_eq!(report.outcome, EscapeOutcome::Randomized);
        assert!(report.wants_recheck);
        assert_eq!(agent.path_end(), escape);
        assert_eq!(agent.movement_profile(), MovementProfile::FLEE);
        // Four direction-anchored samples, then the first probe hits
        assert!(planner.sample_calls.get() <= 4 + 30);
    }

    #[test]
    fn test_exhausted_search_always_requests_recheck() {
        let responder = ThreatResponder::default();
        let planner = ScriptedPlanner::unreachable();
        let mut agent = NavAgent::new(Vec3::ZERO);
        let profile_before = agent.movement_profile();

        let report = responder
            .respond(&mut agent, &planner, &mut rng(), Vec3::new(-5.0, 0.0, 0.0))
            .expect("in range");

        assert!(report.wants_recheck);
        assert!(!report.fled());
        assert!(!agent.has_path_remaining());
        // No success, no flee gait
        assert_eq!(agent.movement_profile(), profile_before);
    }

    #[test]
    fn test_repeated_threats_progressively_re_aim() {
        let responder = ThreatResponder::default();
        let grid = NavGrid::new(40, 40, 1.0);
        let mut agent = NavAgent::new(Vec3::new(20.5, 0.0, 20.5));
        // Face +Z, threat behind along -X: flee direction is +X
        let threat = Vec3::new(12.5, 0.0, 20.5);

        responder.respond(&mut agent, &grid, &mut rng(), threat);
        let after_one = agent.forward().dot(Vec3::X);

        responder.respond(&mut agent, &grid, &mut rng(), threat);
        let after_two = agent.forward().dot(Vec3::X);

        assert!(after_one > 0.5, "half-turned toward the flee direction");
        assert!(after_two > after_one, "keeps converging on repeat events");
    }

    #[test]
    fn test_random_probe_stays_in_unit_sphere() {
        let mut rng = rng();
        for _ in 0..100 {
            assert!(random_in_unit_sphere(&mut rng).length() <= 1.0);
        }
    }
}
