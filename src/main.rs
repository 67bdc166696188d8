//! Headless demo: a few agents patrol a walled courtyard, then scatter from
//! a threat dropped in their midst.
//!
//! Run with `RUST_LOG=debug` to watch every decision. Pass a `.ron` or
//! `.json` scenario path to replace the built-in courtyard.

use scurry::prelude::*;

/// Built-in scenario: a 40x40 courtyard with a cross-shaped wall and four
/// corner waypoints
fn courtyard() -> Scenario {
    let mut blocked = Vec::new();
    for i in 15..=25 {
        blocked.push((i, 20));
        blocked.push((20, i));
    }

    let mut scenario = Scenario::new(
        "courtyard",
        GridSpec {
            width: 40,
            height: 40,
            cell_size: 1.0,
            origin: Vec2::ZERO,
            blocked,
        },
    );

    scenario.waypoints = vec![
        Waypoint::new("corner-ne", Vec3::new(34.5, 0.0, 34.5)),
        Waypoint::new("corner-nw", Vec3::new(5.5, 0.0, 34.5)),
        Waypoint::new("corner-se", Vec3::new(34.5, 0.0, 5.5)),
        Waypoint::new("corner-sw", Vec3::new(5.5, 0.0, 5.5)),
        Waypoint::new("gate", Vec3::new(20.5, 0.0, 2.5)),
    ];
    scenario.agents = vec![
        AgentSpawn {
            name: "sentry-a".to_string(),
            position: Vec3::new(10.5, 0.0, 10.5),
            seed: 1,
        },
        AgentSpawn {
            name: "sentry-b".to_string(),
            position: Vec3::new(30.5, 0.0, 30.5),
            seed: 2,
        },
        AgentSpawn {
            name: "sentry-c".to_string(),
            position: Vec3::new(10.5, 0.0, 30.5),
            seed: 3,
        },
    ];
    scenario
}

fn load_scenario(path: &str) -> Result<Scenario, scurry::core::ScenarioError> {
    if path.ends_with(".json") {
        Scenario::load_json(path)
    } else {
        Scenario::load_ron(path)
    }
}

fn main() {
    env_logger::init();

    let scenario = match std::env::args().nth(1) {
        Some(path) => match load_scenario(&path) {
            Ok(scenario) => scenario,
            Err(e) => {
                eprintln!("Failed to load scenario '{path}': {e}");
                std::process::exit(1);
            }
        },
        None => courtyard(),
    };

    let mut world = World::from_scenario(&scenario);

    // The threat lands next to the first agent so the demo always shows a flee
    let first_agent = {
        let mut agents = world.inner.query::<&Name>();
        agents.iter().next().map(|(entity, _)| entity)
    };

    let mut flee_starts = 0u32;
    let mut flee_ends = 0u32;
    let mut patrol_resumes = 0u32;

    // 20 simulated seconds at 60 Hz, threat dropped at the 5 second mark
    for tick in 0..1200u32 {
        if tick == 300 {
            if let Some(position) = first_agent.and_then(|agent| world.agent_position(agent)) {
                let threat = position + Vec3::new(4.0, 0.0, 0.0);
                log::info!("threat dropped at {threat:?}");
                world.report_threat(threat);
            }
        }

        world.tick();

        for event in world.events().iter() {
            match event {
                SimEvent::FleeStarted { agent, destination } => {
                    flee_starts += 1;
                    log::info!("{agent:?} fleeing toward {destination:?}");
                }
                SimEvent::FleeEnded { agent } => {
                    flee_ends += 1;
                    log::info!("{agent:?} calmed down");
                }
                SimEvent::PatrolResumed { .. } => patrol_resumes += 1,
                _ => {}
            }
        }
    }

    println!(
        "{}: simulated {:.1}s - {} patrols resumed, {} flees started, {} completed",
        scenario.name,
        world.time().now(),
        patrol_resumes,
        flee_starts,
        flee_ends
    );
}
