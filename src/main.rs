//! Star Shmup entry point
//!
//! Headless demo: the autopilot plays one run at the fixed tick rate and the
//! notable events are logged. A real frontend drives `Simulation` the same
//! way, feeding it frame time and input and drawing each snapshot.

use star_shmup::consts::*;
use star_shmup::sim::{GameEvent, Simulation, TickInput};
use star_shmup::Tuning;

/// Demo length when none is given (five minutes of play)
const DEFAULT_DEMO_TICKS: u64 = 5 * 60 * TICK_RATE as u64;

/// Play the demo and log how it went
fn run_demo(tuning: Tuning, max_ticks: u64) {
    let mut sim = Simulation::new(tuning);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    for _ in 0..max_ticks {
        let snapshot = sim.tick(&input);
        for event in &snapshot.events {
            match event {
                GameEvent::BossWarning { level } => log::info!("Boss warning on level {}", level),
                GameEvent::LevelComplete { level } => {
                    log::info!("Level {} cleared at tick {}", level, snapshot.tick)
                }
                GameEvent::ExtraLifeGranted { lives } => log::info!("Extra life ({} lives)", lives),
                GameEvent::PlayerHit { lives_left } => {
                    log::info!("Hit! {} lives left", lives_left)
                }
                GameEvent::TutorialAdvanced { step } => {
                    if let Some(msg) = star_shmup::sim::tutorial_message(*step) {
                        log::info!("Tutorial: {}", msg);
                    }
                }
                _ => {}
            }
        }
        if sim.is_over() {
            break;
        }
    }

    let snapshot = sim.snapshot();
    log::info!(
        "Demo finished after {} ticks: score {}, level {}, lives {}, phase {}",
        snapshot.tick,
        snapshot.game.score,
        snapshot.game.level,
        snapshot.game.lives,
        snapshot.game.phase.as_str()
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> Tuning {
    match std::fs::read_to_string(path) {
        Ok(json) => match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                return tuning;
            }
            Err(e) => log::warn!("Bad tuning file {}: {}", path, e),
        },
        Err(e) => log::warn!("Could not read {}: {}", path, e),
    }
    log::info!("Using default tuning");
    Tuning::default()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Star Shmup (headless) starting...");

    // Usage: star-shmup [tuning.json] [ticks]
    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => load_tuning(&path),
        None => Tuning::default(),
    };
    let max_ticks = args
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(DEFAULT_DEMO_TICKS);

    run_demo(tuning, max_ticks);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Star Shmup (wasm) starting...");
    run_demo(Tuning::default(), DEFAULT_DEMO_TICKS);
}
