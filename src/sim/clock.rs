//! Simulation clock
//!
//! Owns the run and its deferred-callback queue, turns host frame time into
//! fixed ticks and publishes an immutable snapshot after each step.

use std::sync::Arc;

use super::snapshot::Snapshot;
use super::state::World;
use super::tick::{TickInput, tick};
use super::timers::Scheduler;
use crate::consts::*;
use crate::tuning::Tuning;

/// A running game
#[derive(Debug)]
pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    latest: Arc<Snapshot>,
    /// Host time not yet consumed by whole ticks
    accumulator: f32,
}

impl Simulation {
    pub fn new(tuning: Tuning) -> Self {
        let mut world = World::new(tuning, 1);
        log::info!(
            "New run: preset {}, seed {:#x}",
            world.tuning.preset.as_str(),
            world.tuning.seed
        );
        let latest = Arc::new(Snapshot::capture(&mut world));
        Self {
            world,
            scheduler: Scheduler::new(),
            latest,
            accumulator: 0.0,
        }
    }

    /// Run exactly one tick and publish its snapshot
    pub fn tick(&mut self, input: &TickInput) -> Arc<Snapshot> {
        tick(&mut self.world, &mut self.scheduler, input);
        self.publish()
    }

    /// Feed host frame time. Runs as many whole ticks as fit, at most
    /// `MAX_SUBSTEPS`; time beyond that is dropped. Events from every substep
    /// end up in the returned snapshot.
    pub fn advance(&mut self, elapsed_secs: f32, input: &TickInput) -> Arc<Snapshot> {
        if !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
            log::warn!("Ignoring bad frame time {}", elapsed_secs);
            return Arc::clone(&self.latest);
        }
        self.accumulator += elapsed_secs;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.world, &mut self.scheduler, input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if self.accumulator >= SIM_DT {
            log::debug!("Dropping {:.3}s of backlog", self.accumulator);
            self.accumulator = 0.0;
        }

        if substeps == 0 {
            return Arc::clone(&self.latest);
        }
        self.publish()
    }

    /// Start over with the same tuning
    pub fn restart(&mut self) {
        let tuning = self.world.tuning.clone();
        self.restart_with(tuning);
    }

    /// Start over with new tuning. Callbacks queued by the old run are
    /// cancelled and could not fire anyway.
    pub fn restart_with(&mut self, tuning: Tuning) {
        let generation = self.world.generation + 1;
        self.world = World::new(tuning, generation);
        let cancelled = self.scheduler.retain_generation(generation);
        self.accumulator = 0.0;
        log::info!(
            "Restarted as run {} ({} pending callbacks cancelled)",
            generation,
            cancelled
        );
        self.publish();
    }

    fn publish(&mut self) -> Arc<Snapshot> {
        self.latest = Arc::new(Snapshot::capture(&mut self.world));
        Arc::clone(&self.latest)
    }

    /// Most recent snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.latest)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn generation(&self) -> u64 {
        self.world.generation
    }

    pub fn tuning(&self) -> &Tuning {
        &self.world.tuning
    }

    pub fn pending_callbacks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_over(&self) -> bool {
        self.world.game.is_over()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{BulletOwner, EnemyVariant};
    use crate::sim::progression::Phase;
    use crate::sim::snapshot::GameEvent;
    use glam::Vec2;

    fn quiet() -> Tuning {
        Tuning {
            skip_tutorial: true,
            enemy_spawn_chance: 0.0,
            bonus_target_chance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_publishes_snapshot() {
        let mut sim = Simulation::new(quiet());
        let before = sim.snapshot();
        let after = sim.tick(&TickInput::default());
        assert_eq!(before.tick, 0);
        assert_eq!(after.tick, 1);
        // Older snapshots are untouched
        assert_eq!(before.tick, 0);
        assert_eq!(sim.snapshot().tick, 1);
    }

    #[test]
    fn test_advance_accumulates_partial_frames() {
        let mut sim = Simulation::new(quiet());
        let input = TickInput::default();
        sim.advance(SIM_DT * 0.6, &input);
        assert_eq!(sim.world().tick, 0);
        sim.advance(SIM_DT * 0.6, &input);
        assert_eq!(sim.world().tick, 1);
    }

    #[test]
    fn test_advance_caps_substeps_and_drops_backlog() {
        let mut sim = Simulation::new(quiet());
        let input = TickInput::default();
        sim.advance(1.0, &input);
        assert_eq!(sim.world().tick, MAX_SUBSTEPS as u64);
        // The dropped second does not come back on the next frame
        sim.advance(0.0, &input);
        assert_eq!(sim.world().tick, MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_advance_ignores_bad_frame_time() {
        let mut sim = Simulation::new(quiet());
        let input = TickInput::default();
        sim.advance(f32::NAN, &input);
        sim.advance(-1.0, &input);
        assert_eq!(sim.world().tick, 0);
    }

    #[test]
    fn test_substep_events_are_kept() {
        let mut sim = Simulation::new(quiet());
        sim.world
            .store
            .spawn_enemy(EnemyVariant::Drifter, Vec2::new(100.0, 100.0));
        sim.world.store.spawn_bullet(
            BulletOwner::Player,
            Vec2::new(110.0, 110.0),
            Vec2::new(0.0, -10.0),
        );
        let snap = sim.advance(SIM_DT * 3.5, &TickInput::default());
        assert!(snap
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyDestroyed { .. })));
    }

    #[test]
    fn test_restart_cancels_old_callbacks() {
        let mut sim = Simulation::new(quiet());
        sim.world.game.kills_in_level = 30;
        sim.tick(&TickInput::default());
        assert_eq!(sim.world().game.phase, Phase::BossWarning);
        assert_eq!(sim.pending_callbacks(), 1);

        sim.restart();
        assert_eq!(sim.generation(), 2);
        assert_eq!(sim.pending_callbacks(), 0);
        assert_eq!(sim.world().game.phase, Phase::Playing);
        assert_eq!(sim.world().game.score, 0);
        assert!(sim.world().store.enemies.is_empty());

        for _ in 0..240 {
            sim.tick(&TickInput::default());
        }
        assert!(sim.world().store.boss.is_none());
    }

    #[test]
    fn test_restart_is_reproducible() {
        let tuned = Tuning {
            enemy_spawn_chance: 0.5,
            ..quiet()
        };
        let mut a = Simulation::new(tuned.clone());
        let mut b = Simulation::new(tuned);
        a.restart();
        b.restart();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..300 {
            a.tick(&input);
            b.tick(&input);
        }
        let ja = a.snapshot().to_json().unwrap();
        let jb = b.snapshot().to_json().unwrap();
        assert_eq!(ja, jb);
    }

    #[test]
    fn test_game_over_surfaces_in_snapshot() {
        let mut sim = Simulation::new(quiet());
        sim.world.game.lives = 1;
        let center = sim.world.player.pos + Vec2::new(10.0, 10.0);
        sim.world.store.spawn_bullet(
            BulletOwner::Enemy,
            center,
            Vec2::new(0.0, 1.0),
        );
        let snap = sim.tick(&TickInput::default());
        assert_eq!(snap.game.phase, Phase::GameOver);
        assert!(sim.is_over());
        let again = sim.tick(&TickInput::default());
        assert_eq!(again.tick, snap.tick);
    }
}
