//! Spawn policy
//!
//! Independent per-tick Bernoulli trials drawn from the run's seeded RNG. The
//! roll functions are generic over the random source so tests can drive them
//! with their own generator.

use glam::Vec2;
use rand::Rng;

use super::boss;
use super::entity::{BulletOwner, EnemyVariant, Entity};
use super::powerup::PowerUpKind;
use super::progression::Phase;
use super::state::{GameState, World};
use super::timers::{Deferred, Scheduler};
use crate::consts::*;
use crate::ms_to_ticks;
use crate::tuning::Tuning;

/// Where and what to spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub variant: EnemyVariant,
    pub pos: Vec2,
}

/// Drifter entering from above at a random column
pub fn drifter_entry<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning) -> EnemySpawn {
    let max_x = (tuning.playfield_width - ENEMY_SIZE.x).max(1.0);
    EnemySpawn {
        variant: EnemyVariant::Drifter,
        pos: Vec2::new(rng.random_range(0.0..max_x), -ENEMY_SIZE.y),
    }
}

/// Shooter entering from a random side. `y` defaults to a random height in
/// the upper half.
pub fn shooter_entry<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning, y: Option<f32>) -> EnemySpawn {
    let from_left = rng.random_bool(0.5);
    let y = y.unwrap_or_else(|| rng.random_range(0.0..tuning.playfield_height / 2.0));
    let (x, heading) = if from_left {
        (-ENEMY_SIZE.x, 1.0)
    } else {
        (tuning.playfield_width, -1.0)
    };
    EnemySpawn {
        variant: EnemyVariant::Shooter { heading },
        pos: Vec2::new(x, y),
    }
}

/// Roll for a new enemy this tick
pub fn roll_enemy<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning) -> Option<EnemySpawn> {
    if !rng.random_bool(tuning.enemy_spawn_chance) {
        return None;
    }
    if rng.random_bool(tuning.shooter_share) {
        Some(shooter_entry(rng, tuning, None))
    } else {
        Some(drifter_entry(rng, tuning))
    }
}

/// Roll for a power-up drop on an enemy kill, uniform among `candidates`
pub fn roll_drop<R: Rng + ?Sized>(
    rng: &mut R,
    tuning: &Tuning,
    candidates: &[PowerUpKind],
) -> Option<PowerUpKind> {
    if candidates.is_empty() || !rng.random_bool(tuning.power_up_drop_chance) {
        return None;
    }
    Some(candidates[rng.random_range(0..candidates.len())])
}

/// Roll for the bonus target. Gated on its cooldown since the last appearance.
pub fn roll_bonus_target<R: Rng + ?Sized>(
    rng: &mut R,
    tuning: &Tuning,
    now: u64,
    last_seen: Option<u64>,
) -> bool {
    let cooled_down = last_seen
        .is_none_or(|last| now.saturating_sub(last) > ms_to_ticks(tuning.bonus_target_cooldown_ms));
    cooled_down && rng.random_bool(tuning.bonus_target_chance)
}

/// Whether the kill count calls for the boss
pub fn boss_due(game: &GameState) -> bool {
    !game.is_boss_fight && game.kills_in_level >= game.kills_required_for_boss
}

/// Spawn stage of the tick
pub fn run(world: &mut World, scheduler: &mut Scheduler) {
    let now = world.tick;
    let phase = world.game.phase;

    if matches!(phase, Phase::Playing | Phase::BossWarning | Phase::BossFight)
        && world.store.bonus_target.is_none()
        && roll_bonus_target(&mut world.rng, &world.tuning, now, world.last_bonus_target_tick)
    {
        world.store.spawn_bonus_target();
        world.last_bonus_target_tick = Some(now);
        log::debug!("Bonus target launched at tick {}", now);
    }

    if world.game.is_boss_fight {
        boss::try_fire(world);
        return;
    }

    if phase == Phase::Playing {
        if let Some(spawn) = roll_enemy(&mut world.rng, &world.tuning) {
            let id = world.store.spawn_enemy(spawn.variant, spawn.pos);
            log::debug!("Spawned {:?} #{} at {:?}", spawn.variant, id, spawn.pos);
        }
    }

    if matches!(phase, Phase::Playing | Phase::Tutorial) {
        shooters_fire(world, scheduler);
    }
}

/// Ready Shooters roll to fire one downward bullet, then wait out a cooldown
fn shooters_fire(world: &mut World, scheduler: &mut Scheduler) {
    let chance = world.tuning.shooter_fire_chance;
    let mut volleys = Vec::new();
    for enemy in world.store.enemies.iter_mut() {
        if !enemy.is_shooter() || enemy.has_fired {
            continue;
        }
        if world.rng.random_bool(chance) {
            enemy.has_fired = true;
            let rect = enemy.rect();
            let muzzle = Vec2::new(rect.center().x - ENEMY_BULLET_SIZE.x / 2.0, rect.max.y);
            volleys.push((enemy.id, muzzle));
        }
    }

    let due = world.tick + ms_to_ticks(world.tuning.shooter_cooldown_ms);
    for (enemy_id, muzzle) in volleys {
        world.store.spawn_bullet(
            BulletOwner::Enemy,
            muzzle,
            Vec2::new(0.0, ENEMY_BULLET_SPEED),
        );
        scheduler.schedule(world.generation, due, Deferred::ShooterReady { enemy_id });
    }
}
