//! Boss encounter: entry, sway, aimed fire, damage and defeat

use glam::Vec2;
use rand::Rng;

use super::collision::overlaps;
use super::entity::{Boss, BossPhase, BulletOwner, Entity};
use super::progression::Phase;
use super::snapshot::GameEvent;
use super::state::World;
use super::timers::{Deferred, Scheduler};
use crate::consts::*;
use crate::{ms_to_ticks, ticks_to_secs};

/// Horizontal top-left position at `secs` since spawn
pub fn sway_x(width: f32, secs: f32) -> f32 {
    width / 2.0 + secs.sin() * width / 3.0 - BOSS_SIZE.x / 2.0
}

/// Create the boss above the playfield with health for the current level
pub fn spawn(world: &mut World) {
    let id = world.store.next_entity_id();
    let health = world.tuning.boss_health_for(world.game.level);
    world.store.boss = Some(Boss {
        id,
        health,
        max_health: health,
        pos: Vec2::new(sway_x(world.width(), 0.0), BOSS_SPAWN_Y),
        phase: BossPhase::Entering,
        spawned_tick: world.tick,
    });
    world.sync_boss_hud();
    world.emit(GameEvent::BossSpawned { health });
    log::info!("Boss spawned for level {} with {} health", world.game.level, health);
}

/// Sway sideways and ease down to the resting height
pub fn advance(world: &mut World) {
    let now = world.tick;
    let width = world.width();
    let Some(boss) = world.store.boss.as_mut() else {
        return;
    };
    let secs = ticks_to_secs(now.saturating_sub(boss.spawned_tick));
    boss.pos.x = sway_x(width, secs);
    if boss.phase == BossPhase::Entering {
        boss.pos.y = (boss.pos.y + BOSS_ENTRY_SPEED).min(BOSS_REST_Y);
        if boss.pos.y >= BOSS_REST_Y {
            boss.phase = BossPhase::Active;
            log::debug!("Boss reached resting height");
        }
    }
}

/// Velocity of a bullet fired from `from` toward `to`, straight down when the
/// two coincide
pub fn aim(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        Vec2::new(0.0, speed)
    } else {
        dir * speed
    }
}

/// Roll for one aimed shot while active
pub fn try_fire(world: &mut World) {
    let Some(boss) = world.store.boss.as_ref() else {
        return;
    };
    if boss.phase != BossPhase::Active {
        return;
    }
    if !world.rng.random_bool(world.tuning.boss_fire_chance) {
        return;
    }
    let rect = boss.rect();
    let vel = aim(rect.center(), world.player.center(), world.tuning.boss_bullet_speed);
    let muzzle = Vec2::new(rect.center().x - BOSS_BULLET_SIZE.x / 2.0, rect.max.y);
    world.store.spawn_bullet(BulletOwner::Boss, muzzle, vel);
}

/// Apply friendly bullet hits, one health point each. Bullets after the
/// lethal one pass through. Returns true if the boss was defeated.
pub fn resolve_bullet_hits(world: &mut World, scheduler: &mut Scheduler) -> bool {
    let Some(boss) = world.store.boss.as_mut() else {
        return false;
    };
    let boss_rect = boss.rect();
    let mut consumed = Vec::new();
    for bullet in world.store.bullets.iter() {
        if !bullet.owner.is_friendly() || !overlaps(&bullet.rect(), &boss_rect) {
            continue;
        }
        consumed.push(bullet.id);
        boss.health -= 1;
        if boss.is_defeated() {
            break;
        }
    }
    let defeated = boss.is_defeated();
    world.store.bullets.remove_ids(&consumed);
    world.sync_boss_hud();

    if defeated {
        defeat(world, scheduler);
    }
    defeated
}

/// Whether the boss body overlaps the player
pub fn touches_player(world: &World) -> bool {
    world
        .store
        .boss
        .as_ref()
        .is_some_and(|boss| overlaps(&boss.rect(), &world.player.hitbox()))
}

/// Remove the boss, queue its explosions and hand over to level completion
fn defeat(world: &mut World, scheduler: &mut Scheduler) {
    let Some(boss) = world.store.boss.take() else {
        return;
    };
    let rect = boss.rect();
    let spacing = ms_to_ticks(BOSS_EXPLOSION_SPACING_MS);
    for i in 0..BOSS_EXPLOSIONS as u64 {
        let at = world.fx_point_in(rect.min, rect.size());
        scheduler.schedule(world.generation, world.tick + i * spacing, Deferred::Explosion { at });
    }
    world.sync_boss_hud();
    world.game.phase = Phase::LevelComplete;
    world.emit(GameEvent::BossDefeated {
        level: world.game.level,
    });
    log::info!("Boss defeated on level {}", world.game.level);
}
