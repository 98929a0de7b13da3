//! Fixed timestep simulation tick
//!
//! One call advances the world by exactly one tick. Stages run in a fixed
//! order: input, movement and player fire, spawns, collisions, deferred
//! callbacks and transitions, pruning. The snapshot is taken by the caller.

use glam::Vec2;

use super::autopilot;
use super::boss;
use super::collision::{Rect, left_playfield, overlaps};
use super::entity::{BulletOwner, EnemyVariant, Entity};
use super::powerup::{PowerUpKind, ShotPattern};
use super::progression::{self, TutorialTrigger};
use super::snapshot::GameEvent;
use super::spawn;
use super::state::World;
use super::timers::{Deferred, Scheduler};
use crate::consts::*;

/// Input for a single tick (latest sample wins)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Top-left position the ship should head for
    pub move_target: Option<Vec2>,
    /// Fire button held
    pub firing: bool,
    /// Demo mode - the autopilot plays the game
    pub autopilot: bool,
}

impl TickInput {
    pub fn toward(target: Vec2, firing: bool) -> Self {
        Self {
            move_target: Some(target),
            firing,
            autopilot: false,
        }
    }

    /// Relative movement (keyboard, touch drag) integrated from the ship's
    /// current position
    pub fn nudged(from: Vec2, delta: Vec2, firing: bool) -> Self {
        Self::toward(from + delta, firing)
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, scheduler: &mut Scheduler, input: &TickInput) {
    // Game over is terminal: nothing moves any more
    if world.game.is_over() {
        return;
    }
    world.tick += 1;

    let input = if input.autopilot {
        autopilot::drive(world)
    } else {
        input.clone()
    };

    apply_input(world, &input);

    advance_entities(world);
    fire_player(world, input.firing);

    spawn::run(world, scheduler);

    resolve_collisions(world, scheduler);
    if world.game.is_over() {
        return;
    }

    progression::run_deferred(world, scheduler);
    progression::evaluate(world, scheduler);

    prune(world);
}

/// Stage 1: latch the move target, falling back to the last valid one
fn apply_input(world: &mut World, input: &TickInput) {
    world.player.target = match input.move_target {
        Some(target) if target.is_finite() => {
            world.last_valid_target = Some(target);
            Some(target)
        }
        Some(target) => {
            log::warn!("Non-finite move target {:?}, keeping last valid target", target);
            world.last_valid_target
        }
        None => None,
    };
}

/// Stage 2a: move everything
fn advance_entities(world: &mut World) {
    let (width, height) = (world.width(), world.height());
    let difficulty = world.game.difficulty;

    let before = world.player.pos;
    world.player.move_toward_target(PLAYER_MAX_SPEED, width, height);
    if world.player.pos != before {
        world.observe(TutorialTrigger::Moved);
    }
    if let Some(companion) = world.store.companion.as_mut() {
        companion.follow(&world.player);
    }

    for enemy in world.store.enemies.iter_mut() {
        enemy.pos += enemy.velocity(difficulty);
    }
    for bullet in world.store.bullets.iter_mut() {
        bullet.pos += bullet.vel;
    }
    for power_up in world.store.power_ups.iter_mut() {
        power_up.pos.y += power_up.fall_speed * difficulty;
    }
    if let Some(target) = world.store.bonus_target.as_mut() {
        target.pos.x += BONUS_TARGET_SPEED;
    }
    boss::advance(world);
    for particle in world.store.particles.iter_mut() {
        particle.step();
    }
}

/// Stage 2b: player (and companion) volleys, rate limited by the fire interval
fn fire_player(world: &mut World, firing: bool) {
    if !firing {
        return;
    }
    let interval = world
        .power_ups
        .fire_interval_ticks(&world.game.permanent_upgrades, &world.tuning);
    let ready = world
        .player
        .last_shot_tick
        .is_none_or(|last| world.tick.saturating_sub(last) >= interval);
    if !ready {
        return;
    }
    world.player.last_shot_tick = Some(world.tick);

    let pattern = world.player.shot_pattern;
    let muzzle = world.player.hitbox();
    emit_volley(world, BulletOwner::Player, &muzzle, pattern);
    if let Some(companion) = world.store.companion.as_ref() {
        let muzzle = companion.rect();
        emit_volley(world, BulletOwner::Companion, &muzzle, pattern);
    }
    world.observe(TutorialTrigger::Fired);
}

fn emit_volley(world: &mut World, owner: BulletOwner, muzzle: &Rect, pattern: ShotPattern) {
    let origin = Vec2::new(
        muzzle.center().x - PLAYER_BULLET_SIZE.x / 2.0,
        muzzle.min.y - PLAYER_BULLET_SIZE.y,
    );
    for &(dx, vx) in pattern.volley() {
        world.store.spawn_bullet(
            owner,
            origin + Vec2::new(dx, 0.0),
            Vec2::new(vx, -PLAYER_BULLET_SPEED),
        );
    }
}

/// Stage 4: every collision pair and its consequences
fn resolve_collisions(world: &mut World, scheduler: &mut Scheduler) {
    shots_vs_enemies(world);
    shots_vs_bonus_target(world);
    boss::resolve_bullet_hits(world, scheduler);
    collect_power_ups(world, scheduler);

    enemies_vs_player(world, scheduler);
    if world.game.is_over() {
        return;
    }
    hostile_shots_vs_player(world, scheduler);
    if world.game.is_over() {
        return;
    }
    if boss::touches_player(world) && !world.player.invulnerable {
        world.lose_life(scheduler);
    }
}

/// Each enemy is destroyed by the first friendly bullet touching it
fn shots_vs_enemies(world: &mut World) {
    let mut spent = Vec::new();
    let mut killed = Vec::new();
    for enemy in world.store.enemies.iter() {
        let rect = enemy.rect();
        let hit = world
            .store
            .bullets
            .iter()
            .find(|b| b.owner.is_friendly() && !spent.contains(&b.id) && overlaps(&b.rect(), &rect));
        if let Some(bullet) = hit {
            spent.push(bullet.id);
            killed.push(enemy.id);
        }
    }
    world.store.bullets.remove_ids(&spent);
    for enemy in world.store.enemies.remove_ids(&killed) {
        destroy_enemy(world, enemy.center(), enemy.variant, enemy.is_shooter());
    }
}

fn destroy_enemy(world: &mut World, at: Vec2, variant: EnemyVariant, was_shooter: bool) {
    world.record_kill();
    world.burst(at, 12, 2.0, 6.0, 0.0);
    world.emit(GameEvent::EnemyDestroyed { at, variant });
    if was_shooter {
        world.observe(TutorialTrigger::ShooterCleared);
    }

    let candidates = world
        .power_ups
        .droppable(&world.game.permanent_upgrades, world.store.companion.is_some());
    if let Some(kind) = spawn::roll_drop(&mut world.rng, &world.tuning, &candidates) {
        let pos = at - POWER_UP_SIZE / 2.0;
        world.store.spawn_power_up(kind, pos);
        log::debug!("{:?} dropped at {:?}", kind, pos);
    }
}

fn shots_vs_bonus_target(world: &mut World) {
    let Some(target) = world.store.bonus_target.as_mut() else {
        return;
    };
    let rect = target.rect();
    let needed = world.tuning.bonus_target_hits;
    let mut spent = Vec::new();
    for bullet in world.store.bullets.iter() {
        if bullet.owner.is_friendly() && overlaps(&bullet.rect(), &rect) {
            spent.push(bullet.id);
            target.hit_count += 1;
            if target.hit_count >= needed {
                break;
            }
        }
    }
    let destroyed = target.hit_count >= needed;
    world.store.bullets.remove_ids(&spent);

    if destroyed {
        world.store.bonus_target = None;
        let at = rect.center();
        world.award(world.tuning.bonus_target_score);
        world.burst(at, 20, 2.0, 8.0, 0.0);
        world.emit(GameEvent::BonusTargetDestroyed { at });
        log::info!("Bonus target destroyed");
    }
}

fn collect_power_ups(world: &mut World, scheduler: &mut Scheduler) {
    let hitbox = world.player.hitbox();
    let collected = world
        .store
        .power_ups
        .remove_where(|p| overlaps(&p.rect(), &hitbox));
    for power_up in collected {
        apply_power_up(world, scheduler, power_up.kind);
    }
}

fn apply_power_up(world: &mut World, scheduler: &mut Scheduler, kind: PowerUpKind) {
    match kind.effect() {
        Some(effect) => {
            let (token, expires_at) = world.power_ups.activate(effect, world.tick, &world.tuning);
            scheduler.schedule(
                world.generation,
                expires_at,
                Deferred::ExpireEffect { effect, token },
            );
            world.refresh_player_effects();
        }
        None => {
            world.store.spawn_companion(&world.player);
        }
    }
    world.emit(GameEvent::PowerUpCollected { kind });
    world.observe(TutorialTrigger::PickedUp);
    log::debug!("Collected {:?}", kind);
}

/// Giant mode flattens enemies; otherwise contact costs a life
fn enemies_vs_player(world: &mut World, scheduler: &mut Scheduler) {
    let hitbox = world.player.hitbox();
    if world.player.giant {
        let crushed = world
            .store
            .enemies
            .remove_where(|e| overlaps(&e.rect(), &hitbox));
        for enemy in crushed {
            destroy_enemy(world, enemy.center(), enemy.variant, enemy.is_shooter());
        }
        return;
    }
    if world.player.invulnerable {
        return;
    }
    let rammed = world
        .store
        .enemies
        .iter()
        .find(|e| overlaps(&e.rect(), &hitbox))
        .map(|e| e.id);
    if let Some(id) = rammed {
        for enemy in world.store.enemies.remove_ids(&[id]) {
            world.burst(enemy.center(), 12, 2.0, 6.0, 0.0);
            if enemy.is_shooter() {
                world.observe(TutorialTrigger::ShooterCleared);
            }
        }
        world.lose_life(scheduler);
    }
}

/// Hostile bullets are consumed on contact; only a vulnerable player is hurt
fn hostile_shots_vs_player(world: &mut World, scheduler: &mut Scheduler) {
    let hitbox = world.player.hitbox();
    let hits = world
        .store
        .bullets
        .remove_where(|b| !b.owner.is_friendly() && overlaps(&b.rect(), &hitbox));
    if !hits.is_empty() && !world.player.invulnerable {
        world.lose_life(scheduler);
    }
}

/// Stage 6: drop entities that left the playfield, burned out or went
/// non-finite
fn prune(world: &mut World) {
    let (width, height) = (world.width(), world.height());
    let gone = |rect: &Rect| left_playfield(rect, width, height);

    let enemies = world
        .store
        .enemies
        .remove_where(|e| !e.is_well_formed() || gone(&e.rect()));
    for enemy in enemies {
        if !enemy.is_well_formed() {
            log::warn!("Dropping malformed enemy #{} at {:?}", enemy.id, enemy.pos);
        }
        if enemy.is_shooter() {
            world.observe(TutorialTrigger::ShooterCleared);
        }
    }

    for bullet in world
        .store
        .bullets
        .remove_where(|b| !b.is_well_formed() || gone(&b.rect()))
    {
        if !bullet.is_well_formed() {
            log::warn!("Dropping malformed bullet #{}", bullet.id);
        }
    }

    for power_up in world
        .store
        .power_ups
        .remove_where(|p| !p.is_well_formed() || gone(&p.rect()))
    {
        if !power_up.is_well_formed() {
            log::warn!("Dropping malformed power-up #{}", power_up.id);
        }
    }

    world
        .store
        .particles
        .remove_where(|p| p.life <= 0.0 || !p.is_well_formed());

    if let Some(target) = world.store.bonus_target.take_if(|t| !t.is_well_formed() || gone(&t.rect())) {
        if !target.is_well_formed() {
            log::warn!("Dropping malformed bonus target at {:?}", target.pos);
        }
    }

    if world.store.boss.as_ref().is_some_and(|b| !b.is_well_formed()) {
        log::warn!("Dropping malformed boss");
        world.store.boss = None;
        world.sync_boss_hud();
    }

    if !world.player.is_well_formed() {
        log::warn!("Player position went non-finite, respawning");
        world.player.pos = World::player_start(&world.tuning);
        world.player.vel = Vec2::ZERO;
    }
}
