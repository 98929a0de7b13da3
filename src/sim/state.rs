//! Game state and the per-run world
//!
//! `GameState` is the scalar progression record the HUD shows. `World` is the
//! run context: it owns the game state, every entity, the seeded RNGs and the
//! generation id deferred callbacks are checked against.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{EntityStore, MAX_PARTICLES, Player};
use super::powerup::{PowerUpManager, Upgrade};
use super::progression::{Phase, TutorialTrigger};
use super::snapshot::GameEvent;
use crate::consts::*;
use crate::tuning::Tuning;

/// Salt for the cosmetic RNG stream so particles never shift gameplay rolls
const FX_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Scalar progression state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub score: u64,
    /// Current level (1-based)
    pub level: u32,
    pub lives: u32,
    pub kills_in_level: u32,
    pub kills_required_for_boss: u32,
    /// Multiplier on enemy and power-up speed
    pub difficulty: f32,
    /// Score at which the next extra life is granted
    pub next_life_requirement: u64,
    /// Set from boss warning until the level is complete
    pub is_boss_fight: bool,
    pub is_tutorial: bool,
    pub tutorial_step: u8,
    pub phase: Phase,
    /// Boss health mirrored for the HUD (0 when no boss)
    pub boss_health: i32,
    pub max_boss_health: i32,
    pub permanent_upgrades: BTreeSet<Upgrade>,
}

impl GameState {
    pub fn new(tuning: &Tuning) -> Self {
        let is_tutorial = !tuning.skip_tutorial;
        Self {
            score: 0,
            level: 1,
            lives: tuning.preset.starting_lives(),
            kills_in_level: 0,
            kills_required_for_boss: tuning.kills_required_for(1),
            difficulty: tuning.preset.starting_difficulty(),
            next_life_requirement: tuning.first_extra_life,
            is_boss_fight: false,
            is_tutorial,
            tutorial_step: 0,
            phase: if is_tutorial {
                Phase::Tutorial
            } else {
                Phase::Playing
            },
            boss_health: 0,
            max_boss_health: 0,
            permanent_upgrades: BTreeSet::new(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

/// Everything owned by one run
#[derive(Debug, Clone)]
pub struct World {
    /// Run generation; deferred callbacks from other generations are ignored
    pub generation: u64,
    /// Simulation tick counter
    pub tick: u64,
    pub tuning: Tuning,
    pub game: GameState,
    pub player: Player,
    pub store: EntityStore,
    pub power_ups: PowerUpManager,
    /// Gameplay RNG (spawns, drops, firing)
    pub(crate) rng: Pcg32,
    /// Cosmetic RNG (particles, explosion placement)
    pub(crate) fx_rng: Pcg32,
    pub(crate) last_valid_target: Option<Vec2>,
    pub(crate) last_bonus_target_tick: Option<u64>,
    /// Tutorial triggers observed since the last transition check
    pub(crate) triggers: Vec<TutorialTrigger>,
    /// Events raised during the current tick
    pub(crate) events: Vec<GameEvent>,
}

impl World {
    /// Create a fresh run. `generation` starts at 1 and is bumped on restart.
    /// Out-of-range tuning is clamped here so no tick can trip over it.
    pub fn new(tuning: Tuning, generation: u64) -> Self {
        let tuning = tuning.sanitized();
        let seed = tuning.seed.wrapping_add(generation.saturating_sub(1));
        let player = Player::new(Self::player_start(&tuning));
        Self {
            generation,
            tick: 0,
            game: GameState::new(&tuning),
            player,
            store: EntityStore::new(),
            power_ups: PowerUpManager::new(),
            rng: Pcg32::seed_from_u64(seed),
            fx_rng: Pcg32::seed_from_u64(seed ^ FX_SEED_SALT),
            last_valid_target: None,
            last_bonus_target_tick: None,
            triggers: Vec::new(),
            events: Vec::new(),
            tuning,
        }
    }

    /// Player spawn point: bottom centre
    pub fn player_start(tuning: &Tuning) -> Vec2 {
        Vec2::new(
            (tuning.playfield_width - PLAYER_SIZE.x) / 2.0,
            tuning.playfield_height - PLAYER_SIZE.y - 30.0,
        )
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.tuning.playfield_width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.tuning.playfield_height
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn observe(&mut self, trigger: TutorialTrigger) {
        if self.game.is_tutorial {
            self.triggers.push(trigger);
        }
    }

    /// Push the power-up manager's view onto the player record
    pub fn refresh_player_effects(&mut self) {
        let permanent = &self.game.permanent_upgrades;
        self.player.shot_pattern = self.power_ups.shot_pattern(permanent);
        self.player.rapid_fire = self.power_ups.rapid_fire(permanent);
        self.player.giant = self.power_ups.giant();
    }

    /// Keep the HUD copy of boss health in sync with the boss entity
    pub fn sync_boss_hud(&mut self) {
        match &self.store.boss {
            Some(boss) => {
                self.game.boss_health = boss.health.max(0);
                self.game.max_boss_health = boss.max_health;
            }
            None => {
                self.game.boss_health = 0;
                self.game.max_boss_health = 0;
            }
        }
    }

    /// Radial spark burst at `at`
    pub fn burst(&mut self, at: Vec2, count: u32, min_speed: f32, max_speed: f32, gravity: f32) {
        for i in 0..count {
            let angle = if gravity > 0.0 {
                // Player explosions fan out evenly
                i as f32 / count as f32 * std::f32::consts::TAU
            } else {
                self.fx_rng.random_range(0.0..std::f32::consts::TAU)
            };
            let speed = self.fx_rng.random_range(min_speed..max_speed);
            let life: f32 = 1.0 + self.fx_rng.random_range(0.0..0.5);
            let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
            self.store.spawn_particle(at, vel, life, gravity);
        }
        self.store.particles.truncate_front(MAX_PARTICLES);
    }

    /// Random point inside a rectangle (cosmetic)
    pub fn fx_point_in(&mut self, min: Vec2, size: Vec2) -> Vec2 {
        Vec2::new(
            min.x + self.fx_rng.random::<f32>() * size.x,
            min.y + self.fx_rng.random::<f32>() * size.y,
        )
    }
}
