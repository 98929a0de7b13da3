//! Star Shmup - simulation core for a vertical arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, progression, boss)
//! - `tuning`: Data-driven game balance
//!
//! Drawing, sound and device input live outside this crate. The host feeds a
//! [`sim::TickInput`] per tick and reads back an immutable [`sim::Snapshot`].

pub mod sim;
pub mod tuning;

pub use sim::{Simulation, Snapshot, TickInput};
pub use tuning::{DifficultyPreset, Tuning};

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Entity bounding boxes
    pub const PLAYER_SIZE: Vec2 = Vec2::new(40.0, 50.0);
    pub const ENEMY_SIZE: Vec2 = Vec2::new(30.0, 30.0);
    pub const PLAYER_BULLET_SIZE: Vec2 = Vec2::new(6.0, 15.0);
    pub const ENEMY_BULLET_SIZE: Vec2 = Vec2::new(8.0, 16.0);
    pub const BOSS_BULLET_SIZE: Vec2 = Vec2::new(15.0, 15.0);
    pub const POWER_UP_SIZE: Vec2 = Vec2::new(20.0, 20.0);
    pub const BOSS_SIZE: Vec2 = Vec2::new(160.0, 160.0);
    pub const BONUS_TARGET_SIZE: Vec2 = Vec2::new(60.0, 30.0);
    pub const PARTICLE_SIZE: Vec2 = Vec2::new(6.0, 6.0);

    /// Movement speeds (units per tick, before difficulty scaling)
    pub const PLAYER_MAX_SPEED: f32 = 12.0;
    pub const PLAYER_BULLET_SPEED: f32 = 10.0;
    pub const DRIFTER_SPEED: f32 = 2.0;
    pub const SHOOTER_SPEED: f32 = 3.0;
    pub const ENEMY_BULLET_SPEED: f32 = 5.0;
    pub const POWER_UP_FALL_SPEED: f32 = 2.0;
    pub const BONUS_TARGET_SPEED: f32 = 2.0;
    pub const BOSS_ENTRY_SPEED: f32 = 2.0;

    /// Boss resting height (top edge)
    pub const BOSS_REST_Y: f32 = 50.0;
    /// Boss spawn height (top edge, above the playfield)
    pub const BOSS_SPAWN_Y: f32 = -180.0;
    /// Bonus target flight height
    pub const BONUS_TARGET_Y: f32 = 50.0;
    /// Horizontal distance between player and companion
    pub const COMPANION_OFFSET: f32 = 60.0;
    /// Height at which tutorial entities appear
    pub const TUTORIAL_SPAWN_Y: f32 = 100.0;

    /// Giant mode hitbox scale
    pub const GIANT_SCALE: f32 = 2.0;

    /// Cosmetic explosion bursts after a boss is destroyed
    pub const BOSS_EXPLOSIONS: u32 = 10;
    pub const BOSS_EXPLOSION_SPACING_MS: u32 = 100;
}

/// Convert a duration in milliseconds to whole ticks (rounded up)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u64 {
    (ms as u64 * consts::TICK_RATE as u64).div_ceil(1000)
}

/// Seconds elapsed over a number of ticks
#[inline]
pub fn ticks_to_secs(ticks: u64) -> f32 {
    ticks as f32 * consts::SIM_DT
}
