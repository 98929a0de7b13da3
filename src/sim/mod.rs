//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod autopilot;
pub mod boss;
pub mod clock;
pub mod collision;
pub mod entity;
pub mod powerup;
pub mod progression;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timers;

pub use clock::Simulation;
pub use collision::{Rect, overlaps};
pub use entity::{
    BonusTarget, Boss, BossPhase, Bullet, BulletOwner, Companion, Enemy, EnemyVariant, Entity,
    EntityKind, EntityStore, Particle, Player, PowerUp,
};
pub use powerup::{PowerUpKind, PowerUpManager, ShotPattern, TimedEffect, Upgrade};
pub use progression::{Phase, tutorial_message};
pub use snapshot::{EffectCountdown, GameEvent, Snapshot};
pub use state::{GameState, World};
pub use tick::{TickInput, tick};
pub use timers::{Deferred, Scheduler};
