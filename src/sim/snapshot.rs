//! Read-only per-tick output for renderers and sound layers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{
    BonusTarget, Boss, Bullet, Companion, Enemy, EnemyVariant, Particle, Player, PowerUp,
};
use super::powerup::{PowerUpKind, TimedEffect, Upgrade};
use super::state::{GameState, World};

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EnemyDestroyed { at: Vec2, variant: EnemyVariant },
    PlayerHit { lives_left: u32 },
    BossDefeated { level: u32 },
    BonusTargetDestroyed { at: Vec2 },
    ExtraLifeGranted { lives: u32 },
    BossWarning { level: u32 },
    BossSpawned { health: i32 },
    LevelComplete { level: u32 },
    PowerUpCollected { kind: PowerUpKind },
    PowerUpExpired { effect: TimedEffect },
    UpgradeUnlocked { upgrade: Upgrade },
    TutorialAdvanced { step: u8 },
    TutorialComplete,
    Explosion { at: Vec2 },
    GameOver { score: u64 },
}

impl GameEvent {
    /// Events the sound layer is expected to voice
    pub fn is_audio_cue(&self) -> bool {
        matches!(
            self,
            GameEvent::EnemyDestroyed { .. }
                | GameEvent::PlayerHit { .. }
                | GameEvent::BossDefeated { .. }
                | GameEvent::BonusTargetDestroyed { .. }
                | GameEvent::ExtraLifeGranted { .. }
        )
    }
}

/// Time left on an active effect, for the HUD countdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectCountdown {
    pub effect: TimedEffect,
    pub ticks_left: u64,
}

/// Immutable picture of the world after a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub generation: u64,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub boss: Option<Boss>,
    pub bonus_target: Option<BonusTarget>,
    pub companion: Option<Companion>,
    pub particles: Vec<Particle>,
    pub game: GameState,
    /// Active temporary effects
    pub effects: Vec<EffectCountdown>,
    pub invulnerable_ticks: u64,
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    /// Capture the world and take its pending events
    pub fn capture(world: &mut World) -> Self {
        let now = world.tick;
        let effects = world
            .power_ups
            .active_effects()
            .map(|effect| EffectCountdown {
                effect,
                ticks_left: world.power_ups.ticks_left(effect, now),
            })
            .collect();
        Self {
            tick: world.tick,
            generation: world.generation,
            player: world.player.clone(),
            enemies: world.store.enemies.as_slice().to_vec(),
            bullets: world.store.bullets.as_slice().to_vec(),
            power_ups: world.store.power_ups.as_slice().to_vec(),
            boss: world.store.boss.clone(),
            bonus_target: world.store.bonus_target.clone(),
            companion: world.store.companion.clone(),
            particles: world.store.particles.as_slice().to_vec(),
            game: world.game.clone(),
            effects,
            invulnerable_ticks: world.player.invulnerable_ticks_left(now),
            events: std::mem::take(&mut world.events),
        }
    }

    pub fn audio_cues(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(|e| e.is_audio_cue())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
