//! Entity records and per-kind storage
//!
//! Positions are top-left corners in playfield units, velocities are units per
//! tick. Each kind has a fixed bounding box used for collision tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::powerup::{PowerUpKind, ShotPattern};
use crate::consts::*;

/// Kind discriminator exposed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Companion,
    Drifter,
    Shooter,
    PlayerBullet,
    CompanionBullet,
    EnemyBullet,
    BossBullet,
    PowerUp,
    Boss,
    BonusTarget,
    Particle,
}

impl EntityKind {
    /// Fixed bounding-box size for this kind
    pub const fn size(self) -> Vec2 {
        match self {
            EntityKind::Player | EntityKind::Companion => PLAYER_SIZE,
            EntityKind::Drifter | EntityKind::Shooter => ENEMY_SIZE,
            EntityKind::PlayerBullet | EntityKind::CompanionBullet => PLAYER_BULLET_SIZE,
            EntityKind::EnemyBullet => ENEMY_BULLET_SIZE,
            EntityKind::BossBullet => BOSS_BULLET_SIZE,
            EntityKind::PowerUp => POWER_UP_SIZE,
            EntityKind::Boss => BOSS_SIZE,
            EntityKind::BonusTarget => BONUS_TARGET_SIZE,
            EntityKind::Particle => PARTICLE_SIZE,
        }
    }
}

/// Common view over every stored entity
pub trait Entity {
    fn id(&self) -> u32;
    fn kind(&self) -> EntityKind;
    fn pos(&self) -> Vec2;

    /// Velocity in units per tick (zero for entities moved by rule)
    fn vel(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn rect(&self) -> Rect {
        Rect::new(self.pos(), self.kind().size())
    }

    fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// False when position or velocity has gone NaN/infinite
    fn is_well_formed(&self) -> bool {
        self.pos().is_finite() && self.vel().is_finite()
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Where the input asked the ship to go (top-left)
    pub target: Option<Vec2>,
    pub invulnerable: bool,
    /// Tick at which invulnerability ends
    pub invulnerable_until: u64,
    /// Pattern used for the next volley
    pub shot_pattern: ShotPattern,
    pub rapid_fire: bool,
    pub giant: bool,
    /// Tick of the last volley fired
    #[serde(default)]
    pub last_shot_tick: Option<u64>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            target: None,
            invulnerable: false,
            invulnerable_until: 0,
            shot_pattern: ShotPattern::Single,
            rapid_fire: false,
            giant: false,
            last_shot_tick: None,
        }
    }

    /// Collision box, enlarged while giant mode is active
    pub fn hitbox(&self) -> Rect {
        let rect = Rect::new(self.pos, PLAYER_SIZE);
        if self.giant { rect.scaled(GIANT_SCALE) } else { rect }
    }

    /// Ticks of invulnerability left at `now`
    pub fn invulnerable_ticks_left(&self, now: u64) -> u64 {
        if self.invulnerable {
            self.invulnerable_until.saturating_sub(now)
        } else {
            0
        }
    }

    /// Step toward the target, never faster than `max_speed`, staying inside
    /// the playfield.
    pub fn move_toward_target(&mut self, max_speed: f32, width: f32, height: f32) {
        let Some(target) = self.target else {
            self.vel = Vec2::ZERO;
            return;
        };
        let limit = Vec2::new(width, height) - PLAYER_SIZE;
        let target = target.clamp(Vec2::ZERO, limit.max(Vec2::ZERO));
        let delta = (target - self.pos).clamp_length_max(max_speed);
        self.vel = delta;
        self.pos += delta;
    }
}

impl Entity for Player {
    fn id(&self) -> u32 {
        0
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn vel(&self) -> Vec2 {
        self.vel
    }
    fn rect(&self) -> Rect {
        self.hitbox()
    }
}

/// Enemy behaviour variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyVariant {
    /// Falls straight down
    Drifter,
    /// Crosses the screen sideways; heading is +1 (right) or -1 (left)
    Shooter { heading: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub variant: EnemyVariant,
    pub pos: Vec2,
    /// Shooter has fired and is waiting out its cooldown
    pub has_fired: bool,
}

impl Enemy {
    pub fn is_shooter(&self) -> bool {
        matches!(self.variant, EnemyVariant::Shooter { .. })
    }

    /// Velocity for the current difficulty
    pub fn velocity(&self, difficulty: f32) -> Vec2 {
        match self.variant {
            EnemyVariant::Drifter => Vec2::new(0.0, DRIFTER_SPEED * difficulty),
            EnemyVariant::Shooter { heading } => Vec2::new(heading * SHOOTER_SPEED * difficulty, 0.0),
        }
    }
}

impl Entity for Enemy {
    fn id(&self) -> u32 {
        self.id
    }
    fn kind(&self) -> EntityKind {
        match self.variant {
            EnemyVariant::Drifter => EntityKind::Drifter,
            EnemyVariant::Shooter { .. } => EntityKind::Shooter,
        }
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Companion,
    Enemy,
    Boss,
}

impl BulletOwner {
    /// Bullets that damage enemies, the boss and the bonus target
    pub fn is_friendly(self) -> bool {
        matches!(self, BulletOwner::Player | BulletOwner::Companion)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub owner: BulletOwner,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Entity for Bullet {
    fn id(&self) -> u32 {
        self.id
    }
    fn kind(&self) -> EntityKind {
        match self.owner {
            BulletOwner::Player => EntityKind::PlayerBullet,
            BulletOwner::Companion => EntityKind::CompanionBullet,
            BulletOwner::Enemy => EntityKind::EnemyBullet,
            BulletOwner::Boss => EntityKind::BossBullet,
        }
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn vel(&self) -> Vec2 {
        self.vel
    }
}

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    /// Base fall speed, multiplied by difficulty each tick
    pub fall_speed: f32,
}

impl Entity for PowerUp {
    fn id(&self) -> u32 {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::PowerUp
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Sliding down into view
    Entering,
    /// At resting height, firing
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: u32,
    pub health: i32,
    pub max_health: i32,
    pub pos: Vec2,
    pub phase: BossPhase,
    pub spawned_tick: u64,
}

impl Boss {
    /// Health-bar fill in [0, 1]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }

    pub fn is_defeated(&self) -> bool {
        self.health <= 0
    }
}

impl Entity for Boss {
    fn id(&self) -> u32 {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Boss
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
}

/// The rare bonus UFO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusTarget {
    pub id: u32,
    pub pos: Vec2,
    pub hit_count: u32,
}

impl Entity for BonusTarget {
    fn id(&self) -> u32 {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::BonusTarget
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn vel(&self) -> Vec2 {
        Vec2::new(BONUS_TARGET_SPEED, 0.0)
    }
}

/// Wingman that mirrors the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Companion {
    pub id: u32,
    pub pos: Vec2,
}

impl Companion {
    /// Snap next to the player
    pub fn follow(&mut self, player: &Player) {
        self.pos = player.pos + Vec2::new(COMPANION_OFFSET, 0.0);
    }
}

impl Entity for Companion {
    fn id(&self) -> u32 {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Companion
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
}

/// A short-lived cosmetic spark (not gameplay-affecting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1.0 at birth, removed at 0
    pub life: f32,
    /// Downward acceleration per tick
    pub gravity: f32,
}

impl Particle {
    pub fn step(&mut self) {
        self.pos += self.vel;
        self.vel.y += self.gravity;
        self.life -= 0.02;
    }
}

impl Entity for Particle {
    fn id(&self) -> u32 {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Particle
    }
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn vel(&self) -> Vec2 {
        self.vel
    }
}

/// Maximum live particles
pub const MAX_PARTICLES: usize = 256;

/// Ordered container for one entity kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    items: Vec<T>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Pool<T> {
    pub fn add(&mut self, item: T) {
        debug_assert!(
            self.items.last().is_none_or(|last| last.id() < item.id()),
            "entities must be added in id order"
        );
        self.items.push(item);
    }

    /// Remove every entity matching `pred`, returning them in order
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if pred(&item) {
                removed.push(item);
            } else {
                kept.push(item);
            }
        }
        self.items = kept;
        removed
    }

    pub fn remove_ids(&mut self, ids: &[u32]) -> Vec<T> {
        if ids.is_empty() {
            return Vec::new();
        }
        self.remove_where(|e| ids.contains(&e.id()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.items.iter_mut().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop the oldest entries beyond `cap`
    pub fn truncate_front(&mut self, cap: usize) {
        if self.items.len() > cap {
            let excess = self.items.len() - cap;
            self.items.drain(..excess);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

/// Every non-player entity in a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub enemies: Pool<Enemy>,
    pub bullets: Pool<Bullet>,
    pub power_ups: Pool<PowerUp>,
    pub particles: Pool<Particle>,
    pub boss: Option<Boss>,
    pub bonus_target: Option<BonusTarget>,
    pub companion: Option<Companion>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        // Default-constructed stores start at 0; keep 0 reserved for the player
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_enemy(&mut self, variant: EnemyVariant, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.enemies.add(Enemy {
            id,
            variant,
            pos,
            has_fired: false,
        });
        id
    }

    pub fn spawn_bullet(&mut self, owner: BulletOwner, pos: Vec2, vel: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.bullets.add(Bullet { id, owner, pos, vel });
        id
    }

    pub fn spawn_power_up(&mut self, kind: PowerUpKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.power_ups.add(PowerUp {
            id,
            kind,
            pos,
            fall_speed: POWER_UP_FALL_SPEED,
        });
        id
    }

    pub fn spawn_particle(&mut self, pos: Vec2, vel: Vec2, life: f32, gravity: f32) {
        let id = self.next_entity_id();
        self.particles.add(Particle {
            id,
            pos,
            vel,
            life,
            gravity,
        });
    }

    /// Create or replace the single companion
    pub fn spawn_companion(&mut self, player: &Player) -> u32 {
        let id = self.next_entity_id();
        let mut companion = Companion { id, pos: player.pos };
        companion.follow(player);
        self.companion = Some(companion);
        id
    }

    pub fn spawn_bonus_target(&mut self) -> u32 {
        let id = self.next_entity_id();
        self.bonus_target = Some(BonusTarget {
            id,
            pos: Vec2::new(-BONUS_TARGET_SIZE.x, BONUS_TARGET_Y),
            hit_count: 0,
        });
        id
    }

    pub fn count_shooters(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_shooter()).count()
    }
}
