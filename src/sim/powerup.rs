//! Power-up effect table
//!
//! Temporary effects run on their own countdown and only end by expiring.
//! Permanent upgrades live in the game state and survive a lost life.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ms_to_ticks;
use crate::tuning::Tuning;

/// Pickup types that can fall from destroyed enemies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    DoubleShot,
    TripleShot,
    WideShot,
    RapidFire,
    Companion,
    Giant,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::DoubleShot,
        PowerUpKind::TripleShot,
        PowerUpKind::WideShot,
        PowerUpKind::RapidFire,
        PowerUpKind::Companion,
        PowerUpKind::Giant,
    ];

    /// The timed effect a pickup starts (companion has none)
    pub fn effect(self) -> Option<TimedEffect> {
        match self {
            PowerUpKind::DoubleShot => Some(TimedEffect::DoubleShot),
            PowerUpKind::TripleShot => Some(TimedEffect::TripleShot),
            PowerUpKind::WideShot => Some(TimedEffect::WideShot),
            PowerUpKind::RapidFire => Some(TimedEffect::RapidFire),
            PowerUpKind::Giant => Some(TimedEffect::Giant),
            PowerUpKind::Companion => None,
        }
    }

    /// Permanent counterpart, if this pickup can also be unlocked for good
    pub fn upgrade(self) -> Option<Upgrade> {
        match self {
            PowerUpKind::DoubleShot => Some(Upgrade::DoubleShot),
            PowerUpKind::TripleShot => Some(Upgrade::TripleShot),
            PowerUpKind::WideShot => Some(Upgrade::WideShot),
            PowerUpKind::RapidFire => Some(Upgrade::RapidFire),
            PowerUpKind::Companion | PowerUpKind::Giant => None,
        }
    }
}

/// Effects that run on a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimedEffect {
    DoubleShot,
    TripleShot,
    WideShot,
    RapidFire,
    Giant,
}

impl TimedEffect {
    fn shot_pattern(self) -> Option<ShotPattern> {
        match self {
            TimedEffect::DoubleShot => Some(ShotPattern::Double),
            TimedEffect::TripleShot => Some(ShotPattern::Triple),
            TimedEffect::WideShot => Some(ShotPattern::Wide),
            TimedEffect::RapidFire | TimedEffect::Giant => None,
        }
    }

    pub fn duration_ticks(self, tuning: &Tuning) -> u64 {
        match self {
            TimedEffect::Giant => ms_to_ticks(tuning.giant_duration_ms),
            _ => ms_to_ticks(tuning.effect_duration_ms),
        }
    }
}

/// Upgrades that survive death once unlocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Upgrade {
    DoubleShot,
    TripleShot,
    WideShot,
    RapidFire,
}

impl Upgrade {
    /// Order in which boss defeats hand out upgrades
    pub const LADDER: [Upgrade; 4] = [
        Upgrade::DoubleShot,
        Upgrade::RapidFire,
        Upgrade::WideShot,
        Upgrade::TripleShot,
    ];

    fn shot_pattern(self) -> Option<ShotPattern> {
        match self {
            Upgrade::DoubleShot => Some(ShotPattern::Double),
            Upgrade::TripleShot => Some(ShotPattern::Triple),
            Upgrade::WideShot => Some(ShotPattern::Wide),
            Upgrade::RapidFire => None,
        }
    }

    /// First ladder rung not yet owned
    pub fn next_unlock(owned: &BTreeSet<Upgrade>) -> Option<Upgrade> {
        Self::LADDER.into_iter().find(|u| !owned.contains(u))
    }
}

/// Bullet emission pattern; later variants win over earlier ones
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ShotPattern {
    #[default]
    Single,
    Double,
    Wide,
    Triple,
}

impl ShotPattern {
    /// (horizontal muzzle offset, horizontal velocity) per bullet
    pub fn volley(self) -> &'static [(f32, f32)] {
        match self {
            ShotPattern::Single => &[(0.0, 0.0)],
            ShotPattern::Double => &[(-10.0, 0.0), (10.0, 0.0)],
            ShotPattern::Wide => &[(0.0, -4.0), (0.0, -2.0), (0.0, 0.0), (0.0, 2.0), (0.0, 4.0)],
            ShotPattern::Triple => &[(-15.0, 0.0), (0.0, 0.0), (15.0, 0.0)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct EffectTimer {
    /// Identifies this activation; stale expiries carry an older token
    token: u32,
    expires_at: u64,
}

/// Running temporary effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpManager {
    timers: BTreeMap<TimedEffect, EffectTimer>,
    next_token: u32,
}

impl PowerUpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) an effect's countdown. Returns the token and the
    /// tick the matching expiry should fire at.
    pub fn activate(&mut self, effect: TimedEffect, now: u64, tuning: &Tuning) -> (u32, u64) {
        self.next_token = self.next_token.wrapping_add(1);
        let timer = EffectTimer {
            token: self.next_token,
            expires_at: now + effect.duration_ticks(tuning),
        };
        self.timers.insert(effect, timer);
        (timer.token, timer.expires_at)
    }

    /// End an effect if `token` is still its current activation
    pub fn expire(&mut self, effect: TimedEffect, token: u32) -> bool {
        match self.timers.get(&effect) {
            Some(timer) if timer.token == token => {
                self.timers.remove(&effect);
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self, effect: TimedEffect) -> bool {
        self.timers.contains_key(&effect)
    }

    pub fn ticks_left(&self, effect: TimedEffect, now: u64) -> u64 {
        self.timers
            .get(&effect)
            .map(|t| t.expires_at.saturating_sub(now))
            .unwrap_or(0)
    }

    pub fn active_effects(&self) -> impl Iterator<Item = TimedEffect> + '_ {
        self.timers.keys().copied()
    }

    /// Drop every temporary effect (life lost)
    pub fn clear_temporary(&mut self) {
        self.timers.clear();
    }

    /// Highest-priority pattern among temporary effects and permanent upgrades
    pub fn shot_pattern(&self, permanent: &BTreeSet<Upgrade>) -> ShotPattern {
        let temporary = self.timers.keys().filter_map(|e| e.shot_pattern());
        let unlocked = permanent.iter().filter_map(|u| u.shot_pattern());
        temporary
            .chain(unlocked)
            .max()
            .unwrap_or(ShotPattern::Single)
    }

    pub fn rapid_fire(&self, permanent: &BTreeSet<Upgrade>) -> bool {
        self.is_active(TimedEffect::RapidFire) || permanent.contains(&Upgrade::RapidFire)
    }

    pub fn giant(&self) -> bool {
        self.is_active(TimedEffect::Giant)
    }

    /// Ticks between volleys
    pub fn fire_interval_ticks(&self, permanent: &BTreeSet<Upgrade>, tuning: &Tuning) -> u64 {
        let ms = if self.rapid_fire(permanent) {
            tuning.rapid_fire_interval_ms
        } else {
            tuning.fire_interval_ms
        };
        ms_to_ticks(ms).max(1)
    }

    /// Pickup kinds worth dropping: not running, not owned for good, and no
    /// second companion.
    pub fn droppable(&self, permanent: &BTreeSet<Upgrade>, has_companion: bool) -> Vec<PowerUpKind> {
        PowerUpKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                PowerUpKind::Companion => !has_companion,
                _ => {
                    let running = kind.effect().is_some_and(|e| self.is_active(e));
                    let owned = kind.upgrade().is_some_and(|u| permanent.contains(&u));
                    !running && !owned
                }
            })
            .collect()
    }
}
