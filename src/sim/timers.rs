//! Deferred one-shot callbacks
//!
//! Timed effects are queued here instead of being mutated from outside the
//! tick. The tick drains due entries at a fixed point, so a callback never
//! lands halfway through a step. Every entry carries the generation of the run
//! that scheduled it and is discarded if that run is gone.

use glam::Vec2;

use super::powerup::TimedEffect;

/// What to do when a deferred entry comes due
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// Boss warning elapsed
    SpawnBoss,
    /// Post-hit invulnerability window elapsed
    EndInvulnerability,
    /// A temporary power-up ran out
    ExpireEffect { effect: TimedEffect, token: u32 },
    /// A Shooter may fire again
    ShooterReady { enemy_id: u32 },
    /// A text-only tutorial step has been shown long enough
    TutorialPause { step: u8 },
    /// Cosmetic explosion burst
    Explosion { at: Vec2 },
}

#[derive(Debug, Clone)]
pub struct Pending {
    pub due_tick: u64,
    pub generation: u64,
    seq: u64,
    pub action: Deferred,
}

/// Queue of deferred callbacks ordered by due tick, then scheduling order
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, generation: u64, due_tick: u64, action: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due_tick,
            generation,
            seq,
            action,
        });
    }

    /// Remove and return every entry due at or before `now`, in firing order
    pub fn drain_due(&mut self, now: u64) -> Vec<Pending> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_tick <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| (p.due_tick, p.seq));
        due
    }

    /// Cancel everything scheduled by runs other than `generation`
    pub fn retain_generation(&mut self, generation: u64) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.generation == generation);
        before - self.pending.len()
    }

    pub fn is_pending(&self, generation: u64, pred: impl Fn(&Deferred) -> bool) -> bool {
        self.pending
            .iter()
            .any(|p| p.generation == generation && pred(&p.action))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
