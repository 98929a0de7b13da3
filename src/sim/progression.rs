//! Progression state machine
//!
//! Tutorial -> Playing -> BossWarning -> BossFight -> LevelComplete -> Playing
//! (next level) ... with GameOver reachable from anywhere once the last life
//! is lost. Scoring, extra lives and life loss live here as well since they
//! drive the same transitions.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boss;
use super::entity::Entity;
use super::powerup::{PowerUpKind, Upgrade};
use super::snapshot::GameEvent;
use super::spawn;
use super::state::{GameState, World};
use super::timers::{Deferred, Scheduler};
use crate::consts::*;
use crate::ms_to_ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Tutorial,
    Playing,
    BossWarning,
    BossFight,
    LevelComplete,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Tutorial => "tutorial",
            Phase::Playing => "playing",
            Phase::BossWarning => "boss_warning",
            Phase::BossFight => "boss_fight",
            Phase::LevelComplete => "level_complete",
            Phase::GameOver => "game_over",
        }
    }
}

/// Something the player did that a tutorial step may be waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialTrigger {
    Moved,
    Fired,
    Killed,
    PickedUp,
    /// The scripted Shooter was destroyed or flew off
    ShooterCleared,
    /// A text-only step has been on screen long enough
    PauseElapsed(u8),
}

/// Number of tutorial steps
pub const TUTORIAL_STEPS: u8 = 7;

/// Hint text shown for each tutorial step
pub const TUTORIAL_MESSAGES: [&str; TUTORIAL_STEPS as usize] = [
    "Move your ship",
    "Fire!",
    "Destroy the enemy",
    "Grab the power-up",
    "Power-ups wear off after a while",
    "Shooters fire back, take them out",
    "Get ready for the boss",
];

pub fn tutorial_message(step: u8) -> Option<&'static str> {
    TUTORIAL_MESSAGES.get(step as usize).copied()
}

/// Trigger that completes `step`
fn tutorial_goal(step: u8) -> Option<TutorialTrigger> {
    match step {
        0 => Some(TutorialTrigger::Moved),
        1 => Some(TutorialTrigger::Fired),
        2 => Some(TutorialTrigger::Killed),
        3 => Some(TutorialTrigger::PickedUp),
        4 | 6 => Some(TutorialTrigger::PauseElapsed(step)),
        5 => Some(TutorialTrigger::ShooterCleared),
        _ => None,
    }
}

impl GameState {
    /// Add points and grant a life for every threshold crossed. Returns the
    /// number of lives granted.
    pub fn add_score(&mut self, points: u64) -> u32 {
        self.score = self.score.saturating_add(points);
        let mut granted = 0;
        // A saturated threshold is not a real one
        while self.score >= self.next_life_requirement && self.next_life_requirement != u64::MAX {
            self.lives += 1;
            granted += 1;
            match self.next_life_requirement.checked_mul(2) {
                Some(next) => self.next_life_requirement = next,
                None => {
                    self.next_life_requirement = u64::MAX;
                    break;
                }
            }
        }
        granted
    }
}

impl World {
    /// Award points, announcing any extra lives
    pub fn award(&mut self, points: u64) {
        let granted = self.game.add_score(points);
        if granted > 0 {
            log::info!(
                "{} extra life(s) at {} points, next at {}",
                granted,
                self.game.score,
                self.game.next_life_requirement
            );
            self.emit(GameEvent::ExtraLifeGranted {
                lives: self.game.lives,
            });
        }
    }

    /// Count an enemy kill toward the boss and score it
    pub fn record_kill(&mut self) {
        self.game.kills_in_level += 1;
        self.award(self.tuning.kill_score);
        self.observe(TutorialTrigger::Killed);
    }

    /// Take a hit. Returns false when the player was invulnerable or the run
    /// is already over.
    pub fn lose_life(&mut self, scheduler: &mut Scheduler) -> bool {
        if self.player.invulnerable || self.game.is_over() {
            return false;
        }
        self.game.lives = self.game.lives.saturating_sub(1);
        self.emit(GameEvent::PlayerHit {
            lives_left: self.game.lives,
        });
        let center = self.player.center();
        self.burst(center, 20, 2.0, 8.0, 0.1);

        if self.game.lives == 0 {
            self.game.phase = Phase::GameOver;
            self.emit(GameEvent::GameOver {
                score: self.game.score,
            });
            log::info!(
                "Game over at level {} with {} points",
                self.game.level,
                self.game.score
            );
            return true;
        }

        self.power_ups.clear_temporary();
        self.refresh_player_effects();

        let until = self.tick + ms_to_ticks(self.tuning.invulnerability_ms);
        self.player.invulnerable = true;
        self.player.invulnerable_until = until;
        scheduler.schedule(self.generation, until, Deferred::EndInvulnerability);
        log::debug!("Player hit, {} lives left", self.game.lives);
        true
    }
}

/// Fire every due deferred callback
pub fn run_deferred(world: &mut World, scheduler: &mut Scheduler) {
    for pending in scheduler.drain_due(world.tick) {
        if pending.generation != world.generation {
            log::warn!(
                "Dropping {:?} from run {} (current run {})",
                pending.action,
                pending.generation,
                world.generation
            );
            continue;
        }
        match pending.action {
            Deferred::SpawnBoss => {
                if world.game.phase == Phase::BossWarning {
                    boss::spawn(world);
                    world.game.phase = Phase::BossFight;
                } else {
                    log::warn!("Boss spawn due in {} phase, ignored", world.game.phase.as_str());
                }
            }
            Deferred::EndInvulnerability => {
                if world.tick >= world.player.invulnerable_until {
                    world.player.invulnerable = false;
                }
            }
            Deferred::ExpireEffect { effect, token } => {
                if world.power_ups.expire(effect, token) {
                    world.refresh_player_effects();
                    world.emit(GameEvent::PowerUpExpired { effect });
                    log::debug!("{:?} expired", effect);
                }
            }
            Deferred::ShooterReady { enemy_id } => {
                if let Some(enemy) = world.store.enemies.get_mut(enemy_id) {
                    enemy.has_fired = false;
                }
            }
            Deferred::TutorialPause { step } => {
                world.observe(TutorialTrigger::PauseElapsed(step));
            }
            Deferred::Explosion { at } => {
                world.burst(at, 12, 2.0, 6.0, 0.0);
                world.emit(GameEvent::Explosion { at });
            }
        }
    }
}

/// Evaluate transitions after collisions have been resolved
pub fn evaluate(world: &mut World, scheduler: &mut Scheduler) {
    if world.game.is_over() {
        return;
    }

    if world.game.phase == Phase::Tutorial {
        advance_tutorial(world, scheduler);
    }
    world.triggers.clear();

    match world.game.phase {
        Phase::Playing if spawn::boss_due(&world.game) => enter_boss_warning(world, scheduler),
        Phase::LevelComplete => complete_level(world),
        _ => {}
    }

    self_heal(world, scheduler);
}

fn advance_tutorial(world: &mut World, scheduler: &mut Scheduler) {
    let triggers = std::mem::take(&mut world.triggers);
    for trigger in triggers {
        if tutorial_goal(world.game.tutorial_step) != Some(trigger) {
            continue;
        }
        let next = world.game.tutorial_step + 1;
        if next >= TUTORIAL_STEPS {
            finish_tutorial(world);
            return;
        }
        world.game.tutorial_step = next;
        world.emit(GameEvent::TutorialAdvanced { step: next });
        log::debug!("Tutorial step {}: {}", next, TUTORIAL_MESSAGES[next as usize]);
        enter_tutorial_step(world, scheduler, next);
    }

    // Scripted entities must stay available until their step is done
    match world.game.tutorial_step {
        2 if world.store.enemies.is_empty() => spawn_tutorial_drifter(world),
        3 if world.store.power_ups.is_empty() => spawn_tutorial_power_up(world),
        _ => {}
    }
}

fn enter_tutorial_step(world: &mut World, scheduler: &mut Scheduler, step: u8) {
    match step {
        2 => spawn_tutorial_drifter(world),
        3 => spawn_tutorial_power_up(world),
        4 | 6 => {
            let due = world.tick + ms_to_ticks(world.tuning.tutorial_pause_ms);
            scheduler.schedule(world.generation, due, Deferred::TutorialPause { step });
        }
        5 => {
            let entry = spawn::shooter_entry(&mut world.rng, &world.tuning, Some(TUTORIAL_SPAWN_Y));
            world.store.spawn_enemy(entry.variant, entry.pos);
        }
        _ => {}
    }
}

fn spawn_tutorial_drifter(world: &mut World) {
    let entry = spawn::drifter_entry(&mut world.rng, &world.tuning);
    let pos = Vec2::new(entry.pos.x, TUTORIAL_SPAWN_Y);
    world.store.spawn_enemy(entry.variant, pos);
}

fn spawn_tutorial_power_up(world: &mut World) {
    let pos = Vec2::new((world.width() - POWER_UP_SIZE.x) / 2.0, TUTORIAL_SPAWN_Y);
    world.store.spawn_power_up(PowerUpKind::DoubleShot, pos);
}

fn finish_tutorial(world: &mut World) {
    world.game.is_tutorial = false;
    world.game.tutorial_step = TUTORIAL_STEPS;
    world.game.phase = Phase::Playing;
    world.emit(GameEvent::TutorialComplete);
    log::info!("Tutorial complete");
}

fn enter_boss_warning(world: &mut World, scheduler: &mut Scheduler) {
    world.game.is_boss_fight = true;
    world.game.kills_in_level = 0;
    world.game.phase = Phase::BossWarning;
    let due = world.tick + ms_to_ticks(world.tuning.boss_warning_ms);
    scheduler.schedule(world.generation, due, Deferred::SpawnBoss);
    world.emit(GameEvent::BossWarning {
        level: world.game.level,
    });
    log::info!("Boss incoming for level {} (due at tick {})", world.game.level, due);
}

/// Award the boss bonus and set up the next level
fn complete_level(world: &mut World) {
    let level = world.game.level;
    world.award(world.tuning.boss_bonus_per_level.saturating_mul(level as u64));

    let game = &mut world.game;
    game.level += 1;
    game.kills_in_level = 0;
    game.kills_required_for_boss = world.tuning.kills_required_for(game.level);
    game.difficulty *= world.tuning.difficulty_growth;
    game.is_boss_fight = false;
    game.phase = Phase::Playing;

    if world.tuning.boss_unlocks_upgrades {
        if let Some(upgrade) = Upgrade::next_unlock(&world.game.permanent_upgrades) {
            world.game.permanent_upgrades.insert(upgrade);
            world.refresh_player_effects();
            world.emit(GameEvent::UpgradeUnlocked { upgrade });
            log::info!("Unlocked permanent {:?}", upgrade);
        }
    }

    world.sync_boss_hud();
    world.emit(GameEvent::LevelComplete { level });
    log::info!(
        "Level {} complete, difficulty now {:.2}",
        level,
        world.game.difficulty
    );
}

/// Repair flag combinations that should be impossible
fn self_heal(world: &mut World, scheduler: &Scheduler) {
    let game = &world.game;
    let boss_present = world.store.boss.is_some();
    let spawn_pending = scheduler.is_pending(world.generation, |a| *a == Deferred::SpawnBoss);

    if game.is_boss_fight && !boss_present && !spawn_pending {
        log::warn!(
            "Boss fight flagged in {} phase with no boss or pending spawn; resuming play",
            game.phase.as_str()
        );
        world.game.is_boss_fight = false;
        world.game.phase = Phase::Playing;
        world.sync_boss_hud();
    } else if !game.is_boss_fight && matches!(game.phase, Phase::BossWarning | Phase::BossFight) {
        log::warn!("{} phase without boss fight flag; restoring", game.phase.as_str());
        world.game.is_boss_fight = true;
    } else if game.is_boss_fight && game.phase == Phase::Playing {
        log::warn!("Boss fight flag set while playing; clearing");
        world.game.is_boss_fight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EnemyVariant;
    use crate::sim::powerup::{ShotPattern, TimedEffect};
    use crate::tuning::Tuning;

    fn playing_world() -> World {
        World::new(
            Tuning {
                skip_tutorial: true,
                ..Default::default()
            },
            1,
        )
    }

    #[test]
    fn test_extra_life_law() {
        let mut game = GameState::new(&Tuning::default());
        assert_eq!(game.add_score(2400), 0);
        assert_eq!(game.add_score(100), 1);
        assert_eq!(game.lives, 4);
        assert_eq!(game.next_life_requirement, 5000);
    }

    #[test]
    fn test_large_award_crosses_several_thresholds() {
        let mut game = GameState::new(&Tuning::default());
        // 2500, 5000 and 10000 are all crossed
        assert_eq!(game.add_score(10_000), 3);
        assert_eq!(game.lives, 6);
        assert_eq!(game.next_life_requirement, 20_000);
    }

    #[test]
    fn test_threshold_saturates() {
        let mut game = GameState::new(&Tuning::default());
        game.next_life_requirement = u64::MAX / 2 + 1;
        game.score = u64::MAX - 1;
        game.add_score(10);
        assert_eq!(game.score, u64::MAX);
        assert_eq!(game.next_life_requirement, u64::MAX);
    }

    #[test]
    fn test_saturated_threshold_grants_nothing_more() {
        let mut game = GameState::new(&Tuning::default());
        game.next_life_requirement = u64::MAX / 2 + 1;
        game.score = u64::MAX - 1;
        let lives = game.lives;
        assert_eq!(game.add_score(10), 1);
        assert_eq!(game.add_score(0), 0);
        assert_eq!(game.add_score(500), 0);
        assert_eq!(game.lives, lives + 1);
    }

    #[test]
    fn test_award_emits_extra_life() {
        let mut world = playing_world();
        world.award(2500);
        assert!(world
            .events
            .contains(&GameEvent::ExtraLifeGranted { lives: 4 }));
    }

    #[test]
    fn test_boss_warning_then_spawn() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.kills_in_level = 30;
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.phase, Phase::BossWarning);
        assert!(world.game.is_boss_fight);
        assert_eq!(world.game.kills_in_level, 0);

        world.tick += 179;
        run_deferred(&mut world, &mut scheduler);
        assert!(world.store.boss.is_none());

        world.tick += 1;
        run_deferred(&mut world, &mut scheduler);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.phase, Phase::BossFight);
        assert_eq!(world.store.boss.as_ref().map(|b| b.health), Some(100));
        assert_eq!(world.game.boss_health, 100);
    }

    #[test]
    fn test_level_complete_rewards() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.is_boss_fight = true;
        world.game.phase = Phase::LevelComplete;
        world.game.kills_in_level = 4;
        evaluate(&mut world, &mut scheduler);

        assert_eq!(world.game.phase, Phase::Playing);
        assert_eq!(world.game.level, 2);
        assert_eq!(world.game.score, 10_000);
        assert_eq!(world.game.kills_in_level, 0);
        assert_eq!(world.game.kills_required_for_boss, 35);
        assert!((world.game.difficulty - 1.2).abs() < 1e-6);
        assert!(!world.game.is_boss_fight);
        assert!(world.game.permanent_upgrades.contains(&Upgrade::DoubleShot));
        assert!(world.events.contains(&GameEvent::LevelComplete { level: 1 }));
    }

    #[test]
    fn test_upgrade_rewards_can_be_disabled() {
        let mut world = World::new(
            Tuning {
                skip_tutorial: true,
                boss_unlocks_upgrades: false,
                ..Default::default()
            },
            1,
        );
        let mut scheduler = Scheduler::new();
        world.game.phase = Phase::LevelComplete;
        evaluate(&mut world, &mut scheduler);
        assert!(world.game.permanent_upgrades.is_empty());
    }

    #[test]
    fn test_lose_life_clears_temporary_keeps_permanent() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.permanent_upgrades.insert(Upgrade::WideShot);
        let tuning = world.tuning.clone();
        world.power_ups.activate(TimedEffect::TripleShot, 0, &tuning);
        world.refresh_player_effects();

        assert!(world.lose_life(&mut scheduler));
        assert_eq!(world.game.lives, 2);
        assert!(world.player.invulnerable);
        assert_eq!(world.player.shot_pattern, ShotPattern::Wide);

        // A second hit inside the window is ignored
        assert!(!world.lose_life(&mut scheduler));
        assert_eq!(world.game.lives, 2);
    }

    #[test]
    fn test_invulnerability_ends_on_schedule() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.lose_life(&mut scheduler);
        world.tick = 179;
        run_deferred(&mut world, &mut scheduler);
        assert!(world.player.invulnerable);
        world.tick = 180;
        run_deferred(&mut world, &mut scheduler);
        assert!(!world.player.invulnerable);
    }

    #[test]
    fn test_last_life_is_game_over() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.lives = 1;
        world.lose_life(&mut scheduler);
        assert_eq!(world.game.phase, Phase::GameOver);
        assert!(world.game.is_over());
        assert!(world.events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
    }

    #[test]
    fn test_stale_generation_dropped() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.phase = Phase::BossWarning;
        world.game.is_boss_fight = true;
        scheduler.schedule(0, 0, Deferred::SpawnBoss);
        run_deferred(&mut world, &mut scheduler);
        assert!(world.store.boss.is_none());
    }

    #[test]
    fn test_self_heal_boss_flag_without_boss() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.is_boss_fight = true;
        world.game.phase = Phase::BossFight;
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.phase, Phase::Playing);
        assert!(!world.game.is_boss_fight);
    }

    #[test]
    fn test_self_heal_restores_missing_flag() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.phase = Phase::BossWarning;
        world.game.is_boss_fight = false;
        scheduler.schedule(world.generation, world.tick + 10, Deferred::SpawnBoss);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.phase, Phase::BossWarning);
        assert!(world.game.is_boss_fight);
    }

    #[test]
    fn test_self_heal_clears_flag_while_playing() {
        let mut world = playing_world();
        let mut scheduler = Scheduler::new();
        world.game.is_boss_fight = true;
        scheduler.schedule(world.generation, world.tick + 10, Deferred::SpawnBoss);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.phase, Phase::Playing);
        assert!(!world.game.is_boss_fight);
    }

    #[test]
    fn test_tutorial_walkthrough() {
        let mut world = World::new(Tuning::default(), 1);
        let mut scheduler = Scheduler::new();

        world.observe(TutorialTrigger::Moved);
        world.observe(TutorialTrigger::Fired);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.tutorial_step, 2);
        assert_eq!(world.store.enemies.len(), 1);
        assert_eq!(world.store.enemies.iter().next().unwrap().pos.y, TUTORIAL_SPAWN_Y);

        world.store.enemies.remove_where(|_| true);
        world.record_kill();
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.tutorial_step, 3);
        assert_eq!(world.store.power_ups.len(), 1);

        world.observe(TutorialTrigger::PickedUp);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.tutorial_step, 4);

        world.tick += 240;
        run_deferred(&mut world, &mut scheduler);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.tutorial_step, 5);
        assert_eq!(world.store.count_shooters(), 1);

        world.observe(TutorialTrigger::ShooterCleared);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.tutorial_step, 6);

        world.tick += 240;
        run_deferred(&mut world, &mut scheduler);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.phase, Phase::Playing);
        assert!(!world.game.is_tutorial);
        assert!(world.events.contains(&GameEvent::TutorialComplete));
    }

    #[test]
    fn test_tutorial_ignores_out_of_order_triggers() {
        let mut world = World::new(Tuning::default(), 1);
        let mut scheduler = Scheduler::new();
        world.observe(TutorialTrigger::Fired);
        world.observe(TutorialTrigger::PickedUp);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.game.tutorial_step, 0);
    }

    #[test]
    fn test_tutorial_drifter_respawns() {
        let mut world = World::new(Tuning::default(), 1);
        let mut scheduler = Scheduler::new();
        world.observe(TutorialTrigger::Moved);
        world.observe(TutorialTrigger::Fired);
        evaluate(&mut world, &mut scheduler);
        world.store.enemies.remove_where(|_| true);
        evaluate(&mut world, &mut scheduler);
        assert_eq!(world.store.enemies.len(), 1);
        assert!(matches!(
            world.store.enemies.iter().next().unwrap().variant,
            EnemyVariant::Drifter
        ));
    }
}
