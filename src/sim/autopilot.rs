//! Demo autopilot
//!
//! Plays the game for attract mode and soak tests: dodges bullets about to
//! land, grabs power-ups when it is safe, otherwise lines up under the
//! lowest threat. Always holds fire.

use glam::Vec2;

use super::entity::Entity;
use super::state::World;
use super::tick::TickInput;
use crate::consts::*;

/// How far above the ship a hostile bullet counts as incoming
const DANGER_HEIGHT: f32 = 120.0;
/// Extra horizontal clearance when sidestepping
const DODGE_MARGIN: f32 = 20.0;

/// Produce this tick's input from the current world
pub fn drive(world: &World) -> TickInput {
    let player = &world.player;
    let ship = player.hitbox();
    let home_y = World::player_start(&world.tuning).y;

    // Nearest hostile bullet in the column above us
    let incoming = world
        .store
        .bullets
        .iter()
        .filter(|b| !b.owner.is_friendly())
        .filter(|b| {
            let r = b.rect();
            r.max.y > ship.min.y - DANGER_HEIGHT
                && r.min.y < ship.max.y
                && r.max.x > ship.min.x - DODGE_MARGIN
                && r.min.x < ship.max.x + DODGE_MARGIN
        })
        .min_by(|a, b| {
            let da = (ship.min.y - a.rect().max.y).abs();
            let db = (ship.min.y - b.rect().max.y).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

    if let Some(bullet) = incoming {
        // Step to whichever side has more room
        let bullet_x = bullet.center().x;
        let dodge_left = bullet_x > world.width() / 2.0;
        let x = if dodge_left {
            bullet_x - PLAYER_SIZE.x - DODGE_MARGIN - PLAYER_SIZE.x
        } else {
            bullet_x + DODGE_MARGIN + PLAYER_SIZE.x
        };
        return TickInput::toward(Vec2::new(x, home_y), true);
    }

    // Nearest power-up
    let pickup = world.store.power_ups.iter().min_by(|a, b| {
        let da = a.center().distance_squared(ship.center());
        let db = b.center().distance_squared(ship.center());
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(p) = pickup {
        let x = p.center().x - PLAYER_SIZE.x / 2.0;
        return TickInput::toward(Vec2::new(x, home_y), true);
    }

    // Lowest enemy, else the boss, else the bonus target
    let threat = world
        .store
        .enemies
        .iter()
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|e| e.center())
        .or_else(|| world.store.boss.as_ref().map(|b| b.center()))
        .or_else(|| world.store.bonus_target.as_ref().map(|t| t.center()));

    let x = match threat {
        Some(at) => {
            // Wobble a little so the ship does not sit perfectly still
            let t = world.tick as f32 * 0.02;
            let offset = t.sin() * 6.0 + (t * 0.7).sin() * 3.0;
            at.x - PLAYER_SIZE.x / 2.0 + offset
        }
        None => {
            // Patrol while nothing is around
            let t = world.tick as f32 * 0.01;
            (world.width() - PLAYER_SIZE.x) / 2.0 + t.sin() * world.width() / 4.0
        }
    };
    TickInput::toward(Vec2::new(x, home_y), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{BulletOwner, EnemyVariant, MAX_PARTICLES};
    use crate::sim::powerup::PowerUpKind;
    use crate::sim::progression::Phase;
    use crate::sim::tick::tick;
    use crate::sim::timers::Scheduler;
    use crate::tuning::Tuning;

    fn world() -> World {
        World::new(
            Tuning {
                skip_tutorial: true,
                ..Default::default()
            },
            1,
        )
    }

    #[test]
    fn test_always_fires() {
        let w = world();
        assert!(drive(&w).firing);
    }

    #[test]
    fn test_tracks_lowest_enemy() {
        let mut w = world();
        w.store.spawn_enemy(EnemyVariant::Drifter, Vec2::new(100.0, 50.0));
        w.store.spawn_enemy(EnemyVariant::Drifter, Vec2::new(600.0, 300.0));
        let target = drive(&w).move_target.unwrap();
        assert!((target.x - (615.0 - PLAYER_SIZE.x / 2.0)).abs() < 10.0);
    }

    #[test]
    fn test_dodges_incoming_bullet() {
        let mut w = world();
        let ship = w.player.hitbox();
        let above = Vec2::new(ship.center().x, ship.min.y - 40.0);
        w.store.spawn_bullet(BulletOwner::Enemy, above, Vec2::new(0.0, 5.0));
        let target = drive(&w).move_target.unwrap();
        let clearance = (target.x + PLAYER_SIZE.x / 2.0 - above.x).abs();
        assert!(clearance > PLAYER_SIZE.x);
    }

    #[test]
    fn test_prefers_power_up_over_enemy() {
        let mut w = world();
        w.store.spawn_enemy(EnemyVariant::Drifter, Vec2::new(600.0, 300.0));
        w.store.spawn_power_up(PowerUpKind::Giant, Vec2::new(100.0, 200.0));
        let target = drive(&w).move_target.unwrap();
        assert!((target.x - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_soak_run_stays_consistent() {
        let mut w = World::new(Tuning::default(), 1);
        let mut scheduler = Scheduler::new();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let mut last_score = 0;
        let mut last_difficulty = w.game.difficulty;
        for _ in 0..20_000 {
            tick(&mut w, &mut scheduler, &input);
            assert!(w.game.score >= last_score);
            assert!(w.game.difficulty >= last_difficulty);
            assert!(w.store.particles.len() <= MAX_PARTICLES);
            if w.game.is_boss_fight {
                assert_ne!(w.game.phase, Phase::Playing);
            }
            last_score = w.game.score;
            last_difficulty = w.game.difficulty;
            if w.game.is_over() {
                break;
            }
        }
        assert!(w.tick > 0);
    }
}
