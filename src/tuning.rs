//! Game balance and run configuration
//!
//! Every gameplay constant the simulation reads at runtime lives here so a
//! host can load a JSON file instead of recompiling.

use serde::{Deserialize, Serialize};

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "norm" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Lives at the start of a run
    pub fn starting_lives(&self) -> u32 {
        match self {
            DifficultyPreset::Easy => 5,
            DifficultyPreset::Normal => 3,
            DifficultyPreset::Hard => 2,
        }
    }

    /// Initial difficulty scalar
    pub fn starting_difficulty(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 0.8,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 1.3,
        }
    }
}

/// Tunable gameplay parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub preset: DifficultyPreset,
    /// Run seed for reproducibility
    pub seed: u64,
    /// Start directly in level play
    pub skip_tutorial: bool,

    // === Playfield ===
    pub playfield_width: f32,
    pub playfield_height: f32,

    // === Spawning (probabilities per tick unless noted) ===
    pub enemy_spawn_chance: f64,
    /// Share of spawned enemies that are Shooters
    pub shooter_share: f64,
    pub shooter_fire_chance: f64,
    pub shooter_cooldown_ms: u32,
    /// Probability per enemy kill
    pub power_up_drop_chance: f64,
    pub bonus_target_chance: f64,
    pub bonus_target_cooldown_ms: u32,
    pub bonus_target_hits: u32,

    // === Scoring ===
    pub kill_score: u64,
    pub bonus_target_score: u64,
    pub boss_bonus_per_level: u64,
    pub first_extra_life: u64,

    // === Player ===
    pub fire_interval_ms: u32,
    pub rapid_fire_interval_ms: u32,
    pub invulnerability_ms: u32,

    // === Power-ups ===
    pub effect_duration_ms: u32,
    pub giant_duration_ms: u32,
    /// Each boss defeat unlocks the next permanent upgrade
    pub boss_unlocks_upgrades: bool,

    // === Boss ===
    pub boss_warning_ms: u32,
    pub boss_health_per_level: i32,
    pub boss_fire_chance: f64,
    pub boss_bullet_speed: f32,

    // === Progression ===
    pub base_kills_for_boss: u32,
    pub kills_per_level: u32,
    pub max_kills_for_boss: u32,
    pub difficulty_growth: f32,
    /// Pause on the text-only tutorial steps
    pub tutorial_pause_ms: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            preset: DifficultyPreset::Normal,
            seed: 0x5eed_5eed,
            skip_tutorial: false,

            playfield_width: 800.0,
            playfield_height: 600.0,

            enemy_spawn_chance: 0.03,
            shooter_share: 0.3,
            shooter_fire_chance: 0.01,
            shooter_cooldown_ms: 2000,
            power_up_drop_chance: 0.2,
            bonus_target_chance: 0.0005,
            bonus_target_cooldown_ms: 15_000,
            bonus_target_hits: 3,

            kill_score: 100,
            bonus_target_score: 1000,
            boss_bonus_per_level: 10_000,
            first_extra_life: 2500,

            fire_interval_ms: 125,
            rapid_fire_interval_ms: 80,
            invulnerability_ms: 3000,

            effect_duration_ms: 10_000,
            giant_duration_ms: 10_000,
            boss_unlocks_upgrades: true,

            boss_warning_ms: 3000,
            boss_health_per_level: 100,
            boss_fire_chance: 0.02,
            boss_bullet_speed: 7.0,

            base_kills_for_boss: 30,
            kills_per_level: 5,
            max_kills_for_boss: 50,
            difficulty_growth: 1.2,
            tutorial_pause_ms: 4000,
        }
    }
}

impl Tuning {
    /// Default tuning with a preset applied
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Parse tuning from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp values the simulation cannot work with
    pub fn sanitized(mut self) -> Self {
        for (name, p) in [
            ("enemy_spawn_chance", &mut self.enemy_spawn_chance),
            ("shooter_share", &mut self.shooter_share),
            ("shooter_fire_chance", &mut self.shooter_fire_chance),
            ("power_up_drop_chance", &mut self.power_up_drop_chance),
            ("bonus_target_chance", &mut self.bonus_target_chance),
            ("boss_fire_chance", &mut self.boss_fire_chance),
        ] {
            let clamped = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
            if clamped != *p {
                log::warn!("Tuning {} = {} out of range, using {}", name, p, clamped);
                *p = clamped;
            }
        }

        if !(self.playfield_width.is_finite() && self.playfield_width >= 200.0) {
            log::warn!("Tuning playfield_width = {} too small", self.playfield_width);
            self.playfield_width = Self::default().playfield_width;
        }
        if !(self.playfield_height.is_finite() && self.playfield_height >= 200.0) {
            log::warn!("Tuning playfield_height = {} too small", self.playfield_height);
            self.playfield_height = Self::default().playfield_height;
        }
        if !(self.difficulty_growth.is_finite() && self.difficulty_growth >= 1.0) {
            log::warn!(
                "Tuning difficulty_growth = {} would lower difficulty, using 1.0",
                self.difficulty_growth
            );
            self.difficulty_growth = 1.0;
        }
        if !(self.boss_bullet_speed.is_finite() && self.boss_bullet_speed > 0.0) {
            self.boss_bullet_speed = Self::default().boss_bullet_speed;
        }
        self.boss_health_per_level = self.boss_health_per_level.max(1);
        self.bonus_target_hits = self.bonus_target_hits.max(1);
        self.first_extra_life = self.first_extra_life.max(1);
        self.base_kills_for_boss = self.base_kills_for_boss.max(1);
        self.max_kills_for_boss = self.max_kills_for_boss.max(self.base_kills_for_boss);
        self.fire_interval_ms = self.fire_interval_ms.max(1);
        self.rapid_fire_interval_ms = self.rapid_fire_interval_ms.max(1);
        self
    }

    /// Kills needed to summon the boss on a given level (1-based)
    pub fn kills_required_for(&self, level: u32) -> u32 {
        let extra = level.saturating_sub(1).saturating_mul(self.kills_per_level);
        self.base_kills_for_boss
            .saturating_add(extra)
            .min(self.max_kills_for_boss)
    }

    /// Boss health on a given level
    pub fn boss_health_for(&self, level: u32) -> i32 {
        self.boss_health_per_level
            .saturating_mul(level.min(i32::MAX as u32) as i32)
    }
}
