//! Simulation and evolution parameters
//!
//! Every tunable lives here so runs are reproducible from a single JSON file.
//! Defaults reproduce the classic game.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Physics, scoring and layout of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    /// Pacing rate when running in real time
    pub ticks_per_second: u32,
    pub ground_y: f32,

    // === Agent ===
    pub spawn_x: f32,
    pub spawn_y: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    pub max_fall_step: f32,
    pub rise_boost: f32,
    pub level_band: f32,
    pub max_tilt: f32,
    pub min_tilt: f32,
    pub rotation_velocity: f32,
    pub glide_tilt: f32,
    pub animation_ticks: u32,

    // === World ===
    pub scroll_speed: f32,
    pub obstacle_gap: f32,
    pub obstacle_spawn_x: f32,
    /// Gap-top heights are drawn from `gap_height_min..gap_height_max`
    pub gap_height_min: i32,
    pub gap_height_max: i32,
    pub ground_tile_width: f32,

    // === Fitness ===
    pub survival_reward: f32,
    pub pass_reward: f32,
    pub collision_penalty: f32,
    pub jump_threshold: f32,

    /// Run seed; each generation derives its own stream from it
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            ticks_per_second: TICKS_PER_SECOND,
            ground_y: GROUND_Y,

            spawn_x: AGENT_SPAWN_X,
            spawn_y: AGENT_SPAWN_Y,
            jump_velocity: JUMP_VELOCITY,
            gravity: GRAVITY,
            max_fall_step: MAX_FALL_STEP,
            rise_boost: RISE_BOOST,
            level_band: LEVEL_BAND,
            max_tilt: MAX_TILT,
            min_tilt: MIN_TILT,
            rotation_velocity: ROTATION_VELOCITY,
            glide_tilt: GLIDE_TILT,
            animation_ticks: ANIMATION_TICKS,

            scroll_speed: SCROLL_SPEED,
            obstacle_gap: OBSTACLE_GAP,
            obstacle_spawn_x: OBSTACLE_SPAWN_X,
            gap_height_min: GAP_HEIGHT_MIN,
            gap_height_max: GAP_HEIGHT_MAX,
            ground_tile_width: GROUND_TILE_WIDTH,

            survival_reward: SURVIVAL_REWARD,
            pass_reward: PASS_REWARD,
            collision_penalty: COLLISION_PENALTY,
            jump_threshold: JUMP_THRESHOLD,

            seed: 0,
        }
    }
}

impl SimConfig {
    /// Reject parameter combinations the simulation cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return Err(ConfigError::Invalid("screen dimensions must be positive"));
        }
        if self.ground_y <= 0.0 || self.ground_y > self.screen_height {
            return Err(ConfigError::Invalid("ground_y must lie within the screen"));
        }
        if self.ticks_per_second == 0 {
            return Err(ConfigError::Invalid("ticks_per_second must be positive"));
        }
        if self.scroll_speed <= 0.0 {
            return Err(ConfigError::Invalid("scroll_speed must be positive"));
        }
        if self.gap_height_min >= self.gap_height_max {
            return Err(ConfigError::Invalid("gap height range is empty"));
        }
        if self.obstacle_gap <= 0.0 {
            return Err(ConfigError::Invalid("obstacle_gap must be positive"));
        }
        if self.min_tilt > self.max_tilt {
            return Err(ConfigError::Invalid("min_tilt exceeds max_tilt"));
        }
        if self.animation_ticks == 0 {
            return Err(ConfigError::Invalid("animation_ticks must be positive"));
        }
        // A strip only wraps once fully off-screen, so the other one must span the screen alone
        if self.ground_tile_width < self.screen_width + self.scroll_speed {
            return Err(ConfigError::Invalid(
                "ground_tile_width must cover screen_width plus one scroll step",
            ));
        }
        Ok(())
    }

    /// Seconds per tick when paced
    pub fn tick_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.ticks_per_second))
    }
}

/// Parameters of the generational training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: u32,
    /// Stop as soon as the best fitness of a generation reaches this value
    pub fitness_threshold: f32,
    /// Best brains copied unchanged into the next generation
    pub elitism: usize,
    pub tournament_size: usize,
    /// Per-gene chance of mutation
    pub mutation_rate: f32,
    /// Maximum perturbation applied to a mutated gene
    pub mutation_power: f32,
    /// Chance a mutated gene is replaced outright
    pub replace_rate: f32,
    /// Initial weights are drawn from `-init_range..init_range`
    pub init_range: f32,
    /// Safety cap on ticks per episode (`None` runs to extinction).
    ///
    /// `Trainer` enforces it on top of any cap the evaluator already carries.
    pub max_ticks: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 50,
            fitness_threshold: 100.0,
            elitism: 2,
            tournament_size: 3,
            mutation_rate: 0.8,
            mutation_power: 0.5,
            replace_rate: 0.1,
            init_range: 1.0,
            max_ticks: Some(30 * 60 * 5),
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::Invalid("population_size must be positive"));
        }
        if self.elitism > self.population_size {
            return Err(ConfigError::Invalid("elitism exceeds population_size"));
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::Invalid("tournament_size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) || !(0.0..=1.0).contains(&self.replace_rate) {
            return Err(ConfigError::Invalid("mutation rates must be between 0.0 and 1.0"));
        }
        if self.init_range <= 0.0 {
            return Err(ConfigError::Invalid("init_range must be positive"));
        }
        Ok(())
    }
}

/// Complete run configuration as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sim: SimConfig,
    pub evolution: EvolutionConfig,
}

impl AppConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()?;
        self.evolution.validate()
    }
}
