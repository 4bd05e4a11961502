//! Flappy Evo - population-scale side-scroller for evolved controllers
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, masks, obstacles, population tick)
//! - `evaluator`: Runs one generation to extinction and reports fitness
//! - `brain`: Feed-forward decision function used by the trainer
//! - `evolve`: Generational training loop
//! - `halloffame`: Top brains across a training run
//! - `config`: Data-driven simulation and evolution parameters

pub mod brain;
pub mod config;
pub mod evaluator;
pub mod evolve;
pub mod halloffame;
pub mod sim;

pub use brain::Brain;
pub use config::{AppConfig, ConfigError, EvolutionConfig, SimConfig};
pub use evaluator::{EpisodeEnd, GenerationEvaluator, GenerationReport, run_episode};
pub use halloffame::HallOfFame;

/// Game configuration constants
pub mod consts {
    /// Screen dimensions
    pub const SCREEN_WIDTH: f32 = 500.0;
    pub const SCREEN_HEIGHT: f32 = 800.0;

    /// Logical ticks per second (the frame rate is the simulation rate)
    pub const TICKS_PER_SECOND: u32 = 30;

    /// Top of the ground strip; agents touching it are out of bounds
    pub const GROUND_Y: f32 = 730.0;

    /// Agent spawn point
    pub const AGENT_SPAWN_X: f32 = 230.0;
    pub const AGENT_SPAWN_Y: f32 = 350.0;

    /// Agent physics
    pub const JUMP_VELOCITY: f32 = -10.5;
    pub const GRAVITY: f32 = 1.5;
    pub const MAX_FALL_STEP: f32 = 16.0;
    pub const RISE_BOOST: f32 = 2.0;
    /// Band below the jump height that still counts as "leveling"
    pub const LEVEL_BAND: f32 = 50.0;

    /// Tilt, degrees
    pub const MAX_TILT: f32 = 25.0;
    pub const MIN_TILT: f32 = -90.0;
    pub const ROTATION_VELOCITY: f32 = 20.0;
    /// At or below this tilt the wings freeze on the glide frame
    pub const GLIDE_TILT: f32 = -80.0;

    /// Ticks per animation phase
    pub const ANIMATION_TICKS: u32 = 5;

    /// World scroll speed (obstacles and ground), pixels per tick
    pub const SCROLL_SPEED: f32 = 5.0;

    /// Obstacles
    pub const OBSTACLE_GAP: f32 = 200.0;
    pub const OBSTACLE_SPAWN_X: f32 = 600.0;
    pub const GAP_HEIGHT_MIN: i32 = 50;
    pub const GAP_HEIGHT_MAX: i32 = 450;

    /// Fitness terms
    pub const SURVIVAL_REWARD: f32 = 0.1;
    pub const PASS_REWARD: f32 = 5.0;
    pub const COLLISION_PENALTY: f32 = 1.0;

    /// Activation above this threshold means "jump"
    pub const JUMP_THRESHOLD: f32 = 0.5;

    /// Sprite dimensions (pixels)
    pub const AGENT_SPRITE_WIDTH: i32 = 68;
    pub const AGENT_SPRITE_HEIGHT: i32 = 48;
    pub const OBSTACLE_SPRITE_WIDTH: i32 = 104;
    pub const OBSTACLE_SPRITE_HEIGHT: i32 = 640;
    pub const GROUND_TILE_WIDTH: f32 = 672.0;
}
