//! Population runtime state
//!
//! Everything one episode mutates lives here. Construction, read-only views
//! and the fitness sink are defined in this file; the per-tick algorithm is in
//! `tick.rs`.

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentParams};
use super::ground::ScrollingGround;
use super::obstacle::Obstacle;
use super::sprites::SpriteSet;
use crate::config::{ConfigError, SimConfig};

/// Derive a per-generation RNG seed so every generation sees a different
/// obstacle course while the whole run stays reproducible.
pub fn generation_seed(seed: u64, generation: u32) -> u64 {
    (u64::from(generation))
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(seed)
}

/// Why an agent left the live set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Collision,
    OutOfBounds,
}

/// Notable things that happened during the last tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Candidate `id` was removed from the live set
    Died { id: usize, cause: DeathCause },
    /// The lead agent cleared an obstacle; `score` is the new total
    ObstaclePassed { score: u32 },
    /// Nobody is left; the episode is over
    Extinct,
}

/// One live agent together with its controller.
///
/// Agent, controller and candidate id travel together, so removing an entry
/// can never misalign them.
#[derive(Debug)]
pub struct Contestant<D> {
    /// Position of this candidate in the input batch and the fitness report
    pub id: usize,
    pub agent: Agent,
    pub decider: D,
}

/// Read-only view of an agent for drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub tilt: f32,
    pub frame: usize,
}

/// Read-only view of an obstacle for drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
    pub passed: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: u32,
    pub tick: u64,
    pub score: u32,
    pub agents: Vec<AgentView>,
    pub obstacles: Vec<ObstacleView>,
    pub ground: (f32, f32, f32),
}

/// Owns the live population, the obstacle course and the fitness sink of one episode
#[derive(Debug)]
pub struct PopulationRuntime<D> {
    pub(super) config: SimConfig,
    pub(super) sprites: Arc<SpriteSet>,
    pub(super) rng: Pcg32,
    pub(super) generation: u32,
    /// Live agents in spawn order; index 0 is the lead agent
    pub(super) live: Vec<Contestant<D>>,
    /// Fitness per candidate id; only ever added to or subtracted from
    pub(super) fitness: Vec<f32>,
    /// Ordered oldest (leftmost) first
    pub(super) obstacles: Vec<Obstacle>,
    pub(super) ground: ScrollingGround,
    pub(super) score: u32,
    pub(super) time_ticks: u64,
    pub(super) events: Vec<SimEvent>,
}

impl<D> PopulationRuntime<D> {
    /// Spawn one agent per decision function, all at the spawn point
    pub fn new(
        config: SimConfig,
        sprites: Arc<SpriteSet>,
        deciders: impl IntoIterator<Item = D>,
        generation: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config, sprites, deciders, generation))
    }

    /// `config` must already have passed `SimConfig::validate`
    pub(crate) fn from_validated(
        config: SimConfig,
        sprites: Arc<SpriteSet>,
        deciders: impl IntoIterator<Item = D>,
        generation: u32,
    ) -> Self {
        let params = AgentParams::from(&config);
        let spawn = Vec2::new(config.spawn_x, config.spawn_y);
        let live: Vec<Contestant<D>> = deciders
            .into_iter()
            .enumerate()
            .map(|(id, decider)| Contestant {
                id,
                agent: Agent::new(spawn, params),
                decider,
            })
            .collect();
        let fitness = vec![0.0; live.len()];

        let mut rng = Pcg32::seed_from_u64(generation_seed(config.seed, generation));
        let obstacles = vec![Obstacle::new(config.obstacle_spawn_x, &config, &sprites, &mut rng)];
        let ground = ScrollingGround::new(config.ground_y, config.ground_tile_width, config.scroll_speed);

        Self {
            config,
            sprites,
            rng,
            generation,
            live,
            fitness,
            obstacles,
            ground,
            score: 0,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn live(&self) -> &[Contestant<D>] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_extinct(&self) -> bool {
        self.live.is_empty()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn ground(&self) -> &ScrollingGround {
        &self.ground
    }

    /// Fitness of every candidate, indexed like the input batch
    pub fn fitness(&self) -> &[f32] {
        &self.fitness
    }

    /// Events raised by the most recent tick
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Consume the runtime and hand back the fitness report
    pub fn into_fitness(self) -> Vec<f32> {
        self.fitness
    }

    /// Replace the obstacle course (scripted scenarios and replays)
    pub fn set_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        self.obstacles = obstacles;
        self.obstacles.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    /// Spawn a fresh obstacle at the configured spawn offset
    pub(super) fn spawn_obstacle(&mut self) {
        let obstacle = Obstacle::new(
            self.config.obstacle_spawn_x,
            &self.config,
            &self.sprites,
            &mut self.rng,
        );
        self.obstacles.push(obstacle);
    }

    /// Read-only frame for rendering sinks
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            tick: self.time_ticks,
            score: self.score,
            agents: self
                .live
                .iter()
                .map(|c| AgentView {
                    id: c.id,
                    x: c.agent.x(),
                    y: c.agent.y(),
                    tilt: c.agent.tilt,
                    frame: c.agent.frame,
                })
                .collect(),
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    x: o.x,
                    top: o.top,
                    bottom: o.bottom,
                    passed: o.passed,
                })
                .collect(),
            ground: (self.ground.x1, self.ground.x2, self.ground.y),
        }
    }
}
