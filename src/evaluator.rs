//! Generation evaluator
//!
//! Runs one batch of decision functions through a full episode and reports
//! each candidate's fitness in input order.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SimConfig};
use crate::sim::{DecisionFunction, PopulationRuntime, Snapshot, SpriteSet, TickOutcome};

/// How an episode came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeEnd {
    /// Every agent died
    Extinct,
    /// The caller's tick cap was reached with agents still alive
    TickCap,
    /// The observer asked to stop
    Aborted,
}

/// Outcome of one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    /// Final fitness per candidate, index-aligned with the input batch
    pub fitness: Vec<f32>,
    /// Obstacles cleared by the population
    pub score: u32,
    pub ticks: u64,
    pub end: EpisodeEnd,
}

impl GenerationReport {
    /// Index and value of the best candidate
    pub fn best(&self) -> Option<(usize, f32)> {
        self.fitness
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn mean(&self) -> f32 {
        if self.fitness.is_empty() {
            return 0.0;
        }
        self.fitness.iter().sum::<f32>() / self.fitness.len() as f32
    }

    pub fn stdev(&self) -> f32 {
        if self.fitness.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .fitness
            .iter()
            .map(|f| (f - mean) * (f - mean))
            .sum::<f32>()
            / self.fitness.len() as f32;
        var.sqrt()
    }
}

/// Sleeps so ticks happen at a fixed wall-clock rate.
///
/// Overruns are not made up: if a tick takes too long the schedule restarts
/// from now instead of bursting.
#[derive(Debug)]
pub struct FramePacer {
    period: Duration,
    next: Instant,
}

impl FramePacer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Block until the next tick is due
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }
}

/// Runs generations against a fixed configuration
#[derive(Debug, Clone)]
pub struct GenerationEvaluator {
    config: SimConfig,
    sprites: Arc<SpriteSet>,
    max_ticks: Option<u64>,
    realtime: bool,
}

impl GenerationEvaluator {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_sprites(config, SpriteSet::classic())
    }

    /// Use custom collision silhouettes
    pub fn with_sprites(config: SimConfig, sprites: SpriteSet) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sprites: Arc::new(sprites),
            max_ticks: None,
            realtime: false,
        })
    }

    /// Stop episodes after this many ticks even if agents survive
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Pace ticks at `ticks_per_second` instead of running flat out
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn max_ticks(&self) -> Option<u64> {
        self.max_ticks
    }

    /// Build the runtime for one generation without running it
    pub fn spawn<D: DecisionFunction>(
        &self,
        deciders: impl IntoIterator<Item = D>,
        generation: u32,
    ) -> PopulationRuntime<D> {
        PopulationRuntime::from_validated(self.config.clone(), self.sprites.clone(), deciders, generation)
    }

    /// Run one generation to extinction (or the tick cap)
    pub fn run_episode<D: DecisionFunction>(
        &self,
        deciders: impl IntoIterator<Item = D>,
        generation: u32,
    ) -> GenerationReport {
        self.run_episode_with(deciders, generation, |_| ControlFlow::Continue(()))
    }

    /// Run one generation, handing a snapshot to `observer` after every tick.
    ///
    /// The observer can abort the episode by returning `ControlFlow::Break`;
    /// fitness accrued so far is still reported.
    pub fn run_episode_with<D, F>(
        &self,
        deciders: impl IntoIterator<Item = D>,
        generation: u32,
        mut observer: F,
    ) -> GenerationReport
    where
        D: DecisionFunction,
        F: FnMut(&Snapshot) -> ControlFlow<()>,
    {
        let mut runtime = self.spawn(deciders, generation);
        let population = runtime.live_count();
        let mut pacer = self
            .realtime
            .then(|| FramePacer::new(self.config.tick_duration()));

        let end = loop {
            if self.max_ticks.is_some_and(|cap| runtime.ticks() >= cap) {
                break EpisodeEnd::TickCap;
            }
            if let Some(pacer) = pacer.as_mut() {
                pacer.wait();
            }
            if runtime.tick() == TickOutcome::Extinct {
                break EpisodeEnd::Extinct;
            }
            if observer(&runtime.snapshot()).is_break() {
                break EpisodeEnd::Aborted;
            }
        };

        let score = runtime.score();
        let ticks = runtime.ticks();
        log::info!(
            "Generation {}: {} agents, score {}, {} ticks ({:?})",
            generation,
            population,
            score,
            ticks,
            end
        );

        GenerationReport {
            generation,
            fitness: runtime.into_fitness(),
            score,
            ticks,
            end,
        }
    }
}

/// Run a single episode with the given configuration and return fitness in input order.
///
/// An empty batch yields an empty report; an invalid configuration is an error.
pub fn run_episode<D: DecisionFunction>(
    config: &SimConfig,
    deciders: impl IntoIterator<Item = D>,
) -> Result<Vec<f32>, ConfigError> {
    let evaluator = GenerationEvaluator::new(config.clone())?;
    Ok(evaluator.run_episode(deciders, 0).fitness)
}
