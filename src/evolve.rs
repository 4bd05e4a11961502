//! Generational trainer
//!
//! Evolves a population of [`Brain`]s against the simulation:
//! - Evaluate a whole generation in one episode
//! - Record statistics and the hall of fame
//! - Stop once the best fitness reaches the threshold
//! - Breed the next generation with elitism, tournament selection,
//!   uniform crossover and mutation

use std::ops::ControlFlow;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::brain::Brain;
use crate::config::{ConfigError, EvolutionConfig};
use crate::evaluator::{EpisodeEnd, GenerationEvaluator, GenerationReport};
use crate::halloffame::{HallOfFame, HallOfFameEntry};
use crate::sim::Snapshot;

/// Per-generation statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub best: f32,
    pub mean: f32,
    pub stdev: f32,
    pub score: u32,
    pub ticks: u64,
    pub end: EpisodeEnd,
}

impl From<&GenerationReport> for GenerationStats {
    fn from(report: &GenerationReport) -> Self {
        Self {
            generation: report.generation,
            best: report.best().map_or(0.0, |(_, f)| f),
            mean: report.mean(),
            stdev: report.stdev(),
            score: report.score,
            ticks: report.ticks,
            end: report.end,
        }
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub generations_run: u32,
    pub reached_threshold: bool,
    pub aborted: bool,
    pub best: Option<HallOfFameEntry>,
    pub history: Vec<GenerationStats>,
}

#[derive(Debug)]
pub struct Trainer {
    config: EvolutionConfig,
    rng: Pcg32,
    population: Vec<Brain>,
    generation: u32,
    hall_of_fame: HallOfFame,
}

impl Trainer {
    pub fn new(config: EvolutionConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let population = (0..config.population_size)
            .map(|_| Brain::random(&mut rng, config.init_range))
            .collect();
        Ok(Self {
            config,
            rng,
            population,
            generation: 0,
            hall_of_fame: HallOfFame::new(),
        })
    }

    pub fn population(&self) -> &[Brain] {
        &self.population
    }

    /// Generation that the next call to `step` will evaluate
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    /// Evaluate the current generation and breed the next one
    pub fn step(&mut self, evaluator: &GenerationEvaluator) -> GenerationReport {
        self.step_with(evaluator, |_| ControlFlow::Continue(()))
    }

    pub fn step_with<F>(&mut self, evaluator: &GenerationEvaluator, observer: F) -> GenerationReport
    where
        F: FnMut(&Snapshot) -> ControlFlow<()>,
    {
        let brains = self.population.iter().copied();
        let cap = episode_cap(evaluator.max_ticks(), self.config.max_ticks);
        let report = if cap == evaluator.max_ticks() {
            evaluator.run_episode_with(brains, self.generation, observer)
        } else {
            evaluator
                .clone()
                .with_max_ticks(cap)
                .run_episode_with(brains, self.generation, observer)
        };

        for (brain, &fitness) in self.population.iter().zip(&report.fitness) {
            if let Some(rank) = self.hall_of_fame.add(fitness, self.generation, *brain) {
                log::debug!("Generation {}: hall of fame rank {} ({:.2})", self.generation, rank, fitness);
            }
        }

        self.population = self.breed(&report.fitness);
        self.generation += 1;
        report
    }

    /// Train until the generation limit, the fitness threshold or an abort
    pub fn run(&mut self, evaluator: &GenerationEvaluator) -> TrainingSummary {
        self.run_with(evaluator, |_| ControlFlow::Continue(()))
    }

    pub fn run_with<F>(&mut self, evaluator: &GenerationEvaluator, mut observer: F) -> TrainingSummary
    where
        F: FnMut(&Snapshot) -> ControlFlow<()>,
    {
        let mut history = Vec::new();
        let mut reached_threshold = false;
        let mut aborted = false;

        for _ in 0..self.config.generations {
            let report = self.step_with(evaluator, &mut observer);
            let stats = GenerationStats::from(&report);
            log::info!(
                "Generation {} stats: best {:.2}, mean {:.2}, stdev {:.2}",
                stats.generation,
                stats.best,
                stats.mean,
                stats.stdev
            );
            history.push(stats);

            if report.end == EpisodeEnd::Aborted {
                aborted = true;
                break;
            }
            if report.best().is_some_and(|(_, f)| f >= self.config.fitness_threshold) {
                log::info!(
                    "Fitness threshold {} reached in generation {}",
                    self.config.fitness_threshold,
                    report.generation
                );
                reached_threshold = true;
                break;
            }
        }

        TrainingSummary {
            generations_run: history.len() as u32,
            reached_threshold,
            aborted,
            best: self.hall_of_fame.best().cloned(),
            history,
        }
    }

    fn breed(&mut self, fitness: &[f32]) -> Vec<Brain> {
        let size = self.config.population_size;
        let mut ranked: Vec<usize> = (0..self.population.len()).collect();
        ranked.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

        let mut next: Vec<Brain> = ranked
            .iter()
            .take(self.config.elitism)
            .map(|&i| self.population[i])
            .collect();

        while next.len() < size {
            let a = self.tournament(fitness);
            let b = self.tournament(fitness);
            let mut child = Brain::crossover(&self.population[a], &self.population[b], &mut self.rng);
            child.mutate(
                &mut self.rng,
                self.config.mutation_rate,
                self.config.mutation_power,
                self.config.replace_rate,
                self.config.init_range,
            );
            next.push(child);
        }
        next
    }

    /// Best of `tournament_size` random picks (with replacement)
    fn tournament(&mut self, fitness: &[f32]) -> usize {
        let n = self.population.len();
        let mut winner = self.rng.random_range(0..n);
        for _ in 1..self.config.tournament_size {
            let challenger = self.rng.random_range(0..n);
            if fitness[challenger] > fitness[winner] {
                winner = challenger;
            }
        }
        winner
    }
}

/// The tighter of the evaluator's and the trainer's tick caps
fn episode_cap(evaluator: Option<u64>, trainer: Option<u64>) -> Option<u64> {
    match (evaluator, trainer) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
