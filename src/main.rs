//! Flappy Evo entry point
//!
//! Trains brains against the simulation, replays saved brains and dumps the
//! default configuration.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use flappy_evo::evolve::Trainer;
use flappy_evo::sim::Snapshot;
use flappy_evo::{AppConfig, GenerationEvaluator, HallOfFame};

#[derive(Parser)]
#[command(name = "flappy-evo")]
#[command(about = "Evolve side-scroller controllers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a population of brains
    Train {
        /// Path to config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of generations
        #[arg(long)]
        generations: Option<u32>,

        /// Override the population size
        #[arg(long)]
        population: Option<usize>,

        /// Override the simulation seed
        #[arg(long)]
        seed: Option<u64>,

        /// Run at the configured tick rate instead of flat out
        #[arg(long)]
        realtime: bool,

        /// Write every tick's snapshot as JSON lines
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Save the hall of fame here when training ends
        #[arg(long)]
        save_best: Option<PathBuf>,
    },
    /// Run one episode with a saved brain
    Replay {
        /// Hall of fame file written by `train --save-best`
        #[arg(long)]
        brain: PathBuf,

        /// 1-indexed rank of the brain to replay
        #[arg(long, default_value_t = 1)]
        rank: usize,

        /// Path to config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        realtime: bool,

        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

/// JSON-lines sink for snapshots; remembers the first write error and stops the episode
struct TraceWriter {
    out: BufWriter<File>,
    error: Option<std::io::Error>,
}

impl TraceWriter {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create trace file {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            error: None,
        })
    }

    fn record(&mut self, snapshot: &Snapshot) -> ControlFlow<()> {
        let written = serde_json::to_writer(&mut self.out, snapshot)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"));
        match written {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                self.error = Some(e);
                ControlFlow::Break(())
            }
        }
    }

    fn finish(mut self) -> Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e).context("Failed to write trace");
        }
        self.out.flush().context("Failed to flush trace")
    }
}

fn observe(trace: &mut Option<TraceWriter>, snapshot: &Snapshot) -> ControlFlow<()> {
    match trace {
        Some(writer) => writer.record(snapshot),
        None => ControlFlow::Continue(()),
    }
}

fn finish_trace(trace: Option<TraceWriter>) -> Result<()> {
    trace.map_or(Ok(()), TraceWriter::finish)
}

fn train(
    config: Option<PathBuf>,
    generations: Option<u32>,
    population: Option<usize>,
    seed: Option<u64>,
    realtime: bool,
    trace: Option<PathBuf>,
    save_best: Option<PathBuf>,
) -> Result<()> {
    let mut app = load_config(config.as_deref())?;
    if let Some(generations) = generations {
        app.evolution.generations = generations;
    }
    if let Some(population) = population {
        app.evolution.population_size = population;
    }
    if let Some(seed) = seed {
        app.sim.seed = seed;
    }
    app.validate().context("Invalid configuration")?;

    let evaluator = GenerationEvaluator::new(app.sim.clone())?
        .with_max_ticks(app.evolution.max_ticks)
        .with_realtime(realtime);
    let mut trainer = Trainer::new(app.evolution.clone(), app.sim.seed)?;
    let mut trace = trace.as_deref().map(TraceWriter::create).transpose()?;

    log::info!(
        "Training {} brains for up to {} generations",
        app.evolution.population_size,
        app.evolution.generations
    );
    let summary = trainer.run_with(&evaluator, |snap| observe(&mut trace, snap));
    finish_trace(trace)?;

    match &summary.best {
        Some(best) => println!(
            "Best fitness {:.2} (generation {}) after {} generations{}",
            best.fitness,
            best.generation,
            summary.generations_run,
            if summary.reached_threshold { ", threshold reached" } else { "" }
        ),
        None => println!("No brains evaluated"),
    }

    if let Some(path) = save_best {
        trainer
            .hall_of_fame()
            .save(&path)
            .with_context(|| format!("Failed to save hall of fame {}", path.display()))?;
    }
    Ok(())
}

fn replay(
    brain: PathBuf,
    rank: usize,
    config: Option<PathBuf>,
    realtime: bool,
    trace: Option<PathBuf>,
) -> Result<()> {
    let app = load_config(config.as_deref())?;
    let hall = HallOfFame::load(&brain)
        .with_context(|| format!("Failed to load hall of fame {}", brain.display()))?;
    let Some(entry) = rank.checked_sub(1).and_then(|i| hall.entries.get(i)) else {
        bail!("No brain at rank {} ({} entries)", rank, hall.len());
    };

    let evaluator = GenerationEvaluator::new(app.sim)?
        .with_max_ticks(app.evolution.max_ticks)
        .with_realtime(realtime);
    let mut trace = trace.as_deref().map(TraceWriter::create).transpose()?;
    let report = evaluator.run_episode_with([entry.brain], entry.generation, |snap| {
        observe(&mut trace, snap)
    });
    finish_trace(trace)?;

    println!(
        "Fitness {:.2}, score {}, {} ticks ({:?})",
        report.fitness.first().copied().unwrap_or_default(),
        report.score,
        report.ticks,
        report.end
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            config,
            generations,
            population,
            seed,
            realtime,
            trace,
            save_best,
        } => train(config, generations, population, seed, realtime, trace, save_best),
        Commands::Replay {
            brain,
            rank,
            config,
            realtime,
            trace,
        } => replay(brain, rank, config, realtime, trace),
        Commands::DumpDefaultConfig => {
            let json = AppConfig::default()
                .to_json()
                .context("Failed to serialize default config")?;
            println!("{json}");
            Ok(())
        }
    }
}
