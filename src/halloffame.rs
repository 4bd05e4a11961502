//! Hall of fame
//!
//! The best brains seen across a training run, persisted as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::brain::Brain;
use crate::config::ConfigError;

/// Maximum number of brains to keep
pub const MAX_ENTRIES: usize = 10;

/// A single hall of fame entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallOfFameEntry {
    pub fitness: f32,
    /// Generation the brain was evaluated in
    pub generation: u32,
    pub brain: Brain,
}

/// Top brains, sorted best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HallOfFame {
    pub entries: Vec<HallOfFameEntry>,
}

impl HallOfFame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a fitness value would earn a place
    pub fn qualifies(&self, fitness: f32) -> bool {
        if !fitness.is_finite() {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().is_none_or(|e| fitness > e.fitness)
    }

    /// Rank a fitness value would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, fitness: f32) -> Option<usize> {
        if !self.qualifies(fitness) {
            return None;
        }
        let rank = self.entries.iter().position(|e| fitness > e.fitness);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a brain if it qualifies; returns its rank
    pub fn add(&mut self, fitness: f32, generation: u32, brain: Brain) -> Option<usize> {
        let rank = self.potential_rank(fitness)?;
        self.entries.insert(
            rank - 1,
            HallOfFameEntry {
                fitness,
                generation,
                brain,
            },
        );
        self.entries.truncate(MAX_ENTRIES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn best(&self) -> Option<&HallOfFameEntry> {
        self.entries.first()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let hall: HallOfFame = serde_json::from_str(&json)?;
        log::info!("Loaded {} hall of fame entries", hall.entries.len());
        Ok(hall)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Hall of fame saved ({} entries)", self.entries.len());
        Ok(())
    }
}
