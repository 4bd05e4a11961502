//! Feed-forward decision network
//!
//! Three inputs, one tanh output. The topology is fixed; only the weights
//! and bias evolve.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::{DecisionFunction, Observation};

/// Number of observation inputs
pub const INPUTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    pub weights: [f32; INPUTS],
    pub bias: f32,
}

impl Default for Brain {
    fn default() -> Self {
        Self {
            weights: [0.0; INPUTS],
            bias: 0.0,
        }
    }
}

impl Brain {
    pub fn new(weights: [f32; INPUTS], bias: f32) -> Self {
        Self { weights, bias }
    }

    /// Random brain with every gene drawn from `[-scale, scale]`
    pub fn random<R: Rng>(rng: &mut R, scale: f32) -> Self {
        let mut brain = Self::default();
        for gene in brain.genes_mut() {
            *gene = rng.random_range(-scale..=scale);
        }
        brain
    }

    /// Forward pass
    #[inline]
    pub fn think(&self, inputs: [f32; INPUTS]) -> f32 {
        let sum: f32 = self
            .weights
            .iter()
            .zip(inputs)
            .map(|(w, x)| w * x)
            .sum();
        (sum + self.bias).tanh()
    }

    fn genes_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.weights.iter_mut().chain(std::iter::once(&mut self.bias))
    }

    /// Mutate genes in place.
    ///
    /// Each gene is independently perturbed with probability `rate` by up to
    /// `power`, or with probability `replace_rate` redrawn from `[-init_range, init_range]`.
    pub fn mutate<R: Rng>(
        &mut self,
        rng: &mut R,
        rate: f32,
        power: f32,
        replace_rate: f32,
        init_range: f32,
    ) {
        for gene in self.genes_mut() {
            let roll: f32 = rng.random();
            if roll < replace_rate {
                *gene = rng.random_range(-init_range..=init_range);
            } else if roll < replace_rate + rate {
                *gene += rng.random_range(-power..=power);
            }
        }
    }

    /// Uniform crossover: each gene comes from either parent with equal probability
    pub fn crossover<R: Rng>(parent_a: &Brain, parent_b: &Brain, rng: &mut R) -> Brain {
        let mut child = *parent_a;
        for (i, w) in child.weights.iter_mut().enumerate() {
            if rng.random_bool(0.5) {
                *w = parent_b.weights[i];
            }
        }
        if rng.random_bool(0.5) {
            child.bias = parent_b.bias;
        }
        child
    }
}

impl DecisionFunction for Brain {
    fn activate(&mut self, observation: Observation) -> f32 {
        self.think(observation.to_array())
    }
}
