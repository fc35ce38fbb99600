//! Genome manipulation utilities for evolutionary search.
//!
//! Provides seeded random generation, arithmetic crossover, and mutation.

use rand::prelude::*;

use crate::schema::{FieldState, GeneBounds, Genome};

/// Random number generator wrapper for genome operations.
#[derive(Debug)]
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create from an optional seed, falling back to entropy.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::random, Self::new)
    }

    /// Generate a random genome spanning the field's parameter space.
    pub fn random_genome(&mut self, field: &FieldState) -> Genome {
        field
            .genes
            .iter()
            .map(|bounds| (bounds.name.clone(), self.uniform(bounds)))
            .collect()
    }

    /// Uniform random in bounds.
    fn uniform(&mut self, bounds: &GeneBounds) -> f64 {
        let t = self.rng.r#gen::<f64>();
        unit_clamp(bounds.clamp(bounds.min + t * bounds.width()))
    }

    /// Gaussian mutation: add noise scaled by the bound width.
    pub fn gaussian_mutate(&mut self, value: f64, strength: f64, bounds: &GeneBounds) -> f64 {
        let noise: f64 = self.rng.sample(rand_distr::StandardNormal);
        let mutated = value + noise * strength * bounds.width();
        unit_clamp(bounds.clamp(mutated))
    }

    /// Mutate each gene independently with probability `rate`.
    ///
    /// Genes the field does not declare are bounded to [0, 1].
    pub fn mutate(&mut self, genome: &mut Genome, rate: f64, strength: f64, field: &FieldState) {
        for (name, value) in genome.genes.iter_mut() {
            if self.rng.r#gen::<f64>() < rate {
                let bounds = field
                    .bounds(name)
                    .cloned()
                    .unwrap_or_else(|| GeneBounds::unit(name.as_str()));
                *value = self.gaussian_mutate(*value, strength, &bounds);
            }
        }
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}

/// Arithmetic crossover: every gene of the child is the parents' mean.
///
/// Genomes are expected to share one key set. A gene missing from
/// `parent2` is inherited from `parent1` unchanged.
pub fn crossover(parent1: &Genome, parent2: &Genome) -> Genome {
    parent1
        .genes
        .iter()
        .map(|(name, &a)| {
            let value = match parent2.get(name) {
                Some(b) => (a + b) / 2.0,
                None => a,
            };
            (name.clone(), value)
        })
        .collect()
}

fn unit_clamp(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
