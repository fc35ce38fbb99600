//! Genome-to-metrics simulation seam.
//!
//! The optimizer has no model of the field. It asks a [`MetricsSimulator`]
//! what a strategy would yield and scores the answer.

use rand::Rng;
use rand::rngs::StdRng;

use crate::schema::{FieldState, Genome, StrategyMetrics};

/// Produces simulated outcome metrics for a strategy on a field.
///
/// Called once per individual per generation, possibly from several rayon
/// workers at once. Each call receives its own seeded RNG.
pub trait MetricsSimulator: Sync {
    fn simulate(&self, genome: &Genome, field: &FieldState, rng: &mut StdRng) -> StrategyMetrics;
}

impl<F> MetricsSimulator for F
where
    F: Fn(&Genome, &FieldState, &mut StdRng) -> StrategyMetrics + Sync,
{
    fn simulate(&self, genome: &Genome, field: &FieldState, rng: &mut StdRng) -> StrategyMetrics {
        self(genome, field, rng)
    }
}

/// Placeholder simulator that ignores the genome.
///
/// Revenue, ROI and biodiversity pressure are uniform on [0, 1), the soil
/// delta is uniform on [-0.02, 0.08), and `sri_t` is the field's index.
#[derive(Debug, Clone, Copy, Default)]
pub struct StochasticSimulator;

impl MetricsSimulator for StochasticSimulator {
    fn simulate(&self, _genome: &Genome, field: &FieldState, rng: &mut StdRng) -> StrategyMetrics {
        StrategyMetrics {
            revenue: rng.r#gen(),
            roi: rng.r#gen(),
            delta_sri: rng.r#gen::<f64>() * 0.1 - 0.02,
            bps: rng.r#gen(),
            sri_t: field.sri,
        }
    }
}
