//! Compute module - Objective evaluation, Pareto ranking and the
//! generational search loop.
//!
//! # Overview
//!
//! - **Objectives** (`objectives`): contract-aware objective vector and constraint violation
//! - **Ranking** (`ranking`): constraint dominance, non-dominated sorting, crowding distance
//! - **Genome Operations** (`genome`): seeded initialization, crossover, and mutation
//! - **Simulation** (`simulator`): the genome-to-metrics seam
//! - **Search** (`search`): elitist NSGA-II style coordinator with a soft deadline

pub mod objectives;
pub mod ranking;

mod genome;
mod search;
mod simulator;

pub use genome::{GenomeRng, crossover};
pub use ranking::{
    assign_crowding_distance, crowded_cmp, dominates, fast_non_dominated_sort, pareto_front,
    partition_fronts,
};
pub use search::{EvolutionResult, Individual, evolve, evolve_with_callback, evolve_with_rng};
pub use simulator::{MetricsSimulator, StochasticSimulator};
