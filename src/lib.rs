//! Regen MOS - Multi-objective strategy search for regenerative field management.
//!
//! Evolves a population of candidate management strategies for a field,
//! trading short-term efficiency against long-term soil and biodiversity
//! regeneration. The balance between the two, and how hard soil health is
//! guarded, depends on the contract under which the field is managed.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Contract, metric, genome and configuration types
//! - `compute`: Objective evaluation, Pareto ranking, and the search loop
//!
//! # Example
//!
//! ```rust,no_run
//! use regen_mos::{
//!     compute::{StochasticSimulator, evolve, pareto_front},
//!     schema::{ContractType, EvolutionConfig, FieldState},
//! };
//!
//! let config = EvolutionConfig {
//!     generations: 20,
//!     population_size: 100,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let population = evolve(
//!     &FieldState::default(),
//!     ContractType::ManagedRegenerative,
//!     &config,
//!     &StochasticSimulator,
//! );
//!
//! for strategy in pareto_front(&population) {
//!     println!("{:?} -> {:?}", strategy.genome, strategy.objectives.values);
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Individual, MetricsSimulator, evolve};
pub use schema::{ContractType, EvolutionConfig, FieldState, StrategyMetrics};
