//! Configuration and run-report types for the strategy search.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FieldState, FieldStateError};

/// Top-level configuration for an evolutionary strategy search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Generation budget.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Number of individuals kept every generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Mutation probability per gene (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Standard deviation of Gaussian mutation, relative to the gene's range.
    #[serde(default = "default_mutation_strength")]
    pub mutation_strength: f64,
    /// Individuals sampled per tournament.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Soft wall-clock deadline in milliseconds.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Generations between cooperative yields (0 disables yielding).
    #[serde(default = "default_yield_interval")]
    pub yield_interval: usize,
    /// Evaluate individuals on the rayon thread pool.
    #[serde(default = "default_parallel_evaluation")]
    pub parallel_evaluation: bool,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            generations: default_generations(),
            population_size: default_population_size(),
            mutation_rate: default_mutation_rate(),
            mutation_strength: default_mutation_strength(),
            tournament_size: default_tournament_size(),
            deadline_ms: default_deadline_ms(),
            yield_interval: default_yield_interval(),
            parallel_evaluation: default_parallel_evaluation(),
            random_seed: None,
        }
    }
}

fn default_generations() -> usize {
    50
}
fn default_population_size() -> usize {
    500
}
fn default_mutation_rate() -> f64 {
    0.1
}
fn default_mutation_strength() -> f64 {
    0.05
}
fn default_tournament_size() -> usize {
    2
}
fn default_deadline_ms() -> u64 {
    3000
}
fn default_yield_interval() -> usize {
    5
}
fn default_parallel_evaluation() -> bool {
    true
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Progress update emitted after each generation's selection step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Zero-based generation index.
    pub generation: usize,
    /// Total generations planned.
    pub total_generations: usize,
    /// Number of Pareto fronts in this generation.
    pub front_count: usize,
    /// Size of the first (non-dominated) front.
    pub first_front_size: usize,
    /// Individuals with zero constraint violation.
    pub feasible_count: usize,
    /// Milliseconds since the run started.
    pub elapsed_ms: u64,
}

/// Statistics from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations that ran to completion.
    pub generations_completed: usize,
    /// Total simulator calls.
    pub evaluations: u64,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
    /// Whether the returned population carries its own fitness.
    ///
    /// False when the deadline cut the run short after reproduction: the
    /// returned offspring have not been evaluated.
    pub evaluated: bool,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Ran every requested generation.
    Completed,
    /// Soft deadline exceeded.
    DeadlineExceeded,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 1")]
    EmptyPopulation,
    #[error("Generation count must be at least 1")]
    NoGenerations,
    #[error("Mutation rate {0} must lie in [0, 1]")]
    InvalidMutationRate(f64),
    #[error("Mutation strength {0} must be finite and non-negative")]
    InvalidMutationStrength(f64),
    #[error("Tournament size must be at least 1")]
    InvalidTournamentSize,
    #[error("Invalid field state: {0}")]
    InvalidField(#[from] FieldStateError),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        if self.population_size == 0 {
            return Err(EvolutionConfigError::EmptyPopulation);
        }
        if self.generations == 0 {
            return Err(EvolutionConfigError::NoGenerations);
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvolutionConfigError::InvalidMutationRate(self.mutation_rate));
        }
        if !self.mutation_strength.is_finite() || self.mutation_strength < 0.0 {
            return Err(EvolutionConfigError::InvalidMutationStrength(
                self.mutation_strength,
            ));
        }
        if self.tournament_size == 0 {
            return Err(EvolutionConfigError::InvalidTournamentSize);
        }
        Ok(())
    }

    /// Validate this configuration together with the field it will run on.
    pub fn validate_for(&self, field: &FieldState) -> Result<(), EvolutionConfigError> {
        self.validate()?;
        field.validate()?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EvolutionConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::schema::GeneBounds;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generations, 50);
        assert_eq!(config.population_size, 500);
        assert_eq!(config.deadline_ms, 3000);
        assert_eq!(config.yield_interval, 5);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = EvolutionConfig {
            population_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::EmptyPopulation)
        ));

        let config = EvolutionConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidMutationRate(_))
        ));

        let config = EvolutionConfig {
            mutation_strength: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidMutationStrength(_))
        ));
    }

    #[test]
    fn test_validate_for_field() {
        let field = FieldState {
            genes: vec![GeneBounds::new("nitrogen_rate", 0.9, 0.1)],
            ..Default::default()
        };
        let err = EvolutionConfig::default().validate_for(&field);
        assert!(matches!(
            err,
            Err(EvolutionConfigError::InvalidField(
                FieldStateError::InvertedBounds { .. }
            ))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EvolutionConfig =
            serde_json::from_str(r#"{"generations": 10, "random_seed": 7}"#).unwrap();
        assert_eq!(config.generations, 10);
        assert_eq!(config.population_size, 500);
        assert_eq!(config.random_seed, Some(7));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"population_size": 40, "deadline_ms": 100}}"#).unwrap();

        let config = EvolutionConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.population_size, 40);
        assert_eq!(config.deadline_ms, 100);
    }

    #[test]
    fn test_from_json_file_errors() {
        let missing = EvolutionConfig::from_json_file("/nonexistent/regen-mos.json");
        assert!(matches!(missing, Err(EvolutionConfigError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let bad = EvolutionConfig::from_json_file(file.path());
        assert!(matches!(bad, Err(EvolutionConfigError::Parse(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"population_size": 0}}"#).unwrap();
        let invalid = EvolutionConfig::from_json_file(file.path());
        assert!(matches!(invalid, Err(EvolutionConfigError::EmptyPopulation)));
    }
}
