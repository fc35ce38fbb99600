//! Strategy, contract and field types shared by the optimizer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Commercial contract governing the relationship with the land operator.
///
/// Selects how much weight regeneration receives relative to efficiency and
/// which soil-health guard applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    /// Single-season optimization. Soil health is a bounded penalty term.
    #[default]
    SeasonalOptimization,
    /// Multi-year advisory. Regeneration weight is elevated but bounded.
    MultiYearAdvisory,
    /// Managed regenerative contract. Regeneration weight follows soil state
    /// and a hard soil-safety guard applies.
    ManagedRegenerative,
}

impl ContractType {
    /// All contract types, in declaration order.
    pub const ALL: [ContractType; 3] = [
        ContractType::SeasonalOptimization,
        ContractType::MultiYearAdvisory,
        ContractType::ManagedRegenerative,
    ];
}

/// Simulated outcome of applying a strategy to a field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct StrategyMetrics {
    /// Normalized revenue.
    pub revenue: f64,
    /// Return on investment.
    pub roi: f64,
    /// Change in soil regeneration index.
    pub delta_sri: f64,
    /// Biodiversity pressure score (0 = none, 1 = maximal).
    pub bps: f64,
    /// Current soil regeneration index.
    pub sri_t: f64,
}

/// Objective values (maximized) plus the constraint violation scalar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveVector {
    /// Objective values: `[efficiency, regeneration]`.
    pub values: Vec<f64>,
    /// Constraint violation. Zero means feasible.
    pub constraint_violation: f64,
}

impl ObjectiveVector {
    /// Number of objectives in a run.
    pub const ARITY: usize = 2;

    pub fn new(values: Vec<f64>, constraint_violation: f64) -> Self {
        Self {
            values,
            constraint_violation,
        }
    }

    /// Whether this vector satisfies every constraint.
    pub fn is_feasible(&self) -> bool {
        self.constraint_violation == 0.0
    }
}

impl Default for ObjectiveVector {
    fn default() -> Self {
        Self {
            values: vec![0.0; Self::ARITY],
            constraint_violation: 0.0,
        }
    }
}

/// Flat map of named strategy parameters, each in [0, 1] by convention.
///
/// Keys are ordered so that iteration (and therefore RNG consumption during
/// crossover and mutation) is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Genome {
    pub genes: BTreeMap<String, f64>,
}

impl Genome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.genes.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Genome {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            genes: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Feasible range for a single named gene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneBounds {
    pub name: String,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_gene_max")]
    pub max: f64,
}

impl GeneBounds {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Full unit range.
    pub fn unit(name: impl Into<String>) -> Self {
        Self::new(name, 0.0, 1.0)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp into the bounds. Does not panic on inverted bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

fn default_gene_max() -> f64 {
    1.0
}

/// Field context the search runs against.
///
/// Bounds the genome space and carries the soil state handed to the
/// metrics simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldState {
    /// Identifier of the field.
    #[serde(default)]
    pub field_id: String,
    /// Current soil regeneration index.
    #[serde(default = "default_sri")]
    pub sri: f64,
    /// Genome parameter space.
    #[serde(default = "default_genes")]
    pub genes: Vec<GeneBounds>,
}

impl Default for FieldState {
    fn default() -> Self {
        Self {
            field_id: String::new(),
            sri: default_sri(),
            genes: default_genes(),
        }
    }
}

impl FieldState {
    /// Bounds for a gene, if the field declares it.
    pub fn bounds(&self, name: &str) -> Option<&GeneBounds> {
        self.genes.iter().find(|g| g.name == name)
    }

    /// Validate gene bounds.
    pub fn validate(&self) -> Result<(), FieldStateError> {
        for gene in &self.genes {
            if !(0.0..=1.0).contains(&gene.min) || !(0.0..=1.0).contains(&gene.max) {
                return Err(FieldStateError::BoundsOutsideUnit {
                    name: gene.name.clone(),
                    min: gene.min,
                    max: gene.max,
                });
            }
            if gene.min > gene.max {
                return Err(FieldStateError::InvertedBounds {
                    name: gene.name.clone(),
                    min: gene.min,
                    max: gene.max,
                });
            }
        }
        Ok(())
    }
}

/// Field state validation errors.
#[derive(Debug, thiserror::Error)]
pub enum FieldStateError {
    #[error("Gene {name} bounds [{min}, {max}] lie outside [0, 1]")]
    BoundsOutsideUnit { name: String, min: f64, max: f64 },
    #[error("Gene {name} min ({min}) > max ({max})")]
    InvertedBounds { name: String, min: f64, max: f64 },
}

fn default_sri() -> f64 {
    0.5
}

fn default_genes() -> Vec<GeneBounds> {
    [
        "tillage_intensity",
        "cover_crop_share",
        "nitrogen_rate",
        "rotation_diversity",
        "residue_retention",
    ]
    .into_iter()
    .map(GeneBounds::unit)
    .collect()
}
