//! Contract-aware objective and constraint evaluation.
//!
//! Maps a strategy's simulated metrics into two maximized objectives
//! (efficiency, regeneration) and a non-negative constraint violation.

use crate::schema::{ContractType, ObjectiveVector, StrategyMetrics};

/// Regeneration weight for seasonal contracts.
pub const SEASONAL_REGEN_WEIGHT: f64 = 0.2;
/// Regeneration weight for multi-year advisory contracts.
pub const ADVISORY_REGEN_WEIGHT: f64 = 0.4;

/// Biodiversity pressure above this line is always penalized.
pub const BPS_LIMIT: f64 = 0.8;

/// Below this soil index a managed contract is in the emergency tier.
const MANAGED_EMERGENCY_SRI: f64 = 0.4;
/// Below this soil index a managed contract is in the recovery tier.
const MANAGED_RECOVERY_SRI: f64 = 0.6;

const MANAGED_EMERGENCY_WEIGHT: f64 = 1.0;
const MANAGED_RECOVERY_WEIGHT: f64 = 0.8;
const MANAGED_STANDARD_WEIGHT: f64 = 0.6;

/// Managed contracts require soil improvement below this index.
const MANAGED_GUARD_SRI: f64 = MANAGED_RECOVERY_SRI;
/// Minimum improvement the managed hard guard asks for.
const MANAGED_MIN_DELTA: f64 = 0.01;

const SOFT_GUARD_SRI: f64 = 0.3;
const SOFT_GUARD_DELTA: f64 = -0.1;
/// Marks an individual as sub-optimal without making it meaningfully infeasible.
const SOFT_GUARD_PENALTY: f64 = 0.001;

/// Weight given to the regeneration objective under a contract.
///
/// Only managed regenerative contracts let regeneration fully dominate; the
/// weight then steps up as the current soil index drops.
pub fn regeneration_weight(metrics: &StrategyMetrics, contract: ContractType) -> f64 {
    match contract {
        ContractType::SeasonalOptimization => SEASONAL_REGEN_WEIGHT,
        ContractType::MultiYearAdvisory => ADVISORY_REGEN_WEIGHT,
        ContractType::ManagedRegenerative => {
            if metrics.sri_t < MANAGED_EMERGENCY_SRI {
                MANAGED_EMERGENCY_WEIGHT
            } else if metrics.sri_t < MANAGED_RECOVERY_SRI {
                MANAGED_RECOVERY_WEIGHT
            } else {
                MANAGED_STANDARD_WEIGHT
            }
        }
    }
}

/// Weighted objective values `[efficiency, regeneration]`, both maximized.
pub fn evaluate(metrics: &StrategyMetrics, contract: ContractType) -> Vec<f64> {
    let w_regen = regeneration_weight(metrics, contract);
    let w_eff = 1.0 - w_regen;

    let efficiency = metrics.revenue + metrics.roi;
    let regeneration = metrics.delta_sri + (1.0 - metrics.bps);

    vec![efficiency * w_eff, regeneration * w_regen]
}

/// Constraint violation for a strategy. Always >= 0; zero means feasible.
///
/// The managed hard guard grows without bound as `delta_sri` falls and is
/// intentionally not capped.
pub fn calculate_cv(metrics: &StrategyMetrics, contract: ContractType) -> f64 {
    let mut cv = 0.0;

    if metrics.bps > BPS_LIMIT {
        cv += metrics.bps - BPS_LIMIT;
    }

    match contract {
        ContractType::ManagedRegenerative => {
            if metrics.sri_t < MANAGED_GUARD_SRI && metrics.delta_sri <= 0.0 {
                cv += MANAGED_MIN_DELTA - metrics.delta_sri;
            }
        }
        ContractType::SeasonalOptimization | ContractType::MultiYearAdvisory => {
            if metrics.sri_t < SOFT_GUARD_SRI && metrics.delta_sri <= SOFT_GUARD_DELTA {
                cv += SOFT_GUARD_PENALTY;
            }
        }
    }

    cv
}

/// Full objective vector (values and constraint violation) for a strategy.
pub fn score(metrics: &StrategyMetrics, contract: ContractType) -> ObjectiveVector {
    ObjectiveVector::new(evaluate(metrics, contract), calculate_cv(metrics, contract))
}
