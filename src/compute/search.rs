//! Generational NSGA-II style search over management strategies.

use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{
    ContractType, EvolutionConfig, EvolutionProgress, EvolutionStats, FieldState, Genome,
    ObjectiveVector, StopReason,
};

use super::genome::{GenomeRng, crossover};
use super::objectives;
use super::ranking::{
    assign_crowding_distance, crowded_cmp, fast_non_dominated_sort, partition_fronts,
};
use super::simulator::MetricsSimulator;

/// A candidate strategy in the population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    /// Unique identifier within a run.
    pub id: u64,
    /// Strategy parameters.
    pub genome: Genome,
    /// Objective values and constraint violation.
    pub objectives: ObjectiveVector,
    /// Pareto rank (1 = non-dominated), set by ranking.
    pub rank: Option<usize>,
    /// Crowding distance within the individual's front.
    ///
    /// Infinite distances serialize to JSON `null`.
    pub crowding_distance: Option<f64>,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
}

impl Individual {
    /// Fresh, unevaluated individual.
    pub fn new(id: u64, genome: Genome, generation: usize) -> Self {
        Self {
            id,
            genome,
            objectives: ObjectiveVector::default(),
            rank: None,
            crowding_distance: None,
            generation,
            parents: Vec::new(),
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.objectives.is_feasible()
    }

    /// Objective `m`, or 0.0 if the vector is shorter.
    pub fn objective(&self, m: usize) -> f64 {
        self.objectives.values.get(m).copied().unwrap_or(0.0)
    }

    /// Crowding distance, 0.0 when unassigned.
    pub fn crowding(&self) -> f64 {
        self.crowding_distance.unwrap_or(0.0)
    }

    /// Rank for ordering; unranked individuals sort last.
    pub(crate) fn rank_key(&self) -> usize {
        self.rank.unwrap_or(usize::MAX)
    }
}

/// Final population and run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    pub population: Vec<Individual>,
    pub stats: EvolutionStats,
}

/// Evolve a population of strategies for a field under a contract.
///
/// Seeds from `config.random_seed` (or entropy) and returns the final
/// population. See [`evolve_with_rng`] for the loop itself.
pub fn evolve<S: MetricsSimulator>(
    field: &FieldState,
    contract: ContractType,
    config: &EvolutionConfig,
    simulator: &S,
) -> Vec<Individual> {
    evolve_with_callback(field, contract, config, simulator, |_| {}).population
}

/// Like [`evolve`], reporting progress after every generation.
pub fn evolve_with_callback<S, F>(
    field: &FieldState,
    contract: ContractType,
    config: &EvolutionConfig,
    simulator: &S,
    callback: F,
) -> EvolutionResult
where
    S: MetricsSimulator,
    F: FnMut(&EvolutionProgress),
{
    let mut rng = GenomeRng::from_seed(config.random_seed);
    evolve_with_rng(field, contract, config, simulator, &mut rng, callback)
}

/// Run the generational loop with an explicit random source.
///
/// Each generation evaluates, ranks, keeps the best `population_size`
/// individuals by front and crowding distance, then breeds a full set of
/// offspring (except on the last generation, which returns the elite set).
///
/// The deadline is checked only between generations. When it fires before
/// the last generation the returned population is freshly bred offspring
/// that has not been evaluated; `stats.evaluated` is false and their
/// objectives and ranks are unset.
pub fn evolve_with_rng<S, F>(
    field: &FieldState,
    contract: ContractType,
    config: &EvolutionConfig,
    simulator: &S,
    rng: &mut GenomeRng,
    mut callback: F,
) -> EvolutionResult
where
    S: MetricsSimulator,
    F: FnMut(&EvolutionProgress),
{
    let start_time = Instant::now();
    let deadline = Duration::from_millis(config.deadline_ms);
    let size = config.population_size;

    info!(
        "Evolving {} strategies over {} generations ({:?}, field '{}')",
        size, config.generations, contract, field.field_id
    );

    let mut next_id = 0u64;
    let mut population = initialize_population(field, size, rng, &mut next_id);
    let mut evaluations = 0u64;
    let mut generations_completed = 0;
    let mut evaluated = false;
    let mut stop_reason = StopReason::Completed;

    for generation in 0..config.generations {
        evaluate_population(
            &mut population,
            field,
            contract,
            simulator,
            rng,
            config.parallel_evaluation,
        );
        evaluations += population.len() as u64;

        let fronts = fast_non_dominated_sort(&mut population);
        let progress = EvolutionProgress {
            generation,
            total_generations: config.generations,
            front_count: fronts.len(),
            first_front_size: fronts.first().map_or(0, Vec::len),
            feasible_count: population.iter().filter(|c| c.is_feasible()).count(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };
        debug!(
            "Generation {}: {} fronts, {} non-dominated, {} feasible",
            generation, progress.front_count, progress.first_front_size, progress.feasible_count
        );

        let elite = select_elite(partition_fronts(population, &fronts), size);
        callback(&progress);

        let is_final = generation + 1 == config.generations;
        population = if is_final {
            evaluated = true;
            elite
        } else {
            evaluated = false;
            generate_offspring(&elite, size, generation + 1, field, config, rng, &mut next_id)
        };
        generations_completed = generation + 1;

        let elapsed = start_time.elapsed();
        if elapsed > deadline {
            warn!(
                "SLA deadline of {}ms exceeded after generation {} ({}ms); \
                 returning current population",
                config.deadline_ms,
                generation,
                elapsed.as_millis()
            );
            if !is_final {
                stop_reason = StopReason::DeadlineExceeded;
            }
            break;
        }

        if config.yield_interval > 0 && generation % config.yield_interval == 0 {
            trace!("Yielding after generation {}", generation);
            std::thread::yield_now();
        }
    }

    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    info!(
        "Evolution finished: {:?} after {} generations in {}ms",
        stop_reason, generations_completed, elapsed_ms
    );

    EvolutionResult {
        population,
        stats: EvolutionStats {
            generations_completed,
            evaluations,
            elapsed_ms,
            stop_reason,
            evaluated,
        },
    }
}

/// Random initial population spanning the field's genome space.
fn initialize_population(
    field: &FieldState,
    size: usize,
    rng: &mut GenomeRng,
    next_id: &mut u64,
) -> Vec<Individual> {
    let mut population = Vec::with_capacity(size);
    for _ in 0..size {
        let genome = rng.random_genome(field);
        population.push(Individual::new(*next_id, genome, 0));
        *next_id += 1;
    }
    population
}

/// Simulate and score every individual.
///
/// Child seeds are drawn up front so results do not depend on how rayon
/// schedules the work.
fn evaluate_population<S: MetricsSimulator>(
    population: &mut [Individual],
    field: &FieldState,
    contract: ContractType,
    simulator: &S,
    rng: &mut GenomeRng,
    parallel: bool,
) {
    let seeds: Vec<u64> = population.iter().map(|_| rng.next_seed()).collect();

    let evaluate = |(candidate, seed): (&mut Individual, &u64)| {
        let mut local = StdRng::seed_from_u64(*seed);
        let metrics = simulator.simulate(&candidate.genome, field, &mut local);
        candidate.objectives = objectives::score(&metrics, contract);
    };

    if parallel {
        population
            .par_iter_mut()
            .zip(seeds.par_iter())
            .for_each(evaluate);
    } else {
        population.iter_mut().zip(seeds.iter()).for_each(evaluate);
    }
}

/// Elitist front filling.
///
/// Whole fronts are taken in rank order while they fit; the first front that
/// overflows contributes its most spread-out members until exactly `size`
/// individuals are selected.
fn select_elite(fronts: Vec<Vec<Individual>>, size: usize) -> Vec<Individual> {
    let mut selected = Vec::with_capacity(size);

    for mut front in fronts {
        if selected.len() >= size {
            break;
        }

        assign_crowding_distance(&mut front);

        if selected.len() + front.len() <= size {
            selected.extend(front);
        } else {
            front.sort_by(crowded_cmp);
            let needed = size - selected.len();
            selected.extend(front.into_iter().take(needed));
        }
    }

    selected
}

/// Breed `size` offspring from the elite set.
fn generate_offspring(
    parents: &[Individual],
    size: usize,
    generation: usize,
    field: &FieldState,
    config: &EvolutionConfig,
    rng: &mut GenomeRng,
    next_id: &mut u64,
) -> Vec<Individual> {
    if parents.is_empty() {
        return Vec::new();
    }

    let mut offspring = Vec::with_capacity(size);
    while offspring.len() < size {
        let p1 = tournament_select(parents, config.tournament_size, rng);
        let p2 = tournament_select(parents, config.tournament_size, rng);

        let mut genome = crossover(&p1.genome, &p2.genome);
        rng.mutate(
            &mut genome,
            config.mutation_rate,
            config.mutation_strength,
            field,
        );

        let mut child = Individual::new(*next_id, genome, generation);
        child.parents = vec![p1.id, p2.id];
        *next_id += 1;
        offspring.push(child);
    }

    offspring
}

/// Tournament selection by rank, then crowding distance.
fn tournament_select<'a>(
    population: &'a [Individual],
    size: usize,
    rng: &mut GenomeRng,
) -> &'a Individual {
    let mut best = &population[rng.index(population.len())];
    for _ in 1..size {
        let candidate = &population[rng.index(population.len())];
        if crowded_cmp(candidate, best).is_lt() {
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::ranking::dominates;
    use crate::compute::simulator::StochasticSimulator;
    use crate::schema::{GeneBounds, StrategyMetrics};

    fn small_config(population_size: usize, generations: usize) -> EvolutionConfig {
        EvolutionConfig {
            population_size,
            generations,
            deadline_ms: 60_000,
            random_seed: Some(42),
            ..Default::default()
        }
    }

    /// Revenue follows `intensity`, regeneration follows `cover`.
    fn linear_simulator(genome: &Genome, field: &FieldState, _: &mut StdRng) -> StrategyMetrics {
        let intensity = genome.get("intensity").unwrap_or(0.0);
        let cover = genome.get("cover").unwrap_or(0.0);
        StrategyMetrics {
            revenue: intensity,
            roi: intensity * 0.5,
            delta_sri: cover * 0.1 - intensity * 0.05,
            bps: intensity * 0.9,
            sri_t: field.sri,
        }
    }

    fn two_gene_field() -> FieldState {
        FieldState {
            field_id: "north-40".into(),
            sri: 0.7,
            genes: vec![GeneBounds::unit("intensity"), GeneBounds::unit("cover")],
        }
    }

    fn ranked(id: u64, rank: usize, crowding: f64) -> Individual {
        let mut c = Individual::new(id, Genome::new(), 0);
        c.rank = Some(rank);
        c.crowding_distance = Some(crowding);
        c
    }

    #[test]
    fn test_population_size_is_stable() {
        for (size, generations) in [(1, 3), (2, 2), (7, 4), (40, 5)] {
            let config = small_config(size, generations);
            let result = evolve_with_callback(
                &FieldState::default(),
                ContractType::SeasonalOptimization,
                &config,
                &StochasticSimulator,
                |_| {},
            );
            assert_eq!(result.population.len(), size);
            assert_eq!(result.stats.generations_completed, generations);
            assert_eq!(result.stats.stop_reason, StopReason::Completed);
            assert!(result.stats.evaluated);
        }
    }

    #[test]
    fn test_final_population_is_ranked() {
        let config = small_config(30, 6);
        let population = evolve(
            &two_gene_field(),
            ContractType::ManagedRegenerative,
            &config,
            &linear_simulator,
        );

        assert!(population.iter().all(|c| c.rank.is_some()));
        assert!(population.iter().all(|c| c.crowding_distance.is_some()));
        assert!(population.iter().any(|c| c.rank == Some(1)));

        for a in population.iter().filter(|c| c.rank == Some(1)) {
            for b in &population {
                assert!(!dominates(&b.objectives, &a.objectives));
            }
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let field = two_gene_field();
        let config = small_config(25, 4);

        let a = evolve(&field, ContractType::MultiYearAdvisory, &config, &linear_simulator);
        let b = evolve(&field, ContractType::MultiYearAdvisory, &config, &linear_simulator);

        let genomes = |p: &[Individual]| p.iter().map(|c| c.genome.clone()).collect::<Vec<_>>();
        assert_eq!(genomes(&a), genomes(&b));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let field = FieldState::default();
        let parallel = small_config(20, 3);
        let sequential = EvolutionConfig {
            parallel_evaluation: false,
            ..parallel.clone()
        };

        let contract = ContractType::SeasonalOptimization;
        let a = evolve(&field, contract, &parallel, &StochasticSimulator);
        let b = evolve(&field, contract, &sequential, &StochasticSimulator);

        let objectives = |p: &[Individual]| {
            p.iter().map(|c| c.objectives.clone()).collect::<Vec<_>>()
        };
        assert_eq!(objectives(&a), objectives(&b));
    }

    #[test]
    fn test_deadline_returns_unevaluated_offspring() {
        let slow = |_: &Genome, field: &FieldState, _: &mut StdRng| {
            std::thread::sleep(Duration::from_millis(2));
            StrategyMetrics {
                sri_t: field.sri,
                ..Default::default()
            }
        };
        let config = EvolutionConfig {
            deadline_ms: 1,
            parallel_evaluation: false,
            ..small_config(4, 10)
        };

        let result = evolve_with_callback(
            &FieldState::default(),
            ContractType::SeasonalOptimization,
            &config,
            &slow,
            |_| {},
        );

        assert_eq!(result.stats.stop_reason, StopReason::DeadlineExceeded);
        assert_eq!(result.stats.generations_completed, 1);
        assert!(!result.stats.evaluated);
        assert_eq!(result.population.len(), 4);
        assert!(result.population.iter().all(|c| c.rank.is_none()));
        assert!(result.population.iter().all(|c| c.generation == 1));
    }

    #[test]
    fn test_deadline_on_final_generation_keeps_elite() {
        let slow = |_: &Genome, field: &FieldState, _: &mut StdRng| {
            std::thread::sleep(Duration::from_millis(2));
            StrategyMetrics {
                sri_t: field.sri,
                ..Default::default()
            }
        };
        let config = EvolutionConfig {
            deadline_ms: 1,
            parallel_evaluation: false,
            ..small_config(4, 1)
        };

        let result = evolve_with_callback(
            &FieldState::default(),
            ContractType::SeasonalOptimization,
            &config,
            &slow,
            |_| {},
        );

        assert_eq!(result.stats.stop_reason, StopReason::Completed);
        assert_eq!(result.stats.generations_completed, 1);
        assert!(result.stats.evaluated);
        assert_eq!(result.population.len(), 4);
        assert!(result.population.iter().all(|c| c.rank.is_some()));
    }

    #[test]
    fn test_yield_interval_does_not_change_population() {
        for yield_interval in [0, 1] {
            let config = EvolutionConfig {
                yield_interval,
                ..small_config(8, 4)
            };
            let result = evolve_with_callback(
                &two_gene_field(),
                ContractType::MultiYearAdvisory,
                &config,
                &linear_simulator,
                |_| {},
            );
            assert_eq!(result.population.len(), 8, "yield_interval = {yield_interval}");
            assert_eq!(result.stats.generations_completed, 4);
            assert_eq!(result.stats.stop_reason, StopReason::Completed);
        }
    }

    #[test]
    fn test_callback_sees_every_generation() {
        let mut seen = Vec::new();
        let config = small_config(12, 5);
        evolve_with_callback(
            &FieldState::default(),
            ContractType::SeasonalOptimization,
            &config,
            &StochasticSimulator,
            |p| seen.push((p.generation, p.total_generations)),
        );
        assert_eq!(seen, vec![(0, 5), (1, 5), (2, 5), (3, 5), (4, 5)]);
    }

    #[test]
    fn test_empty_population() {
        let config = small_config(0, 3);
        let result = evolve_with_callback(
            &FieldState::default(),
            ContractType::SeasonalOptimization,
            &config,
            &StochasticSimulator,
            |_| {},
        );
        assert!(result.population.is_empty());
    }

    #[test]
    fn test_placeholder_genomes_evolve() {
        let field = FieldState {
            genes: Vec::new(),
            ..Default::default()
        };
        let population = evolve(
            &field,
            ContractType::SeasonalOptimization,
            &small_config(10, 3),
            &StochasticSimulator,
        );
        assert_eq!(population.len(), 10);
        assert!(population.iter().all(|c| c.genome.is_empty()));
    }

    #[test]
    fn test_select_elite_truncates_by_crowding() {
        let mut front1 = vec![ranked(0, 1, 0.0), ranked(1, 1, 0.0)];
        for c in &mut front1 {
            c.objectives = ObjectiveVector::new(vec![c.id as f64, 1.0 - c.id as f64], 0.0);
        }
        let mut front2: Vec<Individual> = (2..6).map(|id| ranked(id, 2, 0.0)).collect();
        for (i, c) in front2.iter_mut().enumerate() {
            let x = [0.0, 0.1, 0.9, 1.0][i];
            c.objectives = ObjectiveVector::new(vec![x, -x], 0.5);
        }

        let selected = select_elite(vec![front1, front2], 4);
        let mut ids: Vec<u64> = selected.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        // Both boundary members of the second front survive.
        assert_eq!(ids, vec![0, 1, 2, 5]);
    }

    #[test]
    fn test_select_elite_exact_fit() {
        let fronts = vec![
            vec![ranked(0, 1, 0.0), ranked(1, 1, 0.0)],
            vec![ranked(2, 2, 0.0)],
            vec![ranked(3, 3, 0.0)],
        ];
        let selected = select_elite(fronts, 3);
        assert_eq!(selected.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_tournament_prefers_rank_then_crowding() {
        let pool = vec![ranked(0, 2, f64::INFINITY), ranked(1, 1, 0.5)];
        let mut rng = GenomeRng::new(9);
        // Large tournaments see both members with overwhelming probability.
        for _ in 0..20 {
            assert_eq!(tournament_select(&pool, 16, &mut rng).id, 1);
        }

        let pool = vec![ranked(0, 1, 0.2), ranked(1, 1, 3.0)];
        for _ in 0..20 {
            assert_eq!(tournament_select(&pool, 16, &mut rng).id, 1);
        }
    }

    #[test]
    fn test_offspring_lineage() {
        let parents = vec![ranked(10, 1, 1.0), ranked(11, 1, 1.0)];
        let mut rng = GenomeRng::new(5);
        let mut next_id = 100;
        let config = EvolutionConfig::default();

        let children = generate_offspring(
            &parents,
            6,
            3,
            &FieldState::default(),
            &config,
            &mut rng,
            &mut next_id,
        );

        assert_eq!(children.len(), 6);
        assert_eq!(next_id, 106);
        for child in &children {
            assert_eq!(child.generation, 3);
            assert_eq!(child.parents.len(), 2);
            assert!(child.parents.iter().all(|p| *p == 10 || *p == 11));
            assert!(child.rank.is_none());
        }
    }
}
