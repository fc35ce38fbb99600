//! Pareto ranking: constraint dominance, fast non-dominated sorting and
//! crowding distance.

use std::cmp::Ordering;

use crate::schema::ObjectiveVector;

use super::search::Individual;

/// Constraint-dominance test.
///
/// Lower constraint violation always wins. With equal violation, `a`
/// dominates `b` when it is no worse on every objective (maximized) and
/// strictly better on at least one.
pub fn dominates(a: &ObjectiveVector, b: &ObjectiveVector) -> bool {
    if a.constraint_violation < b.constraint_violation {
        return true;
    }
    if a.constraint_violation > b.constraint_violation {
        return false;
    }

    let mut strictly_better = false;
    for (x, y) in a.values.iter().zip(&b.values) {
        if x < y {
            return false;
        }
        if x > y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Partition a population into Pareto fronts.
///
/// Assigns `rank` (1-based) to every individual and returns the fronts as
/// index lists into `population`, best front first. O(M * N^2).
pub fn fast_non_dominated_sort(population: &mut [Individual]) -> Vec<Vec<usize>> {
    let n = population.len();
    let mut dominated_set: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&population[i].objectives, &population[j].objectives);
            if dominates(a, b) {
                dominated_set[i].push(j);
                domination_count[j] += 1;
            } else if dominates(b, a) {
                dominated_set[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current.is_empty() {
        let rank = fronts.len() + 1;
        let mut next = Vec::new();
        for &p in &current {
            population[p].rank = Some(rank);
            for &q in &dominated_set[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        fronts.push(current);
        current = next;
    }

    fronts
}

/// Move individuals out of `population` into owned fronts.
///
/// `fronts` must be the index lists returned by [`fast_non_dominated_sort`]
/// for this population.
pub fn partition_fronts(
    population: Vec<Individual>,
    fronts: &[Vec<usize>],
) -> Vec<Vec<Individual>> {
    let mut slots: Vec<Option<Individual>> = population.into_iter().map(Some).collect();
    fronts
        .iter()
        .map(|front| {
            front
                .iter()
                .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Assign crowding distance to every member of a front.
///
/// Sorts `front` in place once per objective; callers must not rely on its
/// order afterwards. Fronts of one or two members get infinite distance.
/// Objectives with zero range contribute nothing beyond their boundary
/// members.
pub fn assign_crowding_distance(front: &mut [Individual]) {
    let n = front.len();
    if n <= 2 {
        for individual in front.iter_mut() {
            individual.crowding_distance = Some(f64::INFINITY);
        }
        return;
    }

    for individual in front.iter_mut() {
        individual.crowding_distance = Some(0.0);
    }

    let arity = front
        .iter()
        .map(|c| c.objectives.values.len())
        .max()
        .unwrap_or(0);

    for m in 0..arity {
        front.sort_by(|a, b| a.objective(m).total_cmp(&b.objective(m)));

        front[0].crowding_distance = Some(f64::INFINITY);
        front[n - 1].crowding_distance = Some(f64::INFINITY);

        let range = front[n - 1].objective(m) - front[0].objective(m);
        if range == 0.0 {
            continue;
        }

        for k in 1..n - 1 {
            let gap = (front[k + 1].objective(m) - front[k - 1].objective(m)) / range;
            front[k].crowding_distance = Some(front[k].crowding() + gap);
        }
    }
}

/// Crowded-comparison order: lower rank first, then larger crowding distance.
pub fn crowded_cmp(a: &Individual, b: &Individual) -> Ordering {
    a.rank_key()
        .cmp(&b.rank_key())
        .then_with(|| b.crowding().total_cmp(&a.crowding()))
}

/// Members of the first front of an already ranked population.
pub fn pareto_front(population: &[Individual]) -> Vec<&Individual> {
    population.iter().filter(|c| c.rank == Some(1)).collect()
}
