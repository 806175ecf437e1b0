//! Sample instances and result checks shared by unit, behaviour and backend
//! tests.

use crate::{InstanceData, SolveResult};

/// Three sites, two slots, threshold 3. Optimum 10 at sites `{0, 2}`.
#[must_use]
pub fn three_site_instance() -> InstanceData {
    build(3, 2, vec![0, 5, 10, 5, 0, 7, 10, 7, 0], vec![0, 3, 3, 0])
}

/// Every threshold meets or exceeds every site distance.
#[must_use]
pub fn infeasible_instance() -> InstanceData {
    build(3, 2, vec![0, 5, 10, 5, 0, 7, 10, 7, 0], vec![0, 10, 10, 0])
}

/// Sites on a line at `0, spacing, 2·spacing, …` with a uniform threshold.
///
/// With `facilities ≤ points` and a threshold below the spread, the optimum
/// is `spacing · ⌊(points − 1) / (facilities − 1)⌋`.
#[must_use]
pub fn line_instance(points: usize, facilities: usize, spacing: i64, threshold: i64) -> InstanceData {
    let offset = |row: usize, col: usize| i64::try_from(row.abs_diff(col)).unwrap_or_default();
    let distances = (0..points)
        .flat_map(|row| (0..points).map(move |col| offset(row, col) * spacing))
        .collect();
    let thresholds = (0..facilities)
        .flat_map(|row| (0..facilities).map(move |col| if row == col { 0 } else { threshold }))
        .collect();
    build(points, facilities, distances, thresholds)
}

/// Instance from a symmetric distance table given as rows.
#[must_use]
pub fn instance_from_rows(rows: &[&[i64]], thresholds: &[&[i64]]) -> InstanceData {
    build(
        rows.len(),
        thresholds.len(),
        rows.iter().flat_map(|row| row.iter().copied()).collect(),
        thresholds.iter().flat_map(|row| row.iter().copied()).collect(),
    )
}

fn build(points: usize, facilities: usize, distances: Vec<i64>, thresholds: Vec<i64>) -> InstanceData {
    InstanceData::new(points, facilities, distances, thresholds).expect("sample instance is valid")
}

/// Best objective over every assignment, `None` when no assignment satisfies
/// the thresholds.
///
/// Enumerates `points^facilities` assignments; keep instances tiny.
#[must_use]
pub fn brute_force_optimum(instance: &InstanceData, distinct_sites: bool) -> Option<i64> {
    let facilities = instance.facilities();
    let points = instance.points();
    let mut assignment = vec![0usize; facilities];
    let mut best = None;
    loop {
        let distinct = !distinct_sites || all_distinct(&assignment);
        if distinct && satisfies_thresholds(instance, &assignment) {
            let value = instance.min_pair_distance(&assignment);
            best = best.max(value);
        }
        if !advance(&mut assignment, points) {
            return best;
        }
    }
}

fn advance(assignment: &mut [usize], points: usize) -> bool {
    for slot in assignment.iter_mut().rev() {
        *slot += 1;
        if *slot < points {
            return true;
        }
        *slot = 0;
    }
    false
}

fn all_distinct(assignment: &[usize]) -> bool {
    assignment
        .iter()
        .enumerate()
        .all(|(i, site)| !assignment.iter().skip(i + 1).any(|other| other == site))
}

/// Whether every slot pair's distance strictly exceeds its threshold.
#[must_use]
pub fn satisfies_thresholds(instance: &InstanceData, assignment: &[usize]) -> bool {
    crate::slot_pairs(assignment.len()).all(|(first, second)| {
        let (Some(&from), Some(&to)) = (assignment.get(first), assignment.get(second)) else {
            return false;
        };
        match (instance.distance(from, to), instance.threshold(first, second)) {
            (Some(distance), Some(threshold)) => distance > threshold,
            _ => false,
        }
    })
}

/// Checks the invariants every solved result must hold against its instance.
///
/// # Panics
///
/// Panics with a descriptive message on the first violated invariant.
pub fn assert_consistent(instance: &InstanceData, result: &SolveResult) {
    if !result.status.has_solution() {
        assert!(
            result.assignment.is_none() && result.objective.is_none(),
            "{:?} result must not carry a solution",
            result.status
        );
        return;
    }
    let (Some(assignment), Some(objective)) = (&result.assignment, result.objective) else {
        panic!("{:?} result must carry assignment and objective", result.status);
    };
    assert_eq!(assignment.len(), instance.facilities(), "one site per slot");
    assert!(
        assignment.iter().all(|&site| site < instance.points()),
        "sites out of range: {assignment:?}"
    );
    assert!(
        satisfies_thresholds(instance, assignment),
        "assignment {assignment:?} violates a separation threshold"
    );
    assert_eq!(
        instance.min_pair_distance(assignment),
        Some(objective),
        "objective must equal the minimum pair distance"
    );
}
