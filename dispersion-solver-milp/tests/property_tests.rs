//! Property-based tests for the mixed-integer solver.
//!
//! Tiny random instances are solved and checked against exhaustive
//! enumeration; the selector encodings grow quickly, so cases stay small.

use dispersion_core::test_support::{assert_consistent, brute_force_optimum, instance_from_rows};
use dispersion_core::{
    InstanceData, ModelOptions, SolveConfig, SolveStatus, Verbosity, solve_instance,
};
use dispersion_solver_milp::MilpSolver;
use proptest::prelude::*;

/// Four sites with random distances and three slots with random thresholds.
fn instance_strategy() -> impl Strategy<Value = InstanceData> {
    let distance = || 1i64..30;
    let threshold = || -1i64..20;
    (
        (distance(), distance(), distance(), distance(), distance(), distance()),
        (threshold(), threshold(), threshold()),
    )
        .prop_map(|((d01, d02, d03, d12, d13, d23), (t01, t02, t12))| {
            instance_from_rows(
                &[
                    &[0, d01, d02, d03],
                    &[d01, 0, d12, d13],
                    &[d02, d12, 0, d23],
                    &[d03, d13, d23, 0],
                ],
                &[&[0, t01, t02], &[t01, 0, t12], &[t02, t12, 0]],
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn objective_matches_exhaustive_search(instance in instance_strategy()) {
        let config = SolveConfig {
            verbosity: Verbosity::Quiet,
            ..SolveConfig::default()
        };
        let result = solve_instance(&instance, ModelOptions::default(), &MilpSolver::new(), &config, "prop")
            .expect("model is supported");
        match brute_force_optimum(&instance, false) {
            Some(optimum) => {
                prop_assert_eq!(result.status, SolveStatus::Optimal);
                prop_assert_eq!(result.objective, Some(optimum));
            }
            None => prop_assert_eq!(result.status, SolveStatus::Infeasible),
        }
        assert_consistent(&instance, &result);
    }
}
