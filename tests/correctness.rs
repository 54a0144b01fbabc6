//! Integration test suite for the active-set store, the L1-ball projection and pruning.
//!
//! # Test Methodology
//!
//! The projection is checked against an independent oracle: for a vector outside the
//! ball, the projection is the soft-threshold of the vector at the unique level `theta`
//! with `sum_i max(|v_i| - theta, 0) = tau`, which is found here by bisection instead of
//! by sorting. Optimality is additionally checked against random feasible points.
//!
//! Pruning is checked on least-squares problems generated with a fixed seed, where the
//! ground truth is known, so that the redundant atoms and the achievable residual are
//! known in advance.

use anyhow::{Result, ensure};
use faer::{Mat, Scale};
use fw_atoms::{
    ActiveSet, Objective, PruneOptions, PruneStatus, RefineOptions, SquaredLoss,
    algorithms::projection::{l1_norm, project_onto_l1_ball, soft_threshold},
    utils::synthetic::{coordinate_atom, sparse_recovery_problem},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Tolerance on distances and norms for the projection tests.
const PROJECTION_TOLERANCE: f64 = 1e-9;

/// Finds the soft-threshold level by bisection on `theta in [0, max |v_i|]`.
fn bisection_projection(v: &[f64], tau: f64) -> Vec<f64> {
    if l1_norm(v) <= tau {
        return v.to_vec();
    }
    let mass = |theta: f64| -> f64 { v.iter().map(|x| (x.abs() - theta).max(0.0)).sum() };
    let mut lo = 0.0;
    let mut hi = v.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mass(mid) > tau {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let theta = 0.5 * (lo + hi);
    v.iter().map(|&x| soft_threshold(x, theta)).collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// A macro to generate the boilerplate for each projection test.
///
/// 1. Draw a random vector of length `$n` with a seeded generator.
/// 2. Project it with the sorting algorithm and with the bisection oracle.
/// 3. Check feasibility, agreement with the oracle, and that no random feasible
///    point is closer to the original vector.
macro_rules! generate_projection_test {
    ($test_name:ident, $n:expr, $scale:expr, $tau:expr, $seed:expr) => {
        #[test]
        fn $test_name() -> Result<()> {
            let mut rng = StdRng::seed_from_u64($seed);
            let original: Vec<f64> = (0..$n)
                .map(|_| $scale * (rng.random::<f64>() - 0.5))
                .collect();

            let mut projected = original.clone();
            project_onto_l1_ball(&mut projected, $tau)?;

            ensure!(
                l1_norm(&projected) <= $tau + PROJECTION_TOLERANCE,
                "infeasible projection: ||p||_1 = {}",
                l1_norm(&projected)
            );

            let oracle = bisection_projection(&original, $tau);
            let gap = distance(&projected, &oracle);
            ensure!(gap < 1e-8, "projection differs from oracle by {}", gap);

            let best = distance(&original, &projected);
            for _ in 0..500 {
                let z: Vec<f64> = (0..$n).map(|_| rng.random::<f64>() - 0.5).collect();
                let radius = $tau * rng.random::<f64>() / l1_norm(&z).max(f64::MIN_POSITIVE);
                let z: Vec<f64> = z.iter().map(|x| x * radius).collect();
                ensure!(
                    distance(&original, &z) >= best - PROJECTION_TOLERANCE,
                    "found a feasible point closer than the projection"
                );
            }
            Ok(())
        }
    };
}

generate_projection_test!(test_projection_small_vector_tight_ball, 4, 10.0, 1.0, 1);
generate_projection_test!(test_projection_medium_vector, 25, 4.0, 3.0, 2);
generate_projection_test!(test_projection_large_vector_wide_ball, 200, 2.0, 20.0, 3);
generate_projection_test!(test_projection_vector_already_feasible, 10, 0.1, 5.0, 4);
generate_projection_test!(test_projection_zero_radius, 12, 3.0, 0.0, 5);

#[test]
fn test_projection_of_reference_vector() -> Result<()> {
    let mut c = vec![3.0, -4.0, 0.0, 1.0];
    project_onto_l1_ball(&mut c, 2.0)?;
    ensure!((l1_norm(&c) - 2.0).abs() < 1e-12, "norm is {}", l1_norm(&c));
    // Signs are preserved and the largest magnitude stays the largest.
    ensure!(c[0] > 0.0 && c[1] < 0.0, "signs changed: {:?}", c);
    ensure!(c[1].abs() >= c[0].abs(), "ordering changed: {:?}", c);
    ensure!(c[2] == 0.0 && c[3] == 0.0, "small entries should vanish: {:?}", c);
    ensure!(distance(&c, &[0.5, -1.5, 0.0, 0.0]) < 1e-12, "projected to {:?}", c);
    Ok(())
}

#[test]
fn test_projection_leaves_feasible_vector_unchanged() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..100 {
        let original: Vec<f64> = (0..8).map(|_| rng.random::<f64>() - 0.5).collect();
        let tau = l1_norm(&original) + rng.random::<f64>();
        let mut c = original.clone();
        project_onto_l1_ball(&mut c, tau)?;
        ensure!(c == original, "feasible vector was modified");
    }
    Ok(())
}

#[test]
fn test_recover_two_unit_vectors() -> Result<()> {
    let mut set = ActiveSet::new();
    set.add_atom(coordinate_atom(3, 0, 1.0).as_ref(), 1.0)?;
    set.add_atom(coordinate_atom(3, 2, 1.0).as_ref(), 1.0)?;
    let x = set.recover_vector()?;
    let expected = Mat::from_fn(3, 1, |i, _| [1.0, 0.0, 1.0][i]);
    ensure!(x == expected, "recovered {:?}", x);
    Ok(())
}

#[test]
fn test_recovery_matches_weighted_sum() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(21);
    let d = 7;
    let mut set = ActiveSet::new();
    let mut expected = Mat::<f64>::zeros(d, 1);
    for _ in 0..5 {
        let atom = Mat::from_fn(d, 1, |_, _| rng.random::<f64>() - 0.5);
        let c = rng.random::<f64>() * 4.0 - 2.0;
        expected = &expected + &(&atom * Scale(c));
        set.add_atom(atom.as_ref(), c)?;
    }
    let x = set.recover_vector()?;
    ensure!((&x - &expected).norm_l2() < 1e-12, "recovery mismatch");
    Ok(())
}

#[test]
fn test_prune_removes_scaled_duplicate() -> Result<()> {
    // Four-dimensional ground truth with every coordinate active, observed through a
    // random 8 x 4 operator without noise.
    let problem = sparse_recovery_problem(8, 4, 4, 0.0, 17)?;
    let x_true = problem.x_true.clone();
    let loss = SquaredLoss::new(problem.a, problem.b)?;

    // The coefficient of x_1 is split between e_1 and its scaled copy 2 e_1.
    let mut set = ActiveSet::new();
    for i in [3, 2, 0] {
        set.add_atom(coordinate_atom(4, i, 1.0).as_ref(), x_true[(i, 0)])?;
    }
    set.add_atom(coordinate_atom(4, 1, 2.0).as_ref(), x_true[(1, 0)] / 4.0)?;
    set.add_atom(coordinate_atom(4, 1, 1.0).as_ref(), x_true[(1, 0)] / 2.0)?;
    ensure!(set.len() == 5, "expected five atoms");
    ensure!(loss.evaluate(set.recover_vector()?.as_ref()) < 1e-20, "bad setup");

    let threshold = 1e-6;
    let report = set.prune_support(threshold, &loss, &PruneOptions::default())?;

    ensure!(report.removed == 1, "removed {} atoms", report.removed);
    ensure!(set.len() == 4, "{} atoms left", set.len());
    ensure!(report.status == PruneStatus::ThresholdExceeded, "{:?}", report.status);
    ensure!(report.value <= threshold, "objective {} above threshold", report.value);
    ensure!(set.atoms().ncols() == set.coefficients().nrows(), "invariant broken");

    let x = set.recover_vector()?;
    ensure!((&x - &x_true).norm_l2() < 1e-8, "re-fit drifted from the truth");
    Ok(())
}

#[test]
fn test_prune_never_exceeds_threshold_on_random_problems() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(99);
    for seed in 0..20 {
        let problem = sparse_recovery_problem(12, 6, 3, 0.05, seed)?;
        let loss = SquaredLoss::new(problem.a, problem.b)?;

        let mut set = ActiveSet::new();
        for _ in 0..5 {
            let atom = Mat::from_fn(6, 1, |_, _| rng.random::<f64>() - 0.5);
            set.add_atom(atom.as_ref(), rng.random::<f64>() - 0.5)?;
        }
        let before = set.len();
        let start = loss.evaluate(set.recover_vector()?.as_ref());
        let threshold = 1.5 * start;

        let report = set.prune_support(threshold, &loss, &PruneOptions::default())?;
        ensure!(set.len() <= before, "pruning grew the set");
        ensure!(set.len() >= 1, "pruning emptied the set");
        ensure!(set.atoms().ncols() == set.coefficients().nrows(), "invariant broken");
        if report.removed > 0 {
            ensure!(
                report.value <= threshold,
                "seed {}: objective {} above threshold {}",
                seed,
                report.value,
                threshold
            );
        }
        ensure!(
            set.coefficient_slice().iter().all(|c| c.is_finite()),
            "non-finite coefficient committed"
        );
    }
    Ok(())
}

#[test]
fn test_forward_backward_loop_reduces_objective() -> Result<()> {
    let (rows, cols) = (40, 60);
    let problem = sparse_recovery_problem(rows, cols, 4, 0.0, 5)?;
    let tau = problem.true_l1_norm();
    let loss = SquaredLoss::new(problem.a, problem.b)?;
    let refine = RefineOptions {
        max_iterations: 500,
        tolerance: 1e-12,
    };
    let initial = loss.evaluate(Mat::<f64>::zeros(cols, 1).as_ref());

    let mut set = ActiveSet::with_dimension(cols);
    let mut gradient = Mat::<f64>::zeros(cols, 1);
    for _ in 0..30 {
        let x = if set.is_empty() {
            Mat::zeros(cols, 1)
        } else {
            set.recover_vector()?
        };
        loss.gradient(x.as_ref(), gradient.as_mut());
        let (index, g) = (0..cols)
            .map(|i| (i, gradient[(i, 0)]))
            .fold((0, 0.0_f64), |best, cur| if cur.1.abs() > best.1.abs() { cur } else { best });
        let sign = if g > 0.0 { -1.0 } else { 1.0 };
        set.add_atom(coordinate_atom(cols, index, sign).as_ref(), 0.0)?;
        let refined = set.projected_gradient_enhancement(&loss, tau, 0.5, &refine)?;
        set.prune_support(refined.value * 1.1 + 1e-12, &loss, &PruneOptions::default())?;
        set.projected_gradient_enhancement(&loss, tau, 0.5, &refine)?;
        ensure!(set.atomic_norm() <= tau + 1e-9, "left the L1 ball");
        ensure!(set.atoms().ncols() == set.coefficients().nrows(), "invariant broken");
    }

    let value = loss.evaluate(set.recover_vector()?.as_ref());
    ensure!(
        value < 0.25 * initial,
        "objective only went from {} to {}",
        initial,
        value
    );
    Ok(())
}
