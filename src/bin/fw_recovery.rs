//! Experiment runner for forward-backward greedy sparse recovery.
//!
//! This executable generates a synthetic sparse-recovery problem `b = A x_true + noise`
//! and fits it with an active set of signed coordinate atoms. Each outer iteration:
//! 1. adds the coordinate atom most aligned with the negative gradient (forward step),
//! 2. refines the coefficients inside the L1 ball of radius `tau`,
//! 3. prunes atoms whose removal costs less than a fraction of the forward gain
//!    (backward step) and refines again.
//!
//! One CSV row is written per outer iteration.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use faer::Mat;
use fw_atoms::{
    ActiveSet, Objective, PruneOptions, RefineOptions, SquaredLoss,
    utils::synthetic::{coordinate_atom, sparse_recovery_problem},
};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line arguments for the sparse-recovery experiment.
#[derive(Parser, Debug)]
#[clap(
    name = "fw-recovery",
    about = "Runs a forward-backward greedy sparse-recovery experiment on a synthetic problem."
)]
struct RecoveryArgs {
    /// Number of observations (rows of A).
    #[clap(long, default_value_t = 100)]
    rows: usize,

    /// Ambient dimension (columns of A).
    #[clap(long, default_value_t = 256)]
    cols: usize,

    /// Number of non-zero entries of the ground truth.
    #[clap(long, default_value_t = 10)]
    sparsity: usize,

    /// Standard deviation of the observation noise.
    #[clap(long, default_value_t = 0.01)]
    noise: f64,

    /// Seed for the problem generator.
    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// L1-ball radius. Defaults to the L1 norm of the ground truth.
    #[clap(long)]
    tau: Option<f64>,

    /// Step size of the projected gradient refinement.
    #[clap(long, default_value_t = 0.5)]
    step_size: f64,

    /// Maximum refinement steps per outer iteration.
    #[clap(long, default_value_t = 100)]
    inner_iterations: usize,

    /// A deletion may give back at most this fraction of the last forward gain.
    #[clap(long, default_value_t = 0.5)]
    backward_factor: f64,

    /// Maximum number of outer (forward) iterations.
    #[clap(long, default_value_t = 50)]
    max_outer: usize,

    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// Represents a single row of data for the recovery CSV.
#[derive(Debug, Serialize)]
struct RecoveryResult {
    /// Outer iteration, starting at 1.
    iteration: usize,
    /// Active-set size after pruning.
    atoms: usize,
    /// Objective value `0.5 * ||A x - b||^2` at the end of the iteration.
    objective: f64,
    /// L1 norm of the coefficients.
    atomic_norm: f64,
    /// Atoms deleted by the backward step.
    pruned: usize,
    /// Relative error `||x - x_true|| / ||x_true||`.
    recovery_error: f64,
}

/// Index and sign of the coordinate atom most aligned with `-gradient`.
fn select_coordinate_atom(gradient: &Mat<f64>) -> (usize, f64) {
    let mut best = (0, 0.0_f64);
    for i in 0..gradient.nrows() {
        if gradient[(i, 0)].abs() > best.1.abs() {
            best = (i, gradient[(i, 0)]);
        }
    }
    let sign = if best.1 > 0.0 { -1.0 } else { 1.0 };
    (best.0, sign)
}

/// The main entry point for the recovery experiment.
fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;
    let args = RecoveryArgs::parse();
    log::info!(
        "Starting sparse recovery: A is {}x{}, sparsity {}, noise {}.",
        args.rows,
        args.cols,
        args.sparsity,
        args.noise
    );

    // 1. Setup the test problem and ground truth.
    let problem = sparse_recovery_problem(args.rows, args.cols, args.sparsity, args.noise, args.seed)
        .context("Failed to generate the synthetic problem")?;
    let tau = args.tau.unwrap_or_else(|| problem.true_l1_norm());
    let x_true_norm = problem.x_true.norm_l2();
    let x_true = problem.x_true.clone();
    let loss = SquaredLoss::new(problem.a, problem.b)?;
    log::info!("Using L1-ball radius tau = {tau:.4}.");

    let refine_options = RefineOptions {
        max_iterations: args.inner_iterations,
        ..RefineOptions::default()
    };
    let prune_options = PruneOptions::default();

    let mut set = ActiveSet::with_dimension(args.cols);
    let mut gradient = Mat::<f64>::zeros(args.cols, 1);
    let mut results = Vec::new();

    // 2. Alternate forward and backward steps.
    for iteration in 1..=args.max_outer {
        let x = if set.is_empty() {
            Mat::zeros(args.cols, 1)
        } else {
            set.recover_vector()?
        };
        let value_before = loss.evaluate(x.as_ref());
        loss.gradient(x.as_ref(), gradient.as_mut());

        let (index, sign) = select_coordinate_atom(&gradient);
        set.add_atom(coordinate_atom(args.cols, index, sign).as_ref(), 0.0)?;
        let forward = set.projected_gradient_enhancement(&loss, tau, args.step_size, &refine_options)?;
        let gain = (value_before - forward.value).max(0.0);

        let threshold = forward.value + args.backward_factor * gain;
        let pruned = set.prune_support(threshold, &loss, &prune_options)?;
        // The least-squares re-fit ignores the L1 ball; bring the coefficients back inside.
        let refined = set.projected_gradient_enhancement(&loss, tau, args.step_size, &refine_options)?;

        let x = set.recover_vector()?;
        let recovery_error = (&x - &x_true).norm_l2() / x_true_norm.max(f64::MIN_POSITIVE);
        log::info!(
            "Iteration {iteration}: {} atoms, objective {:.4e}, pruned {}.",
            set.len(),
            refined.value,
            pruned.removed
        );
        results.push(RecoveryResult {
            iteration,
            atoms: set.len(),
            objective: refined.value,
            atomic_norm: set.atomic_norm(),
            pruned: pruned.removed,
            recovery_error,
        });

        if gain <= f64::EPSILON * value_before.max(1.0) {
            log::info!("Forward step made no progress. Stopping.");
            break;
        }
    }

    // 3. Write results to CSV.
    log::info!("Writing results to {:?}...", &args.output);
    let mut writer = csv::Writer::from_path(&args.output)?;
    for record in results {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::info!("Sparse recovery experiment complete.");
    Ok(())
}
