//! Exact Euclidean projection onto the L1 ball.
//!
//! For a vector `c` with `||c||_1 > tau`, the closest point of
//! `{ z : ||z||_1 <= tau }` is the signed soft-threshold of `c` at some level
//! `theta > 0`. The level is found in closed form by projecting `|c|` onto the simplex
//! of radius `tau`: sort the magnitudes in descending order, accumulate them, and find
//! the largest count `rho + 1` of coordinates that stay strictly positive after
//! shrinkage. The cost is dominated by the sort, `O(n log n)`.

use crate::error::{ActiveSetError, ActiveSetErrorKind};

/// The L1 norm `sum_i |c_i|`.
pub fn l1_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v.abs()).sum()
}

/// Shrinks `value` toward zero by `theta`, clipping at zero instead of changing sign.
#[inline]
pub fn soft_threshold(value: f64, theta: f64) -> f64 {
    if value >= 0.0 {
        (value - theta).max(0.0)
    } else {
        (value + theta).min(0.0)
    }
}

/// Projects `values` in place onto the L1 ball of radius `tau`.
///
/// Vectors already inside the ball are left untouched. `tau == 0` maps every vector to
/// zero.
///
/// # Errors
/// `tau` must be finite and non-negative, and every entry of `values` must be finite.
pub fn project_onto_l1_ball(values: &mut [f64], tau: f64) -> Result<(), ActiveSetError> {
    if !tau.is_finite() || tau < 0.0 {
        return Err(ActiveSetErrorKind::InputError(format!(
            "L1-ball radius must be finite and non-negative, got {tau}"
        ))
        .into());
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ActiveSetErrorKind::InputError(
            "cannot project a vector with non-finite entries".to_string(),
        )
        .into());
    }

    if l1_norm(values) <= tau {
        return Ok(());
    }

    let theta = shrinkage_level(values, tau);
    for v in values.iter_mut() {
        *v = soft_threshold(*v, theta);
    }
    Ok(())
}

/// Computes the soft-threshold level `theta` for a vector strictly outside the ball.
fn shrinkage_level(values: &[f64], tau: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));

    let cumsum: Vec<f64> = sorted
        .iter()
        .scan(0.0, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect();

    // Scan from the smallest magnitude upward; the first index that survives the
    // shrinkage is the last active coordinate. rho = 0 always survives when tau > 0,
    // and is also the right answer for tau == 0.
    let rho = (0..sorted.len())
        .rev()
        .find(|&j| sorted[j] - (cumsum[j] - tau) / (j + 1) as f64 > 0.0)
        .unwrap_or(0);

    (cumsum[rho] - tau) / (rho + 1) as f64
}
