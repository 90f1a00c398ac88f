//! Special functions used by the nearest-neighbor estimators
//!
//! Digamma comes from `statrs`; trigamma (its derivative) is needed for the
//! analytic gradient of the weighted loss and has no `statrs` counterpart.

use crate::error::{CapacityError, Result};

/// Digamma function ψ(x) = d/dx ln Γ(x)
#[inline]
pub fn digamma(x: f64) -> f64 {
    statrs::function::gamma::digamma(x)
}

/// Digamma restricted to the positive reals, surfacing anything else as a degeneracy
pub fn checked_digamma(x: f64, what: &str) -> Result<f64> {
    if !(x > 0.0) || !x.is_finite() {
        return Err(CapacityError::NumericalDegeneracy(format!(
            "digamma of non-positive {} ({})",
            what, x
        )));
    }
    Ok(digamma(x))
}

/// Trigamma function ψ₁(x) = d²/dx² ln Γ(x), for x > 0.
///
/// Uses the recurrence ψ₁(x) = ψ₁(x + 1) + 1/x² to shift x above 6, then the
/// asymptotic series.
pub fn trigamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::NAN;
    }

    let mut result = 0.0;
    let mut x = x;

    while x < 6.0 {
        result += 1.0 / (x * x);
        x += 1.0;
    }

    // ψ₁(x) ≈ 1/x + 1/(2x²) + 1/(6x³) - 1/(30x⁵) + 1/(42x⁷) - 1/(30x⁹)
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result += inv
        + 0.5 * inv2
        + inv * inv2 * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 * (1.0 / 42.0 - inv2 / 30.0)));

    result
}
