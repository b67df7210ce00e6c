//! Perturbation sampling
//!
//! Interpolates a variable's error table onto the track's validation times,
//! draws one random factor per ensemble member and applies it to every
//! timestep of that member.
//!
//! - Gaussian variables: `alpha = z / 0.7979` with `z ~ N(0, 1)`, so that
//!   `E|alpha| = 1` and `error * alpha` has the tabulated mean absolute error.
//!   `out[t] = base[t] + error[t] * alpha`
//! - Range variables: `alpha ~ U(0, 1)`,
//!   `out[t] = base[t] + min[t] * alpha + max[t] * (1 - alpha)`

use super::classification::Bucket;
use super::error_tables::{lookup, ErrorMagnitudes};
use super::variables::{DistributionKind, PerturbedVariable};
use crate::error::{ConfigurationError, EnsembleError};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Mean of |z| for a standard normal, sqrt(2/pi)
pub const MEAN_ABSOLUTE_NORMAL: f64 = 0.7979;

/// Error magnitudes aligned to a track's validation times
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeries {
    /// Mean absolute error per record
    Symmetric(Vec<f64>),
    /// Error envelope per record
    Range {
        /// Minimum error curve
        min: Vec<f64>,
        /// Maximum error curve
        max: Vec<f64>,
    },
}

impl ErrorSeries {
    /// Number of records covered
    pub fn len(&self) -> usize {
        match self {
            ErrorSeries::Symmetric(errors) => errors.len(),
            ErrorSeries::Range { min, .. } => min.len(),
        }
    }

    /// True when no records are covered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distribution that pairs with this kind of series
    pub fn distribution(&self) -> DistributionKind {
        match self {
            ErrorSeries::Symmetric(_) => DistributionKind::Gaussian,
            ErrorSeries::Range { .. } => DistributionKind::Range,
        }
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`, flat outside `xp`
///
/// `xp` must be strictly increasing and the same length as `fp`.
pub fn interpolate(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    debug_assert_eq!(xp.len(), fp.len());
    debug_assert!(!xp.is_empty());
    let last = xp.len() - 1;
    x.iter()
        .map(|&xi| {
            if xi <= xp[0] {
                return fp[0];
            }
            if xi >= xp[last] {
                return fp[last];
            }
            // First anchor strictly above xi; xp[upper - 1] <= xi < xp[upper]
            let upper = xp.partition_point(|&a| a <= xi);
            let lower = upper - 1;
            if xi == xp[lower] {
                return fp[lower];
            }
            let t = (xi - xp[lower]) / (xp[upper] - xp[lower]);
            fp[lower] + t * (fp[upper] - fp[lower])
        })
        .collect()
}

/// Interpolate a variable's error table onto `vt_hours`
///
/// # Errors
/// Propagates table lookup failures (missing model or mismatched bucket)
pub fn sample_errors(
    variable: PerturbedVariable,
    bucket: Bucket,
    vt_hours: &[f64],
) -> Result<ErrorSeries, ConfigurationError> {
    let table = lookup(variable, bucket)?;
    Ok(match table.magnitudes {
        ErrorMagnitudes::Symmetric(errors) => {
            ErrorSeries::Symmetric(interpolate(vt_hours, table.anchors, errors))
        }
        ErrorMagnitudes::Range { min, max } => ErrorSeries::Range {
            min: interpolate(vt_hours, table.anchors, min),
            max: interpolate(vt_hours, table.anchors, max),
        },
    })
}

/// Draw one member's random factor
pub fn draw_alpha<R: Rng + ?Sized>(kind: DistributionKind, rng: &mut R) -> f64 {
    match kind {
        DistributionKind::Gaussian => {
            let z: f64 = StandardNormal.sample(rng);
            z / MEAN_ABSOLUTE_NORMAL
        }
        DistributionKind::Range => rng.random::<f64>(),
    }
}

/// Apply a drawn factor to a base series (no clamping)
///
/// # Errors
/// Returns a configuration error if `errors` does not line up with `base`
pub fn apply_perturbation(
    base: &[f64],
    errors: &ErrorSeries,
    alpha: f64,
) -> Result<Vec<f64>, EnsembleError> {
    if errors.len() != base.len() {
        return Err(ConfigurationError::SeriesLengthMismatch {
            series: "error",
            expected: base.len(),
            found: errors.len(),
        }
        .into());
    }
    Ok(match errors {
        ErrorSeries::Symmetric(magnitude) => base
            .iter()
            .zip(magnitude)
            .map(|(b, e)| b + e * alpha)
            .collect(),
        ErrorSeries::Range { min, max } => base
            .iter()
            .zip(min.iter().zip(max))
            .map(|(b, (lo, hi))| b + lo * alpha + hi * (1.0 - alpha))
            .collect(),
    })
}

/// Apply a known factor and clamp to the variable's bounds
///
/// # Errors
/// Returns a configuration error if `errors` does not line up with `base`
pub fn perturb_with_alpha(
    base: &[f64],
    variable: PerturbedVariable,
    errors: &ErrorSeries,
    alpha: f64,
) -> Result<Vec<f64>, EnsembleError> {
    Ok(variable.clamp(apply_perturbation(base, errors, alpha)?))
}

/// Draw a factor, apply it and clamp to the variable's bounds
///
/// Returns the perturbed series and the factor that was drawn.
///
/// # Errors
/// Returns a configuration error if `errors` does not line up with `base`
pub fn perturb<R: Rng + ?Sized>(
    base: &[f64],
    variable: PerturbedVariable,
    errors: &ErrorSeries,
    rng: &mut R,
) -> Result<(Vec<f64>, f64), EnsembleError> {
    let alpha = draw_alpha(variable.distribution(), rng);
    Ok((perturb_with_alpha(base, variable, errors, alpha)?, alpha))
}
