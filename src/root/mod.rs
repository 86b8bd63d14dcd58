//! Bracketed root finding with Brent's method
//!
//! Inverts the survival-time transform `H(t) = -ln(U)` by solving
//! `f(t) = H(t) - target = 0` inside a caller-supplied bracket. Brent's
//! method combines bisection (guaranteed progress) with secant and inverse
//! quadratic interpolation (fast local convergence) while always keeping a
//! valid bracket, so it needs no derivatives and cannot diverge.
//!
//! The objective is fallible: evaluating the cumulative hazard may itself
//! require numerical integration, so the solver threads
//! [`QuadratureError`] out to its caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quadrature::QuadratureError;

/// Error type for root-solver operations
#[derive(Error, Debug, Clone)]
pub enum RootError {
    /// The objective has the same sign at both bracket endpoints, so the
    /// event time lies outside the search interval.
    #[error(
        "no sign change over [{lower}, {upper}]: f(lower) = {f_lower}, f(upper) = {f_upper}; \
         the expected event time falls outside the search interval"
    )]
    NoSignChange {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    /// The objective failed during evaluation.
    #[error(transparent)]
    Quadrature(#[from] QuadratureError),

    /// The iteration budget ran out before the bracket collapsed.
    #[error("root search did not converge within {max_iters} iterations")]
    MaxIterations { max_iters: usize },
}

/// Convergence controls for [`brent`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RootOptions {
    /// Absolute tolerance on the bracket width
    pub tol: f64,
    /// Iteration budget
    pub max_iters: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        RootOptions {
            tol: 1e-9,
            max_iters: 100,
        }
    }
}

/// Solve `f(t) = 0` for `t` in `[lower, upper]` with Brent's method.
///
/// Requires `f(lower)` and `f(upper)` to have opposite signs; an exact zero
/// at either endpoint is returned immediately. Convergence is declared when
/// the bracket half-width drops below a mixed absolute/relative tolerance
/// or the residual is numerically zero.
///
/// # Errors
///
/// - [`RootError::NoSignChange`] when the bracket does not straddle a root.
/// - [`RootError::Quadrature`] when the objective fails to evaluate.
/// - [`RootError::MaxIterations`] when the iteration budget is exhausted.
pub fn brent<F>(f: F, lower: f64, upper: f64, opts: &RootOptions) -> Result<f64, RootError>
where
    F: Fn(f64) -> Result<f64, QuadratureError>,
{
    let mut a = lower;
    let mut b = upper;
    let mut fa = f(a)?;
    let mut fb = f(b)?;

    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if (fa > 0.0) == (fb > 0.0) {
        return Err(RootError::NoSignChange {
            lower,
            upper,
            f_lower: fa,
            f_upper: fb,
        });
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = b - a;

    for _ in 0..opts.max_iters {
        if (fb > 0.0) == (fc > 0.0) {
            // Rename so that b and c bracket the root.
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * opts.tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // Attempt secant (a == c) or inverse quadratic interpolation.
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                p = 2.0 * xm * s;
                q = 1.0 - s;
            } else {
                let r = fb / fc;
                let t = fa / fc;
                p = s * (2.0 * xm * t * (t - r) - (b - a) * (r - 1.0));
                q = (t - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                // Interpolation accepted.
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = f(b)?;
    }

    Err(RootError::MaxIterations {
        max_iters: opts.max_iters,
    })
}
