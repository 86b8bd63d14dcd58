//! Adaptive Gauss–Kronrod quadrature
//!
//! This module computes ∫ₐᵇ f(s) ds for a smooth, non-negative integrand
//! using the paired 7-point Gauss / 15-point Kronrod rule. Both estimates
//! share the Kronrod node set, so the difference between them provides an
//! error estimate at no extra function evaluations:
//!
//! ```text
//! error ≈ |K15 − G7|
//! ```
//!
//! When a segment's error estimate exceeds its share of the tolerance, the
//! segment is bisected and both halves are pushed onto an explicit worklist.
//! The subdivision budget is bounded; once it is exhausted the running best
//! estimate is returned rather than an error, since the caller inverts the
//! result against a random threshold and approximate integration is an
//! accepted tradeoff.
//!
//! The only hard failure is a non-finite integrand value at an evaluation
//! node, which indicates a malformed hazard function.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for quadrature operations
#[derive(Error, Debug, Clone)]
pub enum QuadratureError {
    #[error("integrand returned a non-finite value at t = {t}")]
    NonFiniteIntegrand { t: f64 },
}

/// Abscissae of the 15-point Kronrod rule on [-1, 1], positive half.
///
/// Even indices are the Kronrod extension points; odd indices (plus the
/// centre) are the nodes of the embedded 7-point Gauss rule.
const XGK: [f64; 8] = [
    0.991455371120813,
    0.949107912342759,
    0.864864423359769,
    0.741531185599394,
    0.586087235467691,
    0.405845151377397,
    0.207784955007898,
    0.0,
];

/// Weights of the 15-point Kronrod rule, matching [`XGK`].
const WGK: [f64; 8] = [
    0.022935322010529,
    0.063092092629979,
    0.104790010322250,
    0.140653259715525,
    0.169004726639267,
    0.190350578064785,
    0.204432940075298,
    0.209482141084728,
];

/// Weights of the embedded 7-point Gauss rule (nodes at `XGK[1]`, `XGK[3]`,
/// `XGK[5]` and the centre).
const WG: [f64; 4] = [
    0.129484966168870,
    0.279705391489277,
    0.381830050505119,
    0.417959183673469,
];

/// Tolerance and subdivision limits for adaptive integration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuadratureOptions {
    /// Absolute tolerance on the whole-interval estimate
    pub abs_tol: f64,
    /// Relative tolerance on the whole-interval estimate
    pub rel_tol: f64,
    /// Maximum bisection depth for any single segment
    pub max_depth: usize,
    /// Total bisection budget across the whole interval
    pub max_subdivisions: usize,
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        QuadratureOptions {
            abs_tol: 1e-10,
            rel_tol: 1e-8,
            max_depth: 25,
            max_subdivisions: 256,
        }
    }
}

/// A pending sub-interval on the adaptive worklist
#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    depth: usize,
}

/// Approximate ∫ₐᵇ f(s) ds with the adaptive Gauss–Kronrod rule.
///
/// Degenerate intervals return 0; a reversed interval returns the negated
/// integral over the swapped bounds. Sub-intervals whose error estimate
/// exceeds their share of the tolerance are bisected until either the
/// tolerance is met or the subdivision budget runs out, in which case the
/// best available estimate is returned.
///
/// # Errors
///
/// Returns [`QuadratureError::NonFiniteIntegrand`] if `f` produces NaN or
/// an infinity at any evaluation node.
pub fn integrate<F>(f: F, a: f64, b: f64, opts: &QuadratureOptions) -> Result<f64, QuadratureError>
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return Ok(0.0);
    }
    if b < a {
        return Ok(-integrate(f, b, a, opts)?);
    }

    let width = b - a;
    let mut total: f64 = 0.0;
    let mut splits = 0usize;
    let mut worklist = vec![Segment { a, b, depth: 0 }];

    while let Some(seg) = worklist.pop() {
        let (estimate, error) = kronrod15(&f, seg.a, seg.b)?;
        let tolerance = opts.abs_tol.max(opts.rel_tol * (total.abs() + estimate.abs()));
        let share = (seg.b - seg.a) / width;

        let accept = error <= tolerance * share
            || seg.depth >= opts.max_depth
            || splits >= opts.max_subdivisions;

        if accept {
            total += estimate;
        } else {
            let mid = 0.5 * (seg.a + seg.b);
            splits += 1;
            worklist.push(Segment {
                a: seg.a,
                b: mid,
                depth: seg.depth + 1,
            });
            worklist.push(Segment {
                a: mid,
                b: seg.b,
                depth: seg.depth + 1,
            });
        }
    }

    Ok(total)
}

/// Single application of the G7/K15 pair on [a, b].
///
/// Returns the 15-point estimate together with |K15 − G7| as its error
/// estimate.
fn kronrod15<F>(f: &F, a: f64, b: f64) -> Result<(f64, f64), QuadratureError>
where
    F: Fn(f64) -> f64,
{
    let eval = |t: f64| -> Result<f64, QuadratureError> {
        let y = f(t);
        if y.is_finite() {
            Ok(y)
        } else {
            Err(QuadratureError::NonFiniteIntegrand { t })
        }
    };

    let half = 0.5 * (b - a);
    let centre = 0.5 * (a + b);

    let fc = eval(centre)?;
    let mut gauss = fc * WG[3];
    let mut kronrod = fc * WGK[7];

    // Nodes shared between the Gauss and Kronrod rules.
    for j in 0..3 {
        let idx = 2 * j + 1;
        let offset = half * XGK[idx];
        let pair = eval(centre - offset)? + eval(centre + offset)?;
        gauss += WG[j] * pair;
        kronrod += WGK[idx] * pair;
    }

    // Kronrod extension nodes.
    for j in 0..4 {
        let idx = 2 * j;
        let offset = half * XGK[idx];
        let pair = eval(centre - offset)? + eval(centre + offset)?;
        kronrod += WGK[idx] * pair;
    }

    let estimate = kronrod * half;
    let error = ((kronrod - gauss) * half).abs();
    Ok((estimate, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn opts() -> QuadratureOptions {
        QuadratureOptions::default()
    }

    #[test]
    fn integrates_constant() {
        let result = integrate(|_| 2.0, 0.0, 3.0, &opts()).unwrap();
        assert_relative_eq!(result, 6.0, max_relative = 1e-12);
    }

    #[test]
    fn integrates_polynomial_exactly() {
        // K15 is exact for polynomials up to degree 22.
        let result = integrate(|t| 3.0 * t * t, 0.0, 2.0, &opts()).unwrap();
        assert_relative_eq!(result, 8.0, max_relative = 1e-12);
    }

    #[test]
    fn integrates_exponential() {
        let result = integrate(|t| t.exp(), 0.0, 1.0, &opts()).unwrap();
        assert_relative_eq!(result, 1.0_f64.exp() - 1.0, max_relative = 1e-10);
    }

    #[test]
    fn handles_tiny_interval() {
        let result = integrate(|t| 0.1 * 1.5 * t.powf(0.5), 0.0, 1e-8, &opts()).unwrap();
        let exact = 0.1 * 1e-8_f64.powf(1.5);
        // The absolute floor accepts a single panel here; the sqrt-shaped
        // integrand costs a few digits on one K15 application.
        assert_relative_eq!(result, exact, max_relative = 1e-3);
    }

    #[test]
    fn handles_long_interval() {
        // Weibull hazard with lambda = 0.1, gamma = 1.5 over [0, 100].
        let result = integrate(|t| 0.1 * 1.5 * t.powf(0.5), 0.0, 100.0, &opts()).unwrap();
        let exact = 0.1 * 100.0_f64.powf(1.5);
        assert_relative_eq!(result, exact, max_relative = 1e-7);
    }

    #[test]
    fn degenerate_interval_is_zero() {
        assert_eq!(integrate(|t| t.exp(), 1.0, 1.0, &opts()).unwrap(), 0.0);
    }

    #[test]
    fn reversed_interval_negates() {
        let forward = integrate(|t| t, 0.0, 2.0, &opts()).unwrap();
        let backward = integrate(|t| t, 2.0, 0.0, &opts()).unwrap();
        assert_relative_eq!(backward, -forward, max_relative = 1e-12);
    }

    #[test]
    fn non_finite_integrand_is_an_error() {
        let result = integrate(|t| (t - 0.5).ln(), 0.0, 1.0, &opts());
        assert!(matches!(
            result,
            Err(QuadratureError::NonFiniteIntegrand { .. })
        ));
    }

    #[test]
    fn exhausted_budget_returns_best_estimate() {
        let tight = QuadratureOptions {
            abs_tol: 1e-300,
            rel_tol: 1e-300,
            max_depth: 3,
            max_subdivisions: 4,
        };
        // An oscillatory integrand the tiny budget cannot resolve to the
        // impossible tolerance; the call must still return a finite value.
        let result = integrate(|t| (10.0 * t).sin().abs(), 0.0, 10.0, &tight).unwrap();
        assert!(result.is_finite());
        assert!(result > 0.0);
    }
}
