//! Time-dependent covariate effects
//!
//! A [TdeSpec] flags covariates whose effect should be scaled by a function
//! of time, turning a contribution `coef * x` in the linear predictor into
//! `coef * x * f(t)` and producing non-proportional hazards without the
//! caller hand-rolling a custom hazard function.
//!
//! Continuous transforms (identity, log) leave the hazard smooth. A custom
//! transform may be piecewise (e.g. a treatment switch at a fixed time), in
//! which case its declared changepoints partition `[0, maxt]` so the
//! quadrature engine integrates up to each discontinuity instead of across
//! it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Scaling applied to one covariate's effect as a function of time
#[derive(Clone)]
pub enum TimeTransform {
    /// No time dependence: the contribution stays `coef * x`
    Identity,
    /// Effect scaled by `ln(t)`
    Log,
    /// Arbitrary user transform, with any discontinuity times declared
    Custom {
        f: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
        changepoints: Vec<f64>,
    },
}

impl TimeTransform {
    /// A smooth custom transform
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        TimeTransform::Custom {
            f: Arc::new(f),
            changepoints: Vec::new(),
        }
    }

    /// A piecewise custom transform with its discontinuity times
    pub fn custom_with_changepoints<F>(f: F, changepoints: Vec<f64>) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        TimeTransform::Custom {
            f: Arc::new(f),
            changepoints,
        }
    }

    /// Evaluate the transform at time `t`
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            TimeTransform::Identity => 1.0,
            TimeTransform::Log => t.ln(),
            TimeTransform::Custom { f, .. } => f(t),
        }
    }

    /// Discontinuity times of this transform (empty when continuous)
    pub fn changepoints(&self) -> &[f64] {
        match self {
            TimeTransform::Identity | TimeTransform::Log => &[],
            TimeTransform::Custom { changepoints, .. } => changepoints,
        }
    }
}

impl fmt::Debug for TimeTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeTransform::Identity => write!(f, "Identity"),
            TimeTransform::Log => write!(f, "Log"),
            TimeTransform::Custom { changepoints, .. } => f
                .debug_struct("Custom")
                .field("changepoints", changepoints)
                .finish_non_exhaustive(),
        }
    }
}

/// Mapping from covariate name to its time transform
///
/// ```
/// use survsim::*;
///
/// let tde = TdeSpec::new().with("trt", TimeTransform::Log);
/// assert!(tde.transform("trt").is_some());
/// assert!(tde.transform("age").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TdeSpec {
    transforms: BTreeMap<String, TimeTransform>,
}

impl TdeSpec {
    pub fn new() -> Self {
        TdeSpec {
            transforms: BTreeMap::new(),
        }
    }

    /// Flag a covariate with a time transform
    pub fn with(mut self, covariate: impl Into<String>, transform: TimeTransform) -> Self {
        self.transforms.insert(covariate.into(), transform);
        self
    }

    /// The transform flagged for `covariate`, if any
    pub fn transform(&self, covariate: &str) -> Option<&TimeTransform> {
        self.transforms.get(covariate)
    }

    /// Whether any covariate is flagged
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Sorted, deduplicated union of all transforms' changepoints
    pub fn changepoints(&self) -> Vec<f64> {
        let mut points: Vec<f64> = self
            .transforms
            .values()
            .flat_map(|transform| transform.changepoints().iter().copied())
            .filter(|point| point.is_finite() && *point > 0.0)
            .collect();
        points.sort_by(f64::total_cmp);
        points.dedup();
        points
    }
}
