//! Hazard specification and resolution
//!
//! A [HazardSpec] is the canonical, tagged representation of a hazard model:
//! either a parametric baseline [Distribution] with a log-linear covariate
//! predictor, or a user-supplied function on one of four scales (hazard,
//! log hazard, cumulative hazard, log cumulative hazard). Exactly one kind
//! is active per simulation call; [HazardSpec::resolve] turns it into a
//! single canonical cumulative-hazard evaluator once, up front, so no
//! per-call dispatch remains inside the root-finder loop.
//!
//! When only a hazard (or log hazard) is available, the cumulative hazard is
//! obtained by adaptive Gauss–Kronrod integration over `[0, t]`, split at
//! any time-dependent-effect changepoints so the integrand stays smooth on
//! every sub-interval.

pub mod distribution;
pub mod tde;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::data::{Population, Subject};
use crate::quadrature::{integrate, QuadratureError, QuadratureOptions};

pub use distribution::Distribution;
pub use tde::{TdeSpec, TimeTransform};

/// Named auxiliary numeric data threaded through to user hazard functions
/// (e.g. spline knots), so nothing has to be captured ambiently.
pub type Extras = BTreeMap<String, Vec<f64>>;

/// A user-supplied hazard function: `(t, subject, extras) -> value`
pub type UserHazardFn = Arc<dyn Fn(f64, &Subject, &Extras) -> f64 + Send + Sync>;

/// Error type for hazard specification and resolution
#[derive(Error, Debug, Clone)]
pub enum HazardError {
    #[error(
        "subject {subject}: required parameter '{name}' for the {distribution} distribution \
         is missing"
    )]
    MissingParameter {
        subject: String,
        name: String,
        distribution: Distribution,
    },

    #[error(
        "subject {subject}: parameter '{name}' = {value} is not valid for the {distribution} \
         distribution"
    )]
    InvalidParameter {
        subject: String,
        name: String,
        value: f64,
        distribution: Distribution,
    },

    #[error(
        "time-dependent effects require a distribution hazard; a user-supplied function \
         encodes its own time dependence"
    )]
    TdeWithUserFunction,
}

/// The scale on which a user-supplied hazard function is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    /// `f` returns h(t)
    Hazard,
    /// `f` returns ln h(t)
    LogHazard,
    /// `f` returns H(t)
    CumHazard,
    /// `f` returns ln H(t)
    LogCumHazard,
}

/// Canonical hazard specification: one tag, one evaluator-construction rule
#[derive(Clone)]
pub enum HazardSpec {
    /// Parametric baseline with log-linear covariate effects
    Distribution(Distribution),
    /// User function on the scale given by `kind`
    User {
        kind: HazardKind,
        f: UserHazardFn,
        extras: Extras,
    },
}

impl HazardSpec {
    /// A parametric distribution hazard
    pub fn distribution(distribution: Distribution) -> Self {
        HazardSpec::Distribution(distribution)
    }

    /// A user function on the given scale, with no extra arguments
    pub fn user<F>(kind: HazardKind, f: F) -> Self
    where
        F: Fn(f64, &Subject, &Extras) -> f64 + Send + Sync + 'static,
    {
        HazardSpec::User {
            kind,
            f: Arc::new(f),
            extras: Extras::new(),
        }
    }

    /// A user function on the given scale, with named extra arguments
    pub fn user_with_extras<F>(kind: HazardKind, f: F, extras: Extras) -> Self
    where
        F: Fn(f64, &Subject, &Extras) -> f64 + Send + Sync + 'static,
    {
        HazardSpec::User {
            kind,
            f: Arc::new(f),
            extras,
        }
    }

    /// Resolve this specification into a per-call evaluator.
    ///
    /// Validates the configuration against every subject in `population`
    /// before any simulation work: distribution parameters must be present
    /// and admissible in each subject's parameter row, and a non-empty
    /// [TdeSpec] is only meaningful for a distribution hazard.
    pub fn resolve<'a>(
        &'a self,
        tde: Option<&'a TdeSpec>,
        population: &Population,
        quadrature: QuadratureOptions,
    ) -> Result<ResolvedHazard<'a>, HazardError> {
        let tde = tde.filter(|spec| !spec.is_empty());

        match self {
            HazardSpec::Distribution(distribution) => {
                for subject in population.subjects() {
                    for &name in distribution.param_names() {
                        match subject.parameter(name) {
                            None => {
                                return Err(HazardError::MissingParameter {
                                    subject: subject.id().clone(),
                                    name: name.to_string(),
                                    distribution: *distribution,
                                })
                            }
                            Some(value) if !distribution.param_is_valid(name, value) => {
                                return Err(HazardError::InvalidParameter {
                                    subject: subject.id().clone(),
                                    name: name.to_string(),
                                    value,
                                    distribution: *distribution,
                                })
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
            HazardSpec::User { .. } => {
                if tde.is_some() {
                    return Err(HazardError::TdeWithUserFunction);
                }
            }
        }

        let changepoints = tde.map(TdeSpec::changepoints).unwrap_or_default();

        Ok(ResolvedHazard {
            spec: self,
            tde,
            changepoints,
            quadrature,
        })
    }
}

impl fmt::Debug for HazardSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardSpec::Distribution(distribution) => {
                f.debug_tuple("Distribution").field(distribution).finish()
            }
            HazardSpec::User { kind, extras, .. } => f
                .debug_struct("User")
                .field("kind", kind)
                .field("extras", extras)
                .finish_non_exhaustive(),
        }
    }
}

/// A resolved hazard: the single canonical cumulative-hazard evaluator
///
/// Shared read-only across all subjects (and worker threads) during one
/// simulation call.
#[derive(Debug)]
pub struct ResolvedHazard<'a> {
    spec: &'a HazardSpec,
    tde: Option<&'a TdeSpec>,
    changepoints: Vec<f64>,
    quadrature: QuadratureOptions,
}

impl ResolvedHazard<'_> {
    /// H(t, x, betas) ≥ 0, non-decreasing in `t`, H(0) = 0.
    ///
    /// Direct when the specification is on a cumulative scale or a
    /// distribution without time-dependent effects; otherwise computed by
    /// piecewise adaptive quadrature of the hazard over `[0, t]`.
    pub fn cumulative(&self, t: f64, subject: &Subject) -> Result<f64, QuadratureError> {
        match self.spec {
            HazardSpec::User {
                kind: HazardKind::CumHazard,
                f,
                extras,
            } => guard_nan(f(t, subject, extras), t),
            HazardSpec::User {
                kind: HazardKind::LogCumHazard,
                f,
                extras,
            } => guard_nan(f(t, subject, extras).exp(), t),
            HazardSpec::Distribution(distribution) if self.tde.is_none() => {
                let params = dist_params(*distribution, subject);
                let eta = self.linear_predictor(t, subject);
                guard_nan(
                    distribution.baseline_cum_hazard(t, &params) * eta.exp(),
                    t,
                )
            }
            _ => self.integrate_hazard(t, subject),
        }
    }

    /// h(t, x, betas), when it is available without integration.
    ///
    /// `None` for specifications given only on a cumulative scale.
    pub fn hazard(&self, t: f64, subject: &Subject) -> Option<f64> {
        match self.spec {
            HazardSpec::Distribution(distribution) => {
                let params = dist_params(*distribution, subject);
                let eta = self.linear_predictor(t, subject);
                Some(distribution.baseline_hazard(t, &params) * eta.exp())
            }
            HazardSpec::User {
                kind: HazardKind::Hazard,
                f,
                extras,
            } => Some(f(t, subject, extras)),
            HazardSpec::User {
                kind: HazardKind::LogHazard,
                f,
                extras,
            } => Some(f(t, subject, extras).exp()),
            HazardSpec::User { .. } => None,
        }
    }

    /// Sorted changepoints the integrator splits at
    pub fn changepoints(&self) -> &[f64] {
        &self.changepoints
    }

    /// Linear predictor η(t) = Σ coefⱼ · xⱼ · fⱼ(t) over covariates whose
    /// name has a matching coefficient in the parameter row.
    fn linear_predictor(&self, t: f64, subject: &Subject) -> f64 {
        let mut eta = 0.0;
        for (name, x) in subject.covariates() {
            if let Some(coef) = subject.parameter(name) {
                let scale = self
                    .tde
                    .and_then(|tde| tde.transform(name))
                    .map_or(1.0, |transform| transform.apply(t));
                eta += coef * x * scale;
            }
        }
        eta
    }

    /// Integrand for the quadrature path: the (TDE-adjusted) hazard at `s`.
    fn hazard_integrand(&self, s: f64, subject: &Subject) -> f64 {
        match self.spec {
            HazardSpec::Distribution(distribution) => {
                let params = dist_params(*distribution, subject);
                distribution.baseline_hazard(s, &params)
                    * self.linear_predictor(s, subject).exp()
            }
            HazardSpec::User {
                kind: HazardKind::Hazard,
                f,
                extras,
            } => f(s, subject, extras),
            HazardSpec::User {
                kind: HazardKind::LogHazard,
                f,
                extras,
            } => f(s, subject, extras).exp(),
            // Cumulative kinds never reach the integration path.
            HazardSpec::User { .. } => f64::NAN,
        }
    }

    /// ∫₀ᵗ h(s) ds, split at every changepoint inside (0, t).
    fn integrate_hazard(&self, t: f64, subject: &Subject) -> Result<f64, QuadratureError> {
        let mut total = 0.0;
        let mut start = 0.0;
        for &point in &self.changepoints {
            if point <= start {
                continue;
            }
            if point >= t {
                break;
            }
            total += integrate(
                |s| self.hazard_integrand(s, subject),
                start,
                point,
                &self.quadrature,
            )?;
            start = point;
        }
        total += integrate(
            |s| self.hazard_integrand(s, subject),
            start,
            t,
            &self.quadrature,
        )?;
        Ok(total)
    }
}

/// NaN from a user evaluator on a direct (non-integrated) path is still a
/// malformed hazard; report it at the offending time.
fn guard_nan(value: f64, t: f64) -> Result<f64, QuadratureError> {
    if value.is_nan() {
        Err(QuadratureError::NonFiniteIntegrand { t })
    } else {
        Ok(value)
    }
}

/// Distribution parameters in declaration order; resolution has already
/// checked presence and validity against the population.
fn dist_params(distribution: Distribution, subject: &Subject) -> [f64; 2] {
    let mut params = [f64::NAN; 2];
    for (i, name) in distribution.param_names().iter().enumerate() {
        if let Some(value) = subject.parameter(name) {
            params[i] = value;
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn weibull_subject(trt: f64) -> Subject {
        Subject::builder("s1")
            .covariate("trt", trt)
            .parameter("lambda", 0.1)
            .parameter("gamma", 1.5)
            .parameter("trt", -0.5)
            .build()
    }

    fn population(subject: &Subject) -> Population {
        Population::new(vec![subject.clone()])
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let subject = Subject::builder("s1").parameter("lambda", 0.1).build();
        let spec = HazardSpec::distribution(Distribution::Weibull);
        let err = spec
            .resolve(None, &population(&subject), QuadratureOptions::default())
            .unwrap_err();
        assert!(matches!(err, HazardError::MissingParameter { ref name, .. } if name == "gamma"));
    }

    #[test]
    fn invalid_parameter_is_rejected() {
        let subject = Subject::builder("s1")
            .parameter("lambda", -0.1)
            .parameter("gamma", 1.5)
            .build();
        let spec = HazardSpec::distribution(Distribution::Weibull);
        let err = spec
            .resolve(None, &population(&subject), QuadratureOptions::default())
            .unwrap_err();
        assert!(matches!(err, HazardError::InvalidParameter { ref name, .. } if name == "lambda"));
    }

    #[test]
    fn tde_with_user_function_is_rejected() {
        let subject = weibull_subject(1.0);
        let spec = HazardSpec::user(HazardKind::Hazard, |_, _, _| 0.1);
        let tde = TdeSpec::new().with("trt", TimeTransform::Log);
        let err = spec
            .resolve(
                Some(&tde),
                &population(&subject),
                QuadratureOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, HazardError::TdeWithUserFunction));
    }

    #[test]
    fn empty_tde_with_user_function_is_allowed() {
        let subject = weibull_subject(1.0);
        let spec = HazardSpec::user(HazardKind::Hazard, |_, _, _| 0.1);
        let tde = TdeSpec::new();
        assert!(spec
            .resolve(
                Some(&tde),
                &population(&subject),
                QuadratureOptions::default()
            )
            .is_ok());
    }

    #[test]
    fn closed_form_matches_integrated_hazard() {
        let subject = weibull_subject(1.0);
        let pop = population(&subject);
        let quad = QuadratureOptions::default();

        let closed = HazardSpec::distribution(Distribution::Weibull);
        let closed = closed.resolve(None, &pop, quad).unwrap();

        let integrated = HazardSpec::user(HazardKind::Hazard, |t, subject: &Subject, _| {
            let lambda = subject.parameter("lambda").unwrap();
            let gamma = subject.parameter("gamma").unwrap();
            let beta = subject.parameter("trt").unwrap();
            let x = subject.covariate("trt").unwrap();
            lambda * gamma * t.powf(gamma - 1.0) * (beta * x).exp()
        });
        let integrated = integrated.resolve(None, &pop, quad).unwrap();

        for t in [0.5, 2.0, 10.0] {
            assert_relative_eq!(
                closed.cumulative(t, &subject).unwrap(),
                integrated.cumulative(t, &subject).unwrap(),
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn log_cum_hazard_is_exponentiated() {
        let subject = weibull_subject(0.0);
        let pop = population(&subject);
        let spec = HazardSpec::user(HazardKind::LogCumHazard, |t, subject: &Subject, _| {
            let lambda = subject.parameter("lambda").unwrap();
            let gamma = subject.parameter("gamma").unwrap();
            lambda.ln() + gamma * t.ln()
        });
        let resolved = spec.resolve(None, &pop, QuadratureOptions::default()).unwrap();
        assert_relative_eq!(
            resolved.cumulative(4.0, &subject).unwrap(),
            0.1 * 4.0_f64.powf(1.5),
            max_relative = 1e-12
        );
        // Only cumulative information was supplied.
        assert!(resolved.hazard(4.0, &subject).is_none());
    }

    #[test]
    fn piecewise_tde_integrates_across_the_step() {
        // Exponential baseline, effect switched off at t = 2.
        let subject = Subject::builder("s1")
            .covariate("trt", 1.0)
            .parameter("lambda", 1.0)
            .parameter("trt", 0.7)
            .build();
        let pop = population(&subject);
        let spec = HazardSpec::distribution(Distribution::Exponential);
        let tde = TdeSpec::new().with(
            "trt",
            TimeTransform::custom_with_changepoints(
                |t| if t < 2.0 { 1.0 } else { 0.0 },
                vec![2.0],
            ),
        );
        let resolved = spec
            .resolve(Some(&tde), &pop, QuadratureOptions::default())
            .unwrap();
        assert_eq!(resolved.changepoints(), &[2.0]);

        let t = 5.0;
        let exact = 2.0 * 0.7_f64.exp() + (t - 2.0);
        assert_relative_eq!(
            resolved.cumulative(t, &subject).unwrap(),
            exact,
            max_relative = 1e-8
        );
    }

    #[test]
    fn nan_from_user_evaluator_is_reported() {
        let subject = weibull_subject(0.0);
        let pop = population(&subject);
        let spec = HazardSpec::user(HazardKind::CumHazard, |_, _, _| f64::NAN);
        let resolved = spec.resolve(None, &pop, QuadratureOptions::default()).unwrap();
        assert!(matches!(
            resolved.cumulative(1.0, &subject),
            Err(QuadratureError::NonFiniteIntegrand { .. })
        ));
    }

    #[test]
    fn extras_are_threaded_through() {
        let subject = weibull_subject(0.0);
        let pop = population(&subject);
        let mut extras = Extras::new();
        extras.insert("rate".to_string(), vec![0.25]);
        let spec = HazardSpec::user_with_extras(
            HazardKind::CumHazard,
            |t, _, extras: &Extras| extras["rate"][0] * t,
            extras,
        );
        let resolved = spec.resolve(None, &pop, QuadratureOptions::default()).unwrap();
        assert_relative_eq!(resolved.cumulative(4.0, &subject).unwrap(), 1.0);
    }
}
