//! Simulation driver
//!
//! Iterates over the population, draws one uniform variate per subject from
//! the shared stream, and inverts `H(t) = -ln(U)` with the bracketed root
//! solver. Uniform draws happen sequentially in input order so a fixed seed
//! reproduces the batch exactly; the root finds themselves are independent
//! and are dispatched across the rayon pool, with the resolved hazard and
//! TDE specification shared read-only. Output order always equals input
//! order regardless of internal parallelism.

use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Population, SimulatedEvent, Status, Subject};
use crate::error::{SubjectError, SurvsimError};
use crate::hazard::{HazardSpec, ResolvedHazard, TdeSpec};
use crate::quadrature::QuadratureOptions;
use crate::root::{brent, RootError, RootOptions};

/// Error type for simulation configuration
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("invalid search interval [{lower}, {upper}]: bounds must satisfy 0 < lower < upper")]
    InvalidInterval { lower: f64, upper: f64 },

    #[error(
        "invalid maxt = {maxt}: must be positive, finite, and not below the search interval \
         lower bound"
    )]
    InvalidMaxt { maxt: f64 },
}

/// What to do when a subject's root search finds no sign change over the
/// search interval.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BracketPolicy {
    /// Abort the batch with a per-subject error. The default: a bracket
    /// failure usually means the interval is misconfigured for the scale of
    /// the problem, and silently censoring would hide that.
    #[default]
    Fatal,
    /// Treat the subject as administratively censored at `maxt` (or at the
    /// interval's upper bound when `maxt` is unset).
    CensorAtMax,
}

/// Controls for one simulation call
///
/// `interval` must bound all plausible event times: too narrow and the root
/// solver cannot bracket the solution, too wide and integration work is
/// wasted on the tails.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Search bracket `(lower, upper)` for the root finder, `0 < lower < upper`
    pub interval: (f64, f64),
    /// Administrative right-censoring time; `None` = no censoring
    pub maxt: Option<f64>,
    /// Seed for the uniform-draw stream; `None` draws from the OS
    pub seed: Option<u64>,
    /// Tolerances for the adaptive integrator
    pub quadrature: QuadratureOptions,
    /// Tolerances for the root solver
    pub root: RootOptions,
    /// Handling of bracket failures
    pub bracket_policy: BracketPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            interval: (1e-8, 500.0),
            maxt: None,
            seed: None,
            quadrature: QuadratureOptions::default(),
            root: RootOptions::default(),
            bracket_policy: BracketPolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        SimulationConfig::default()
    }

    /// Check the configuration before any simulation work
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lower, upper) = self.interval;
        if !(lower.is_finite() && upper.is_finite()) || lower <= 0.0 || lower >= upper {
            return Err(ConfigError::InvalidInterval { lower, upper });
        }
        if let Some(maxt) = self.maxt {
            if !maxt.is_finite() || maxt <= 0.0 || maxt < lower {
                return Err(ConfigError::InvalidMaxt { maxt });
            }
        }
        Ok(())
    }
}

/// Simulate one event or censoring time per subject.
///
/// Per subject `i` (in input order): draw `Uᵢ ~ Uniform(0,1)`, set
/// `targetᵢ = -ln(Uᵢ)`, and solve `H(t) = targetᵢ` over `config.interval`
/// with Brent's method, where `H` is the resolved cumulative hazard for
/// that subject. A solution beyond `maxt` is reported as a censoring at
/// `maxt`; bracket failures follow [BracketPolicy].
///
/// The call either returns the full batch or fails atomically with a typed
/// error; there is no partial-result mode.
///
/// ```
/// use survsim::*;
///
/// let population = Population::new(
///     (0..20)
///         .map(|i| {
///             Subject::builder(format!("id_{i}"))
///                 .parameter("lambda", 0.1)
///                 .parameter("gamma", 1.5)
///                 .build()
///         })
///         .collect(),
/// );
/// let hazard = HazardSpec::distribution(Distribution::Weibull);
/// let config = SimulationConfig {
///     maxt: Some(5.0),
///     seed: Some(907),
///     ..Default::default()
/// };
///
/// let events = simulate(&population, &hazard, None, &config).unwrap();
/// assert_eq!(events.len(), 20);
/// ```
pub fn simulate(
    population: &Population,
    hazard: &HazardSpec,
    tde: Option<&TdeSpec>,
    config: &SimulationConfig,
) -> Result<Vec<SimulatedEvent>, SurvsimError> {
    config.validate()?;
    let resolved = hazard.resolve(tde, population, config.quadrature)?;

    let subjects = population.subjects();

    // All uniforms are drawn sequentially in input order before any root
    // find runs, so the stream position is independent of thread scheduling.
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let targets: Vec<f64> = subjects
        .iter()
        .map(|_| {
            let u: f64 = rng.random();
            -u.max(f64::MIN_POSITIVE).ln()
        })
        .collect();

    subjects
        .par_iter()
        .zip(targets.par_iter())
        .map(|(subject, &target)| simulate_subject(subject, target, &resolved, config))
        .collect()
}

/// One subject's inversion: root find, censoring, record assembly.
fn simulate_subject(
    subject: &Subject,
    target: f64,
    resolved: &ResolvedHazard,
    config: &SimulationConfig,
) -> Result<SimulatedEvent, SurvsimError> {
    let (lower, upper) = config.interval;
    let objective = |t: f64| resolved.cumulative(t, subject).map(|h| h - target);

    match brent(objective, lower, upper, &config.root) {
        Ok(t_star) => match config.maxt {
            Some(maxt) if t_star > maxt => Ok(SimulatedEvent::new(
                subject.id().clone(),
                maxt,
                Status::Censored,
            )),
            _ => Ok(SimulatedEvent::new(
                subject.id().clone(),
                t_star,
                Status::Event,
            )),
        },
        Err(RootError::NoSignChange { .. })
            if config.bracket_policy == BracketPolicy::CensorAtMax =>
        {
            let cut = config.maxt.unwrap_or(upper);
            Ok(SimulatedEvent::new(
                subject.id().clone(),
                cut,
                Status::Censored,
            ))
        }
        Err(RootError::Quadrature(source)) => Err(SurvsimError::Subject {
            id: subject.id().clone(),
            source: SubjectError::Quadrature(source),
        }),
        Err(source) => Err(SurvsimError::Subject {
            id: subject.id().clone(),
            source: SubjectError::Root(source),
        }),
    }
}
