//! Closed-form baseline hazards
//!
//! The three standard parametric families used for proportional-hazards
//! simulation. Parameter values are read per subject from the parameter row
//! by name:
//!
//! | family      | h₀(t)             | H₀(t)              | parameters        |
//! |-------------|-------------------|--------------------|-------------------|
//! | exponential | λ                 | λt                 | `lambda`          |
//! | Weibull     | λγt^(γ−1)         | λt^γ               | `lambda`, `gamma` |
//! | Gompertz    | λ·exp(γt)         | (λ/γ)(e^(γt) − 1)  | `lambda`, `gamma` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Near-zero Gompertz shape below which the family degenerates to the
/// exponential, avoiding the 0/0 in H₀.
const GOMPERTZ_SHAPE_FLOOR: f64 = 1e-12;

/// A parametric baseline hazard family
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Exponential,
    Weibull,
    Gompertz,
}

impl Distribution {
    /// Names of the parameters each subject's parameter row must contain
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            Distribution::Exponential => &["lambda"],
            Distribution::Weibull | Distribution::Gompertz => &["lambda", "gamma"],
        }
    }

    /// Baseline hazard h₀(t); `params` in [param_names](Self::param_names) order
    pub fn baseline_hazard(&self, t: f64, params: &[f64]) -> f64 {
        match self {
            Distribution::Exponential => params[0],
            Distribution::Weibull => {
                let (lambda, gamma) = (params[0], params[1]);
                lambda * gamma * t.powf(gamma - 1.0)
            }
            Distribution::Gompertz => {
                let (lambda, gamma) = (params[0], params[1]);
                lambda * (gamma * t).exp()
            }
        }
    }

    /// Baseline cumulative hazard H₀(t)
    pub fn baseline_cum_hazard(&self, t: f64, params: &[f64]) -> f64 {
        match self {
            Distribution::Exponential => params[0] * t,
            Distribution::Weibull => {
                let (lambda, gamma) = (params[0], params[1]);
                lambda * t.powf(gamma)
            }
            Distribution::Gompertz => {
                let (lambda, gamma) = (params[0], params[1]);
                if gamma.abs() < GOMPERTZ_SHAPE_FLOOR {
                    lambda * t
                } else {
                    lambda / gamma * ((gamma * t).exp() - 1.0)
                }
            }
        }
    }

    /// Whether a parameter value is admissible for this family
    pub fn param_is_valid(&self, name: &str, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match (self, name) {
            (_, "lambda") => value > 0.0,
            (Distribution::Weibull, "gamma") => value > 0.0,
            // Gompertz allows a negative shape (declining hazard).
            (Distribution::Gompertz, "gamma") => true,
            _ => true,
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Exponential => write!(f, "exponential"),
            Distribution::Weibull => write!(f, "weibull"),
            Distribution::Gompertz => write!(f, "gompertz"),
        }
    }
}
