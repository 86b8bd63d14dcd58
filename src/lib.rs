//! survsim — simulation of survival times under general hazard models
//!
//! Generates time-to-event data by the inversion method: draw
//! `U ~ Uniform(0,1)` and solve `H(t) = -ln(U)` for `t`, where `H` is the
//! cumulative hazard. The hazard may be one of the standard parametric
//! families (with closed-form `H`), or an arbitrary user function of time,
//! covariates, and parameters on the hazard, log-hazard, cumulative-hazard,
//! or log-cumulative-hazard scale; when no closed form exists, `H` is
//! computed by adaptive Gauss–Kronrod quadrature and inverted with Brent's
//! method.
//!
//! ```
//! use survsim::*;
//!
//! // Two-arm Weibull proportional-hazards model with log(HR) = -0.5.
//! let population = Population::new(
//!     (0..100)
//!         .map(|i| {
//!             Subject::builder(format!("id_{i}"))
//!                 .covariate("trt", (i % 2) as f64)
//!                 .parameter("lambda", 0.1)
//!                 .parameter("gamma", 1.5)
//!                 .parameter("trt", -0.5)
//!                 .build()
//!         })
//!         .collect(),
//! );
//!
//! let hazard = HazardSpec::distribution(Distribution::Weibull);
//! let config = SimulationConfig {
//!     maxt: Some(5.0),
//!     seed: Some(54321),
//!     ..Default::default()
//! };
//!
//! let events = simulate(&population, &hazard, None, &config).unwrap();
//! assert_eq!(events.len(), 100);
//! ```

pub mod data;
pub mod error;
pub mod hazard;
pub mod quadrature;
pub mod root;
pub mod simulator;

pub use crate::data::{Population, SimulatedEvent, Status, Subject, SubjectBuilder};
pub use crate::hazard::{
    Distribution, Extras, HazardKind, HazardSpec, ResolvedHazard, TdeSpec, TimeTransform,
};
pub use crate::simulator::{simulate, BracketPolicy, SimulationConfig};
pub use error::SurvsimError;

pub mod prelude {
    pub mod data {
        pub use crate::data::{Population, SimulatedEvent, Status, Subject, SubjectBuilder};
    }
    pub mod hazard {
        pub use crate::hazard::{
            Distribution, Extras, HazardKind, HazardSpec, ResolvedHazard, TdeSpec, TimeTransform,
        };
    }
    pub mod simulator {
        pub use crate::simulator::{simulate, BracketPolicy, ConfigError, SimulationConfig};
    }

    pub use crate::error::{SubjectError, SurvsimError};
    pub use crate::quadrature::{integrate, QuadratureError, QuadratureOptions};
    pub use crate::root::{brent, RootError, RootOptions};
}
