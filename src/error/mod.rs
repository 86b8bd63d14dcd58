use thiserror::Error;

use crate::hazard::HazardError;
use crate::quadrature::QuadratureError;
use crate::root::RootError;
use crate::simulator::ConfigError;

/// Top-level error for a simulation call.
///
/// Configuration and hazard-resolution failures are detected before any
/// simulation work begins; per-subject numerical failures are wrapped with
/// the offending subject id so no error is ever unattributable.
#[derive(Error, Debug)]
pub enum SurvsimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hazard(#[from] HazardError),

    #[error("subject {id}: {source}")]
    Subject { id: String, source: SubjectError },
}

/// A numerical failure confined to one subject's root find
#[derive(Error, Debug, Clone)]
pub enum SubjectError {
    /// The hazard evaluator produced a non-finite value during integration
    #[error(transparent)]
    Quadrature(#[from] QuadratureError),

    /// The root search failed (no sign change, or iteration budget)
    #[error(transparent)]
    Root(#[from] RootError),
}
