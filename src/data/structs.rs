use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The main data container for a simulation batch
///
/// [Population] is a collection of [Subject] instances, one per individual
/// to simulate. Subjects are immutable once the simulation starts; the
/// engine only reads them.
///
/// # Examples
///
/// ```
/// use survsim::*;
///
/// let subject1 = Subject::builder("id_001")
///     .covariate("trt", 1.0)
///     .parameter("lambda", 0.1)
///     .parameter("gamma", 1.5)
///     .build();
///
/// let subject2 = Subject::builder("id_002")
///     .covariate("trt", 0.0)
///     .parameter("lambda", 0.1)
///     .parameter("gamma", 1.5)
///     .build();
///
/// let mut population = Population::new(vec![subject1]);
/// population.add_subject(subject2);
/// assert_eq!(population.len(), 2);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Population {
    subjects: Vec<Subject>,
}

impl Population {
    /// Constructs a new [Population] from a vector of [Subject]s
    pub fn new(subjects: Vec<Subject>) -> Self {
        Population { subjects }
    }

    /// Get a vector of references to all subjects, in input order
    pub fn subjects(&self) -> Vec<&Subject> {
        self.subjects.iter().collect()
    }

    /// Add a subject to the population
    pub fn add_subject(&mut self, subject: Subject) {
        self.subjects.push(subject);
    }

    /// Get a specific subject by ID
    pub fn get_subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.id() == id)
    }

    /// Number of subjects
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Whether the population is empty
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// One individual: an id, a covariate row, and a parameter row
///
/// Covariates are the individual's observed characteristics (e.g. a binary
/// treatment indicator); parameters are the hazard model's coefficients and
/// baseline parameters for that individual. The two rows share a name space
/// deliberately: a parameter whose name matches a covariate name is treated
/// as that covariate's log-hazard-ratio coefficient by the distribution
/// hazards.
///
/// Construct with [Subject::builder].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subject {
    id: String,
    covariates: BTreeMap<String, f64>,
    parameters: BTreeMap<String, f64>,
}

impl Subject {
    pub(crate) fn new(
        id: String,
        covariates: BTreeMap<String, f64>,
        parameters: BTreeMap<String, f64>,
    ) -> Self {
        Subject {
            id,
            covariates,
            parameters,
        }
    }

    /// Create a new [SubjectBuilder](crate::data::builder::SubjectBuilder)
    pub fn builder(id: impl Into<String>) -> crate::data::builder::SubjectBuilder {
        crate::data::builder::SubjectBuilder::new(id)
    }

    /// The subject's identifier
    pub fn id(&self) -> &String {
        &self.id
    }

    /// Look up a covariate value by name
    pub fn covariate(&self, name: &str) -> Option<f64> {
        self.covariates.get(name).copied()
    }

    /// Look up a parameter value by name
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    /// Iterate over `(name, value)` covariate pairs in name order
    pub fn covariates(&self) -> impl Iterator<Item = (&str, f64)> {
        self.covariates
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// Iterate over `(name, value)` parameter pairs in name order
    pub fn parameters(&self) -> impl Iterator<Item = (&str, f64)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Subject {} ({} covariates, {} parameters)",
            self.id,
            self.covariates.len(),
            self.parameters.len()
        )
    }
}

/// Outcome indicator for a simulated record
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Administratively censored at the follow-up limit
    Censored,
    /// The event was observed
    Event,
}

impl Status {
    /// Conventional numeric coding: 0 = censored, 1 = event
    pub fn code(&self) -> u8 {
        match self {
            Status::Censored => 0,
            Status::Event => 1,
        }
    }
}

/// One row of simulation output: `(id, eventtime, status)`
///
/// Created once by the driver, immutable, returned to the caller in input
/// subject order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimulatedEvent {
    id: String,
    eventtime: f64,
    status: Status,
}

impl SimulatedEvent {
    pub(crate) fn new(id: String, eventtime: f64, status: Status) -> Self {
        SimulatedEvent {
            id,
            eventtime,
            status,
        }
    }

    /// The subject this record belongs to
    pub fn id(&self) -> &String {
        &self.id
    }

    /// The simulated event or censoring time
    pub fn eventtime(&self) -> f64 {
        self.eventtime
    }

    /// Whether the record is an event or a censoring
    pub fn status(&self) -> Status {
        self.status
    }
}

impl fmt::Display for SimulatedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: eventtime = {:.6}, status = {}",
            self.id,
            self.eventtime,
            self.status.code()
        )
    }
}
