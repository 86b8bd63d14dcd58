use std::collections::BTreeMap;

use crate::data::structs::Subject;

/// Fluent builder for [Subject]
///
/// ```
/// use survsim::*;
///
/// let subject = Subject::builder("id_001")
///     .covariate("trt", 1.0)
///     .covariate("age", 54.0)
///     .parameter("lambda", 0.1)
///     .parameter("gamma", 1.5)
///     .parameter("trt", -0.5)
///     .build();
///
/// assert_eq!(subject.covariate("trt"), Some(1.0));
/// assert_eq!(subject.parameter("trt"), Some(-0.5));
/// ```
pub struct SubjectBuilder {
    id: String,
    covariates: BTreeMap<String, f64>,
    parameters: BTreeMap<String, f64>,
}

impl SubjectBuilder {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        SubjectBuilder {
            id: id.into(),
            covariates: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Set a covariate value; a repeated name overwrites the earlier value
    pub fn covariate(mut self, name: impl Into<String>, value: f64) -> Self {
        self.covariates.insert(name.into(), value);
        self
    }

    /// Set a parameter value; a repeated name overwrites the earlier value
    pub fn parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set several parameters at once, e.g. a row shared across subjects
    pub fn parameters<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        for (name, value) in values {
            self.parameters.insert(name.into(), value);
        }
        self
    }

    /// Finalize the subject
    pub fn build(self) -> Subject {
        Subject::new(self.id, self.covariates, self.parameters)
    }
}
