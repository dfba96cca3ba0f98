//! Demographic models.
//!
//! A [`Model`] is an ordered list of demographic [`Event`]s over named parameters. Every model is
//! interpreted by the same evaluator: starting from a single population at equilibrium, each event
//! is applied in turn to a population-state field by a [`Backend`], and the expected spectrum is
//! sampled from the final field. The built-in models are defined in [`library`].

use std::fmt;

use crate::{
    numerics::{extrapolate::log_extrapolate, Backend, NumericsError},
    ExpectedSfs,
};

pub mod library;

/// An event argument, either a model parameter or a fixed constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// The model parameter at the given position.
    Param(usize),
    /// A constant.
    Fixed(f64),
}

impl Value {
    fn resolve(self, params: &[f64]) -> f64 {
        match self {
            Value::Param(i) => params[i],
            Value::Fixed(x) => x,
        }
    }
}

/// A demographic event.
///
/// Durations are in units of `2N` generations and population sizes are relative to the reference
/// population. Migration rates are scaled by `2N`, with `m12` the rate of migration into population
/// 1 from population 2.
#[derive(Clone, Debug, PartialEq)]
pub enum Event<T> {
    /// A single population evolving with relative size `nu`.
    OnePop {
        /// Duration of the epoch.
        duration: T,
        /// Relative population size.
        nu: T,
    },
    /// The single population splits into two populations.
    Split,
    /// Two populations evolving with possibly asymmetric migration.
    TwoPops {
        /// Duration of the epoch.
        duration: T,
        /// Relative size of population 1.
        nu1: T,
        /// Relative size of population 2.
        nu2: T,
        /// Migration rate into population 1 from population 2.
        m12: T,
        /// Migration rate into population 2 from population 1.
        m21: T,
    },
}

impl<T> Event<T> {
    fn values(&self) -> Vec<&T> {
        match self {
            Event::OnePop { duration, nu } => vec![duration, nu],
            Event::Split => Vec::new(),
            Event::TwoPops {
                duration,
                nu1,
                nu2,
                m12,
                m21,
            } => vec![duration, nu1, nu2, m12, m21],
        }
    }
}

impl Event<Value> {
    fn resolve(&self, params: &[f64]) -> Event<f64> {
        match *self {
            Event::OnePop { duration, nu } => Event::OnePop {
                duration: duration.resolve(params),
                nu: nu.resolve(params),
            },
            Event::Split => Event::Split,
            Event::TwoPops {
                duration,
                nu1,
                nu2,
                m12,
                m21,
            } => Event::TwoPops {
                duration: duration.resolve(params),
                nu1: nu1.resolve(params),
                nu2: nu2.resolve(params),
                m12: m12.resolve(params),
                m21: m21.resolve(params),
            },
        }
    }
}

/// A parametric demographic model.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    name: &'static str,
    params: Vec<&'static str>,
    events: Vec<Event<Value>>,
}

impl Model {
    /// Returns the number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Evaluates the expected spectrum of the model on a single grid with `pts` points.
    pub fn evaluate<B>(
        &self,
        backend: &B,
        params: &[f64],
        sample_sizes: &[usize],
        pts: usize,
    ) -> Result<ExpectedSfs, ModelError>
    where
        B: Backend,
    {
        let events = self.resolve(params)?;
        self.check_sample_sizes(sample_sizes)?;

        let mut field = backend.initialize(pts)?;
        for event in events {
            match event {
                Event::OnePop { duration, nu } => backend.integrate_one(&mut field, duration, nu)?,
                Event::Split => field = backend.split(field)?,
                Event::TwoPops {
                    duration,
                    nu1,
                    nu2,
                    m12,
                    m21,
                } => backend.integrate_two(&mut field, duration, nu1, nu2, m12, m21)?,
            }
        }

        Ok(backend.sample(&field, sample_sizes)?)
    }

    /// Evaluates the model on each grid size in `pts`, and extrapolates the resulting spectra to
    /// infinite grid resolution.
    pub fn evaluate_extrapolated<B>(
        &self,
        backend: &B,
        params: &[f64],
        sample_sizes: &[usize],
        pts: &[usize],
    ) -> Result<ExpectedSfs, ModelError>
    where
        B: Backend,
    {
        let spectra = pts
            .iter()
            .map(|&pts| self.evaluate(backend, params, sample_sizes, pts))
            .collect::<Result<Vec<_>, _>>()?;

        let points = pts
            .iter()
            .map(|&pts| backend.extrapolation_point(pts))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(log_extrapolate(&spectra, &points)?)
    }

    /// Returns the events of the model.
    pub fn events(&self) -> &[Event<Value>] {
        &self.events
    }

    /// Returns the name of the model.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Creates a new model after checking that it is well-formed.
    ///
    /// Every parameter must be used by some event, and every parameter referenced by an event must
    /// exist. A model may split into two populations at most once, with single-population events
    /// before the split and two-population events after.
    pub fn new(
        name: &'static str,
        params: Vec<&'static str>,
        events: Vec<Event<Value>>,
    ) -> Result<Self, ModelError> {
        let model = Self::new_unchecked(name, params, events);
        model.validate()?;
        Ok(model)
    }

    pub(crate) fn new_unchecked(
        name: &'static str,
        params: Vec<&'static str>,
        events: Vec<Event<Value>>,
    ) -> Self {
        Self {
            name,
            params,
            events,
        }
    }

    /// Returns the names of the parameters, in order.
    pub fn params(&self) -> &[&'static str] {
        &self.params
    }

    /// Returns the number of populations sampled at the end of the model.
    pub fn populations(&self) -> usize {
        if self.events.contains(&Event::Split) {
            2
        } else {
            1
        }
    }

    /// Substitutes parameters into the events of the model.
    pub fn resolve(&self, params: &[f64]) -> Result<Vec<Event<f64>>, ModelError> {
        if params.len() != self.arity() {
            return Err(ModelError::InvalidParameterCount {
                model: self.name.to_string(),
                expected: self.arity(),
                found: params.len(),
            });
        }

        Ok(self.events.iter().map(|e| e.resolve(params)).collect())
    }

    fn check_sample_sizes(&self, sample_sizes: &[usize]) -> Result<(), ModelError> {
        if sample_sizes.len() == self.populations() {
            Ok(())
        } else {
            Err(ModelError::SampleSizeMismatch {
                expected: self.populations(),
                found: sample_sizes.len(),
            })
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidModel {
            model: self.name.to_string(),
            reason,
        };

        let mut used = vec![false; self.arity()];
        for value in self.events.iter().flat_map(Event::values) {
            if let Value::Param(i) = *value {
                match used.get_mut(i) {
                    Some(used) => *used = true,
                    None => return Err(invalid(format!("event uses undeclared parameter {i}"))),
                }
            }
        }
        if let Some(i) = used.iter().position(|used| !used) {
            return Err(invalid(format!(
                "parameter '{}' is not used by any event",
                self.params[i]
            )));
        }

        let mut split = false;
        for event in self.events.iter() {
            match (event, split) {
                (Event::OnePop { .. }, true) => {
                    return Err(invalid("single-population event after split".to_string()))
                }
                (Event::TwoPops { .. }, false) => {
                    return Err(invalid("two-population event before split".to_string()))
                }
                (Event::Split, true) => return Err(invalid("more than one split".to_string())),
                (Event::Split, false) => split = true,
                _ => (),
            }
        }

        Ok(())
    }
}

/// An error associated with evaluating a model.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelError {
    /// The model is not well-formed.
    InvalidModel {
        /// Name of the model.
        model: String,
        /// Description of the problem.
        reason: String,
    },
    /// The number of parameters does not match the model.
    InvalidParameterCount {
        /// Name of the model.
        model: String,
        /// Number of parameters of the model.
        expected: usize,
        /// Number of parameters provided.
        found: usize,
    },
    /// Numerical evaluation failed.
    Numerics(NumericsError),
    /// The number of sample sizes does not match the number of populations in the model.
    SampleSizeMismatch {
        /// Number of populations in the model.
        expected: usize,
        /// Number of sample sizes provided.
        found: usize,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidModel { model, reason } => {
                write!(f, "invalid model '{model}': {reason}")
            }
            ModelError::InvalidParameterCount {
                model,
                expected,
                found,
            } => write!(
                f,
                "model '{model}' takes {expected} parameter(s), but {found} were provided"
            ),
            ModelError::Numerics(e) => write!(f, "{e}"),
            ModelError::SampleSizeMismatch { expected, found } => write!(
                f,
                "model has {expected} population(s), but {found} sample size(s) were provided"
            ),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Numerics(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NumericsError> for ModelError {
    fn from(e: NumericsError) -> Self {
        Self::Numerics(e)
    }
}
