//! Fitting demographic models to observed spectra.
//!
//! A fit starts from the initial guess of a [`ModelDescriptor`], randomly perturbs it, and then
//! maximises the multinomial log-likelihood of the data over the logarithm of the parameters,
//! subject to the bounds of the descriptor.

use std::fmt;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    model::ModelError,
    numerics::Backend,
    registry::ModelDescriptor,
    spectrum::likelihood::{log_likelihood_multinomial, LikelihoodError},
    ExpectedSfs, Scs,
};

mod optimize;

pub mod perturb;
pub use perturb::perturb;

/// Options for fitting a model.
#[derive(Clone, Debug, PartialEq)]
pub struct FitOptions {
    /// Grid sizes used for extrapolation.
    pub pts: Vec<usize>,
    /// Maximum number of optimizer iterations.
    pub max_iterations: u64,
    /// Perturbation of the initial guess, in factors of two.
    pub fold: f64,
    /// Seed for the random number generator, or `None` to seed from the system.
    pub seed: Option<u64>,
}

impl FitOptions {
    /// Returns a random number generator seeded according to the options.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            pts: vec![110, 120, 130],
            max_iterations: 10,
            fold: 1.0,
            seed: None,
        }
    }
}

/// The outcome of fitting a model to a spectrum.
#[derive(Clone, Debug, PartialEq)]
pub struct FitResult {
    /// Log-likelihood at the initial guess, before perturbation.
    pub initial_log_likelihood: f64,
    /// Log-likelihood at the optimized parameters.
    pub log_likelihood: f64,
    /// Optimized parameters.
    pub params: Vec<f64>,
    /// Perturbed starting point of the optimization.
    pub start: Vec<f64>,
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "{}\t[{params}]\t", self.log_likelihood)
    }
}

/// Fits models to spectra using a numerical backend.
#[derive(Clone, Debug)]
pub struct Fitter<B> {
    backend: B,
    options: FitOptions,
}

impl<B> Fitter<B>
where
    B: Backend,
{
    /// Evaluates the model of the descriptor at `params` with the sample sizes of `data`.
    pub fn expected(
        &self,
        descriptor: &ModelDescriptor,
        params: &[f64],
        data: &Scs,
    ) -> Result<ExpectedSfs, FitError> {
        Ok(descriptor.model().evaluate_extrapolated(
            &self.backend,
            params,
            &data.sample_sizes(),
            &self.options.pts,
        )?)
    }

    /// Fits the model of the descriptor to the data.
    pub fn fit<R>(
        &self,
        descriptor: &ModelDescriptor,
        data: &Scs,
        rng: &mut R,
    ) -> Result<FitResult, FitError>
    where
        R: Rng + ?Sized,
    {
        if data.sum_unmasked() <= 0.0 {
            return Err(FitError::EmptyData);
        }

        let initial_log_likelihood = self.log_likelihood(descriptor, descriptor.guess(), data)?;
        log::debug!(
            "Log-likelihood at initial guess {:?}: {initial_log_likelihood}",
            descriptor.guess()
        );

        let start = perturb(
            descriptor.guess(),
            descriptor.lower(),
            descriptor.upper(),
            self.options.fold,
            rng,
        );
        log::debug!("Starting optimization from {start:?}");

        let params = optimize::optimize(self, descriptor, data, &start)?;
        let log_likelihood = self.log_likelihood(descriptor, &params, data)?;
        log::debug!("Optimized parameters {params:?} with log-likelihood {log_likelihood}");

        Ok(FitResult {
            initial_log_likelihood,
            log_likelihood,
            params,
            start,
        })
    }

    /// Returns the multinomial log-likelihood of the data at `params`.
    pub fn log_likelihood(
        &self,
        descriptor: &ModelDescriptor,
        params: &[f64],
        data: &Scs,
    ) -> Result<f64, FitError> {
        let model = self.expected(descriptor, params, data)?;
        let log_likelihood = log_likelihood_multinomial(&model, data)?;

        if log_likelihood.is_nan() {
            Err(FitError::NonFiniteLikelihood)
        } else {
            Ok(log_likelihood)
        }
    }

    /// Creates a new fitter.
    pub fn new(backend: B, options: FitOptions) -> Self {
        Self { backend, options }
    }

    /// Returns the options.
    pub fn options(&self) -> &FitOptions {
        &self.options
    }
}

/// An error associated with fitting a model.
#[derive(Debug)]
pub enum FitError {
    /// The data contains no polymorphic sites.
    EmptyData,
    /// Likelihood calculation failed.
    Likelihood(LikelihoodError),
    /// Model evaluation failed.
    Model(ModelError),
    /// The likelihood could not be calculated.
    NonFiniteLikelihood,
    /// The optimizer failed.
    Optimizer(String),
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::EmptyData => f.write_str("spectrum contains no polymorphic sites"),
            FitError::Likelihood(e) => write!(f, "{e}"),
            FitError::Model(e) => write!(f, "{e}"),
            FitError::NonFiniteLikelihood => f.write_str("log-likelihood is not a number"),
            FitError::Optimizer(e) => write!(f, "optimizer failed: {e}"),
        }
    }
}

impl std::error::Error for FitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FitError::Likelihood(e) => Some(e),
            FitError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LikelihoodError> for FitError {
    fn from(e: LikelihoodError) -> Self {
        Self::Likelihood(e)
    }
}

impl From<ModelError> for FitError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}
