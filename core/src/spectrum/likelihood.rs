//! Likelihood of observed spectra under expected spectra.
//!
//! Both functions only consider unmasked entries; see [`Spectrum`](super::Spectrum).

use std::fmt;

use crate::{array::Shape, utils::ln_gamma, ExpectedSfs, Scs};

/// Returns the scaling of the model that maximises the Poisson likelihood of the data.
///
/// This is the ratio of the unmasked data sum to the unmasked model sum.
pub fn optimal_theta(model: &ExpectedSfs, data: &Scs) -> Result<f64, LikelihoodError> {
    check_shapes(model, data)?;

    Ok(data.sum_unmasked() / model.sum_unmasked())
}

/// Returns the multinomial log-likelihood of the data given the model.
///
/// The model is first scaled by [`optimal_theta`], after which the likelihood is the product of
/// independent Poisson likelihoods of each unmasked entry. Since the scaling is optimal, this
/// equals the multinomial log-likelihood up to a constant depending only on the data.
pub fn log_likelihood_multinomial(model: &ExpectedSfs, data: &Scs) -> Result<f64, LikelihoodError> {
    let theta = optimal_theta(model, data)?;

    Ok(model
        .iter_unmasked()
        .zip(data.iter_unmasked())
        .map(|(&m, &d)| poisson_ln_pmf(m * theta, d))
        .sum())
}

fn poisson_ln_pmf(lambda: f64, k: f64) -> f64 {
    if k == 0.0 {
        -lambda
    } else if lambda <= 0.0 {
        f64::NEG_INFINITY
    } else {
        k * lambda.ln() - lambda - ln_gamma(k + 1.0)
    }
}

fn check_shapes(model: &ExpectedSfs, data: &Scs) -> Result<(), LikelihoodError> {
    if model.shape() == data.shape() {
        Ok(())
    } else {
        Err(LikelihoodError::ShapeMismatch {
            model: model.shape().clone(),
            data: data.shape().clone(),
        })
    }
}

/// An error associated with likelihood calculation.
#[derive(Debug, Eq, PartialEq)]
pub enum LikelihoodError {
    /// Model and data spectra have different shapes.
    ShapeMismatch {
        /// Shape of the model spectrum.
        model: Shape,
        /// Shape of the data spectrum.
        data: Shape,
    },
}

impl fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikelihoodError::ShapeMismatch { model, data } => write!(
                f,
                "model spectrum with shape {model} does not match data spectrum with shape {data}"
            ),
        }
    }
}

impl std::error::Error for LikelihoodError {}
