#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Demographic models and likelihood fitting for site frequency spectra.
//!
//! This serves as the core library implementation for the `demfit` CLI, but can also be used as a
//! free-standing library for evaluating and fitting demographic models.
//!
//! # Overview
//!
//! A [`Model`] describes a demographic history as a sequence of events, such as size changes,
//! population splits, and periods of migration. Models are evaluated by a numerical
//! [`Backend`](numerics::Backend) to give an expected site frequency spectrum ([`ExpectedSfs`]),
//! which can be compared to an observed site count spectrum ([`Scs`]) using the multinomial
//! likelihood. The built-in models are collected in a [`Registry`] together with initial guesses
//! and bounds for their parameters, and a [`Fitter`] optimises the parameters of a model for a
//! given spectrum.
//!
//! # Example
//!
//! Evaluate the expected spectrum of a split with migration, and calculate the likelihood of some
//! data under it.
//!
//! ```
//! use demfit_core::{
//!     numerics::DiffusionBackend, spectrum::likelihood::log_likelihood_multinomial, Registry, Scs,
//! };
//!
//! let registry = Registry::builtin()?;
//! let descriptor = registry.resolve("IM_2params")?;
//!
//! let expected = descriptor
//!     .model()
//!     .evaluate_extrapolated(&DiffusionBackend, &[0.5, 1.0], &[2, 2], &[20, 25, 30])?;
//! assert_eq!(expected.shape().as_ref(), [3, 3]);
//!
//! let data = Scs::new([0., 10., 2., 10., 5., 10., 2., 10., 0.], [3, 3])?;
//! let log_likelihood = log_likelihood_multinomial(&expected, &data)?;
//! assert!(log_likelihood < 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(test)]
#[macro_use]
pub(crate) mod approx;

pub mod array;
pub use array::Array;

pub mod fit;
pub use fit::{FitOptions, FitResult, Fitter};

pub mod model;
pub use model::Model;

pub mod numerics;

pub mod registry;
pub use registry::{ModelDescriptor, Registry};

pub mod spectrum;
pub use spectrum::{ExpectedSfs, Scs, Spectrum};

pub mod utils;
