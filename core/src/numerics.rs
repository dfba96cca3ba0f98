//! Numerical services for evolving allele frequency densities.
//!
//! Models never touch a density field directly. They go through the [`Backend`] trait, which
//! exposes exactly the operations a demographic history needs: initialise an equilibrium field,
//! integrate it forward in time for one or two populations, split one population into two, and
//! sample an expected spectrum from it. [`DiffusionBackend`] implements these with a
//! finite-difference solution of the diffusion approximation. Grid extrapolation is provided
//! separately in [`extrapolate`], since it only needs spectra and grid spacings.

use std::fmt;

use crate::{array::Shape, ExpectedSfs};

mod diffusion;
pub use diffusion::{DiffusionBackend, Field};

pub mod extrapolate;

mod grid;
pub use grid::Grid;

mod tridiagonal;

/// Numerical operations on a population-state field.
pub trait Backend {
    /// The population-state field.
    type Field;

    /// Returns the parameter used when extrapolating spectra to infinite grid resolution.
    ///
    /// This should decrease towards zero as `pts` increases.
    fn extrapolation_point(&self, pts: usize) -> Result<f64, NumericsError>;

    /// Creates a single-population field at neutral equilibrium on a grid with `pts` points.
    fn initialize(&self, pts: usize) -> Result<Self::Field, NumericsError>;

    /// Integrates a single-population field for `duration` with relative size `nu`.
    fn integrate_one(
        &self,
        field: &mut Self::Field,
        duration: f64,
        nu: f64,
    ) -> Result<(), NumericsError>;

    /// Integrates a two-population field for `duration`.
    ///
    /// The populations have relative sizes `nu1` and `nu2`, and `m12` is the migration rate into
    /// population 1 from population 2, and vice versa for `m21`.
    fn integrate_two(
        &self,
        field: &mut Self::Field,
        duration: f64,
        nu1: f64,
        nu2: f64,
        m12: f64,
        m21: f64,
    ) -> Result<(), NumericsError>;

    /// Returns the expected spectrum of the field for the given number of sampled chromosomes.
    fn sample(
        &self,
        field: &Self::Field,
        sample_sizes: &[usize],
    ) -> Result<ExpectedSfs, NumericsError>;

    /// Splits a single-population field into two identical populations.
    fn split(&self, field: Self::Field) -> Result<Self::Field, NumericsError>;
}

/// An error associated with numerical operations.
#[derive(Clone, Debug, PartialEq)]
pub enum NumericsError {
    /// A field had the wrong number of populations for the operation.
    DimensionMismatch {
        /// The number of populations required by the operation.
        expected: usize,
        /// The number of populations in the field.
        found: usize,
    },
    /// Grid points used for extrapolation were not distinct.
    DuplicateExtrapolationPoints,
    /// No spectra were provided for extrapolation.
    EmptyExtrapolation,
    /// The number of spectra and extrapolation points differed.
    ExtrapolationLengthMismatch {
        /// The number of spectra.
        spectra: usize,
        /// The number of extrapolation points.
        points: usize,
    },
    /// Spectra provided for extrapolation had different shapes.
    ExtrapolationShapeMismatch {
        /// Shape of the first spectrum.
        expected: Shape,
        /// Shape of the offending spectrum.
        found: Shape,
    },
    /// A grid had too few points.
    GridTooSmall {
        /// The requested number of points.
        pts: usize,
        /// The minimum number of points.
        min: usize,
    },
    /// A duration was negative or not finite.
    InvalidDuration(f64),
    /// A migration rate was negative or not finite.
    InvalidMigrationRate(f64),
    /// A relative population size was not positive or not finite.
    InvalidPopulationSize(f64),
    /// The computation produced a value that is not finite.
    NonFinite,
    /// Integrating over a duration would take more time steps than allowed.
    TooManyTimeSteps {
        /// The duration of the integration.
        duration: f64,
        /// The maximum number of time steps.
        max: usize,
    },
}

impl NumericsError {
    pub(crate) fn check_duration(duration: f64) -> Result<(), Self> {
        if duration.is_finite() && duration >= 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidDuration(duration))
        }
    }

    pub(crate) fn check_migration_rate(m: f64) -> Result<(), Self> {
        if m.is_finite() && m >= 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidMigrationRate(m))
        }
    }

    pub(crate) fn check_population_size(nu: f64) -> Result<(), Self> {
        if nu.is_finite() && nu > 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidPopulationSize(nu))
        }
    }
}

impl fmt::Display for NumericsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericsError::DimensionMismatch { expected, found } => write!(
                f,
                "operation requires {expected} population(s), field has {found}"
            ),
            NumericsError::DuplicateExtrapolationPoints => {
                f.write_str("grid sizes used for extrapolation must be distinct")
            }
            NumericsError::EmptyExtrapolation => {
                f.write_str("cannot extrapolate from zero grid sizes")
            }
            NumericsError::ExtrapolationLengthMismatch { spectra, points } => write!(
                f,
                "cannot extrapolate {spectra} spectra from {points} grid spacings"
            ),
            NumericsError::ExtrapolationShapeMismatch { expected, found } => write!(
                f,
                "cannot extrapolate spectra with shapes {expected} and {found}"
            ),
            NumericsError::GridTooSmall { pts, min } => {
                write!(f, "grid with {pts} points is too small, minimum is {min}")
            }
            NumericsError::InvalidDuration(t) => write!(f, "invalid duration {t}"),
            NumericsError::InvalidMigrationRate(m) => write!(f, "invalid migration rate {m}"),
            NumericsError::InvalidPopulationSize(nu) => {
                write!(f, "invalid relative population size {nu}")
            }
            NumericsError::NonFinite => {
                f.write_str("numerical integration produced non-finite values")
            }
            NumericsError::TooManyTimeSteps { duration, max } => write!(
                f,
                "integrating for {duration} requires more than {max} time steps"
            ),
        }
    }
}

impl std::error::Error for NumericsError {}
