//! Extrapolation of spectra to infinite grid resolution.

use crate::{array::Array, ExpectedSfs};

use super::NumericsError;

/// Extrapolates spectra computed on grids of different resolution to a grid spacing of zero.
///
/// `points` holds the extrapolation parameter for each spectrum, as given by
/// [`Backend::extrapolation_point`](super::Backend::extrapolation_point). The extrapolant is the
/// Lagrange polynomial through all spectra, so that `n` spectra give an extrapolation of order
/// `n - 1`. Entries that are positive in every spectrum are extrapolated in log space, which keeps
/// them positive; all other entries are extrapolated directly.
///
/// A single spectrum is returned unchanged.
pub fn log_extrapolate(
    spectra: &[ExpectedSfs],
    points: &[f64],
) -> Result<ExpectedSfs, NumericsError> {
    let Some(first) = spectra.first() else {
        return Err(NumericsError::EmptyExtrapolation);
    };

    if spectra.len() != points.len() {
        return Err(NumericsError::ExtrapolationLengthMismatch {
            spectra: spectra.len(),
            points: points.len(),
        });
    }

    if let Some(other) = spectra.iter().find(|sfs| sfs.shape() != first.shape()) {
        return Err(NumericsError::ExtrapolationShapeMismatch {
            expected: first.shape().clone(),
            found: other.shape().clone(),
        });
    }

    if spectra.len() == 1 {
        return Ok(first.clone());
    }

    let weights = lagrange_weights_at_zero(points)?;

    let data = (0..first.elements())
        .map(|flat| {
            let values = spectra.iter().map(|sfs| sfs.inner().as_slice()[flat]);

            if values.clone().all(|x| x > 0.0) {
                values
                    .zip(weights.iter())
                    .map(|(x, w)| w * x.ln())
                    .sum::<f64>()
                    .exp()
            } else {
                values.zip(weights.iter()).map(|(x, w)| w * x).sum()
            }
        })
        .collect::<Vec<_>>();

    let sfs = ExpectedSfs::from(Array::new_unchecked(data, first.shape().clone()));

    if sfs.inner().iter().all(|x| x.is_finite()) {
        Ok(sfs)
    } else {
        Err(NumericsError::NonFinite)
    }
}

/// Returns the weight of each point in the Lagrange polynomial evaluated at zero.
fn lagrange_weights_at_zero(points: &[f64]) -> Result<Vec<f64>, NumericsError> {
    points
        .iter()
        .enumerate()
        .map(|(i, &xi)| {
            points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .try_fold(1.0, |acc, (_, &xj)| {
                    if xi == xj {
                        Err(NumericsError::DuplicateExtrapolationPoints)
                    } else {
                        Ok(acc * xj / (xj - xi))
                    }
                })
        })
        .collect()
}
