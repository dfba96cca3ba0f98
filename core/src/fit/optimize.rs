//! Bounded optimization over log-parameters with [`argmin`].

use argmin::{
    core::{CostFunction, Error, Executor, State},
    solver::neldermead::NelderMead,
};

use crate::{numerics::Backend, registry::ModelDescriptor, Scs};

use super::{FitError, Fitter};

/// Cost of points outside the bounds or where the model cannot be evaluated.
const PENALTY: f64 = 1e8;

/// Offset in log-space of the initial simplex vertices from the starting point.
const SIMPLEX_STEP: f64 = 0.1;

/// Negative log-likelihood as a function of log-parameters.
struct LogLikelihoodCost<'a, B> {
    fitter: &'a Fitter<B>,
    descriptor: &'a ModelDescriptor,
    data: &'a Scs,
}

impl<'a, B> CostFunction for LogLikelihoodCost<'a, B>
where
    B: Backend,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, log_params: &Self::Param) -> Result<Self::Output, Error> {
        let params = log_params.iter().map(|x| x.exp()).collect::<Vec<_>>();

        if !self.descriptor.is_within_bounds(&params) {
            return Ok(PENALTY);
        }

        match self.fitter.log_likelihood(self.descriptor, &params, self.data) {
            Ok(log_likelihood) if log_likelihood.is_finite() => Ok(-log_likelihood),
            Ok(_) => Ok(PENALTY),
            Err(e) => {
                log::trace!("Failed to evaluate model at {params:?}: {e}");
                Ok(PENALTY)
            }
        }
    }
}

/// Returns the parameters minimising the cost, starting from `start`.
pub(super) fn optimize<B>(
    fitter: &Fitter<B>,
    descriptor: &ModelDescriptor,
    data: &Scs,
    start: &[f64],
) -> Result<Vec<f64>, FitError>
where
    B: Backend,
{
    let log_start = start.iter().map(|x| x.ln()).collect::<Vec<_>>();
    let solver = NelderMead::new(simplex(&log_start));
    let cost = LogLikelihoodCost {
        fitter,
        descriptor,
        data,
    };

    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(fitter.options().max_iterations))
        .run()
        .map_err(|e| FitError::Optimizer(e.to_string()))?;

    let state = result.state();
    log::debug!(
        "Optimizer stopped after {} iterations: {:?}",
        state.get_iter(),
        state.get_termination_status()
    );

    let best = state.get_best_param().unwrap_or(&log_start);
    Ok(best.iter().map(|x| x.exp()).collect())
}

fn simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let mut vertices = vec![start.to_vec()];

    vertices.extend((0..start.len()).map(|i| {
        let mut vertex = start.to_vec();
        vertex[i] += SIMPLEX_STEP;
        vertex
    }));

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplex() {
        let vertices = simplex(&[0.0, 1.0]);

        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0], vec![0.0, 1.0]);
        assert_eq!(vertices[1], vec![0.1, 1.0]);
        assert_eq!(vertices[2], vec![0.0, 1.1]);
    }
}
