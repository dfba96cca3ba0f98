/// Coefficients of a tridiagonal system of equations.
///
/// Row `i` reads `lower[i] * x[i - 1] + diagonal[i] * x[i] + upper[i] * x[i + 1] = rhs[i]`,
/// where `lower[0]` and `upper[n - 1]` are ignored.
#[derive(Clone, Debug)]
pub(super) struct Tridiagonal {
    pub lower: Vec<f64>,
    pub diagonal: Vec<f64>,
    pub upper: Vec<f64>,
    scratch: Vec<f64>,
}

impl Tridiagonal {
    pub fn zeros(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diagonal: vec![0.0; n],
            upper: vec![0.0; n],
            scratch: vec![0.0; n],
        }
    }

    /// Solves the system in place, overwriting the right-hand side with the solution.
    ///
    /// Uses the Thomas algorithm without pivoting, which is stable for the diagonally dominant
    /// systems arising from implicit diffusion steps.
    pub fn solve_in_place(&mut self, rhs: &mut [f64]) {
        let n = rhs.len();
        debug_assert_eq!(n, self.diagonal.len());

        let Self {
            lower,
            diagonal,
            upper,
            scratch,
        } = self;

        let mut beta = diagonal[0];
        rhs[0] /= beta;

        for i in 1..n {
            scratch[i] = upper[i - 1] / beta;
            beta = diagonal[i] - lower[i] * scratch[i];
            rhs[i] = (rhs[i] - lower[i] * rhs[i - 1]) / beta;
        }

        for i in (0..n - 1).rev() {
            rhs[i] -= scratch[i + 1] * rhs[i + 1];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_in_place() {
        // [ 2 -1  0 ] [x0]   [ 1]
        // [-1  2 -1 ] [x1] = [ 0]
        // [ 0 -1  2 ] [x2]   [ 1]
        let mut system = Tridiagonal::zeros(3);
        system.lower.copy_from_slice(&[0., -1., -1.]);
        system.diagonal.copy_from_slice(&[2., 2., 2.]);
        system.upper.copy_from_slice(&[-1., -1., 0.]);

        let mut rhs = vec![1., 0., 1.];
        system.solve_in_place(&mut rhs);

        assert_approx_eq!(rhs, vec![1., 1., 1.], epsilon = 1e-12);
    }

    #[test]
    fn test_solve_in_place_asymmetric() {
        let mut system = Tridiagonal::zeros(4);
        system.lower.copy_from_slice(&[0., 1., 2., 1.]);
        system.diagonal.copy_from_slice(&[4., 5., 6., 3.]);
        system.upper.copy_from_slice(&[1., 1., 2., 0.]);

        let x = [1., -2., 3., 0.5];
        let mut rhs = vec![
            4. * x[0] + 1. * x[1],
            1. * x[0] + 5. * x[1] + 1. * x[2],
            2. * x[1] + 6. * x[2] + 2. * x[3],
            1. * x[2] + 3. * x[3],
        ];
        system.solve_in_place(&mut rhs);

        assert_approx_eq!(rhs, x.to_vec(), epsilon = 1e-12);
    }
}
