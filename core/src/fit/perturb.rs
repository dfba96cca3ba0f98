//! Random perturbation of starting points.

use rand::Rng;

/// Lower bounds are raised by this factor when clamping perturbed parameters.
const LOWER_MARGIN: f64 = 1.01;

/// Upper bounds are lowered by this factor when clamping perturbed parameters.
const UPPER_MARGIN: f64 = 0.99;

/// Returns a random perturbation of the parameters.
///
/// Each parameter is multiplied by `2^(fold * u)` for `u` drawn uniformly from `(-1, 1)`, and then
/// clamped to lie strictly inside its bounds.
pub fn perturb<R>(params: &[f64], lower: &[f64], upper: &[f64], fold: f64, rng: &mut R) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    params
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .map(|(&p, (&lower, &upper))| {
            let perturbed = p * 2f64.powf(fold * rng.random_range(-1.0..1.0));

            perturbed.min(UPPER_MARGIN * upper).max(LOWER_MARGIN * lower)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_perturb_within_fold() {
        let mut rng = StdRng::seed_from_u64(0);
        let params = [1.0, 0.5, 2.0];

        for _ in 0..100 {
            let perturbed = perturb(&params, &[0.0; 3], &[100.0; 3], 1.0, &mut rng);

            for (p, q) in params.iter().zip(perturbed.iter()) {
                assert!(*q >= p / 2.0 && *q <= p * 2.0);
            }
        }
    }

    #[test]
    fn test_perturb_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let (lower, upper) = ([0.9, 1e-2], [1.1, 10.0]);

        for _ in 0..100 {
            let perturbed = perturb(&[1.0, 9.5], &lower, &upper, 3.0, &mut rng);

            assert!(perturbed[0] >= 1.01 * 0.9 && perturbed[0] <= 0.99 * 1.1);
            assert!(perturbed[1] >= 1.01 * 1e-2 && perturbed[1] <= 0.99 * 10.0);
        }
    }

    #[test]
    fn test_perturb_zero_fold_is_identity() {
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(
            perturb(&[0.25, 1.25e-6], &[1e-4, 0.0], &[10.0, 10.0], 0.0, &mut rng),
            vec![0.25, 1.25e-6]
        );
    }
}
