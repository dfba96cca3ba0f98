//! Special functions.
//!
//! Much of the code here is adapted from the implementation in statrs.

pub use gamma::ln_gamma;

/// Returns the natural logarithm of the binomial coefficient.
pub fn ln_binomial(n: u64, k: u64) -> f64 {
    if k > n {
        f64::NEG_INFINITY
    } else {
        factorial::ln_factorial(n) - factorial::ln_factorial(k) - factorial::ln_factorial(n - k)
    }
}

/// Returns the PMF of the binomial distribution with `n` trials and success probability `p`.
pub fn binomial_pmf(n: u64, k: u64, p: f64) -> f64 {
    if k > n {
        0.0
    } else if p <= 0.0 {
        if k == 0 {
            1.0
        } else {
            0.0
        }
    } else if p >= 1.0 {
        if k == n {
            1.0
        } else {
            0.0
        }
    } else {
        (ln_binomial(n, k) + k as f64 * p.ln() + (n - k) as f64 * (-p).ln_1p()).exp()
    }
}

mod factorial {
    use std::sync::OnceLock;

    use super::gamma::ln_gamma;

    const MAX: usize = 170;
    const PRECOMPUTED_LEN: usize = MAX + 1;

    fn precomputed() -> &'static [f64; PRECOMPUTED_LEN] {
        static PRECOMPUTED: OnceLock<[f64; PRECOMPUTED_LEN]> = OnceLock::new();

        PRECOMPUTED.get_or_init(|| {
            let mut precomputed = [1.0; PRECOMPUTED_LEN];

            precomputed
                .iter_mut()
                .enumerate()
                .skip(1)
                .fold(1.0, |acc, (i, x)| {
                    let factorial = acc * i as f64;
                    *x = factorial;
                    factorial
                });

            precomputed
        })
    }

    pub(super) fn ln_factorial(x: u64) -> f64 {
        precomputed()
            .get(x as usize)
            .map(|factorial| factorial.ln())
            .unwrap_or_else(|| ln_gamma(x as f64 + 1.0))
    }
}

mod gamma {
    use std::f64::consts::{E, PI};

    const LN_2_SQRT_E_OVER_PI: f64 = 0.620_782_237_635_245_2;
    const LN_PI: f64 = 1.144_729_885_849_400_2;
    const R: f64 = 10.900511;
    const DK: &[f64] = &[
        2.485_740_891_387_535_5e-5,
        1.051_423_785_817_219_7,
        -3.456_870_972_220_162_5,
        4.512_277_094_668_948,
        -2.982_852_253_235_766_4,
        1.056_397_115_771_267,
        -1.954_287_731_916_458_7e-1,
        1.709_705_434_044_412e-2,
        -5.719_261_174_043_057e-4,
        4.633_994_733_599_057e-6,
        -2.719_949_084_886_077_2e-9,
    ];

    /// Returns the natural logarithm of the gamma function.
    pub fn ln_gamma(x: f64) -> f64 {
        if x < 0.5 {
            let s = DK
                .iter()
                .enumerate()
                .skip(1)
                .fold(DK[0], |s, t| s + t.1 / (t.0 as f64 - x));

            LN_PI
                - (PI * x).sin().ln()
                - s.ln()
                - LN_2_SQRT_E_OVER_PI
                - (0.5 - x) * ((0.5 - x + R) / E).ln()
        } else {
            let s = DK
                .iter()
                .enumerate()
                .skip(1)
                .fold(DK[0], |s, t| s + t.1 / (x + t.0 as f64 - 1.0));

            s.ln() + LN_2_SQRT_E_OVER_PI + (x - 0.5) * ((x - 0.5 + R) / E).ln()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_binomial() {
        assert_approx_eq!(ln_binomial(10, 0), 0.0, epsilon = 1e-12);
        assert_approx_eq!(ln_binomial(10, 3), 120f64.ln(), epsilon = 1e-12);
        assert_eq!(ln_binomial(3, 4), f64::NEG_INFINITY);
    }

    #[test]
    fn test_binomial_pmf() {
        assert_approx_eq!(binomial_pmf(10, 3, 0.5), 0.117188, epsilon = 1e-6);
        assert_approx_eq!(binomial_pmf(4, 1, 0.1), 0.2916, epsilon = 1e-12);
        assert_eq!(binomial_pmf(4, 0, 0.0), 1.0);
        assert_eq!(binomial_pmf(4, 1, 0.0), 0.0);
        assert_eq!(binomial_pmf(4, 4, 1.0), 1.0);
        assert_eq!(binomial_pmf(4, 3, 1.0), 0.0);
    }

    #[test]
    fn test_ln_gamma() {
        assert_approx_eq!(ln_gamma(1.0), 0.0, epsilon = 1e-10);
        assert_approx_eq!(ln_gamma(5.0), 24f64.ln(), epsilon = 1e-10);
        assert_approx_eq!(ln_gamma(0.5), 0.572_364_942_924_7, epsilon = 1e-10);
    }
}
