//! Finite-difference solution of the diffusion approximation.
//!
//! The density `φ` of derived allele frequencies evolves as
//!
//! ```text
//! ∂φ/∂t = ½ Σₖ ∂²/∂xₖ² (Vₖ φ) - Σₖ ∂/∂xₖ (Mₖ φ)
//! ```
//!
//! with `Vₖ = xₖ(1 - xₖ)/νₖ` and, for two populations, `M₁ = m₁₂(x₂ - x₁)` and
//! `M₂ = m₂₁(x₁ - x₂)`. Time is scaled by `2N` generations of the reference population and the
//! population-scaled mutation rate is one.
//!
//! Each time step injects new mutations at the lowest interior frequency, then takes an implicit
//! Euler step in conservative flux form, with upwinded advection so that the density remains
//! non-negative. In two dimensions, the implicit step is split into one sweep along each axis.

use crate::{array::Array, utils::binomial_pmf, ExpectedSfs};

use super::{tridiagonal::Tridiagonal, Backend, Grid, NumericsError};

/// Largest time step relative to the fastest rate in the system.
const TIMESCALE_FACTOR: f64 = 1e-3;

/// Most time steps taken by a single integration.
///
/// Parameters inside the registered bounds need at most a few hundred thousand steps.
const MAX_TIME_STEPS: usize = 1_000_000;

/// Population-scaled mutation rate.
const THETA: f64 = 1.0;

/// A [`Backend`] solving the diffusion approximation on a non-uniform grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiffusionBackend;

/// An allele frequency density on a [`Grid`].
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// Density over a single population.
    OnePopulation {
        /// The grid.
        grid: Grid,
        /// Density at each grid point.
        phi: Vec<f64>,
    },
    /// Joint density over two populations, indexed by population 1 then population 2.
    TwoPopulations {
        /// The grid, shared between both populations.
        grid: Grid,
        /// Density at each pair of grid points.
        phi: Array<f64>,
    },
}

impl Field {
    /// Returns the number of populations.
    pub fn populations(&self) -> usize {
        match self {
            Field::OnePopulation { .. } => 1,
            Field::TwoPopulations { .. } => 2,
        }
    }

    fn check_finite(&self) -> Result<(), NumericsError> {
        let finite = match self {
            Field::OnePopulation { phi, .. } => phi.iter().all(|x| x.is_finite()),
            Field::TwoPopulations { phi, .. } => phi.iter().all(|x| x.is_finite()),
        };

        if finite {
            Ok(())
        } else {
            Err(NumericsError::NonFinite)
        }
    }
}

impl Backend for DiffusionBackend {
    type Field = Field;

    fn extrapolation_point(&self, pts: usize) -> Result<f64, NumericsError> {
        Grid::new(pts).map(|grid| grid.spacing_at_zero())
    }

    fn initialize(&self, pts: usize) -> Result<Self::Field, NumericsError> {
        let grid = Grid::new(pts)?;

        // Neutral equilibrium φ(x) = θ/x, with the singular boundary set to its neighbour
        let mut phi = grid
            .points()
            .iter()
            .map(|x| THETA / x)
            .collect::<Vec<_>>();
        phi[0] = phi[1];

        Ok(Field::OnePopulation { grid, phi })
    }

    fn integrate_one(
        &self,
        field: &mut Self::Field,
        duration: f64,
        nu: f64,
    ) -> Result<(), NumericsError> {
        NumericsError::check_duration(duration)?;
        NumericsError::check_population_size(nu)?;

        let Field::OnePopulation { grid, phi } = field else {
            return Err(NumericsError::DimensionMismatch {
                expected: 1,
                found: field.populations(),
            });
        };

        let (steps, dt) = time_steps(duration, &[nu], &[])?;
        if steps == 0 {
            return Ok(());
        }

        let v = variance(grid, nu);
        let advection = vec![0.0; grid.len() - 1];
        let mut system = Tridiagonal::zeros(grid.len());
        assemble(&mut system, grid, &v, &advection, dt);

        for _ in 0..steps {
            inject_one(phi, grid, dt);
            system.solve_in_place(phi);
        }

        log::trace!("Integrated one population for {duration} with nu={nu} in {steps} steps");

        field.check_finite()
    }

    fn integrate_two(
        &self,
        field: &mut Self::Field,
        duration: f64,
        nu1: f64,
        nu2: f64,
        m12: f64,
        m21: f64,
    ) -> Result<(), NumericsError> {
        NumericsError::check_duration(duration)?;
        NumericsError::check_population_size(nu1)?;
        NumericsError::check_population_size(nu2)?;
        NumericsError::check_migration_rate(m12)?;
        NumericsError::check_migration_rate(m21)?;

        let Field::TwoPopulations { grid, phi } = field else {
            return Err(NumericsError::DimensionMismatch {
                expected: 2,
                found: field.populations(),
            });
        };

        let (steps, dt) = time_steps(duration, &[nu1, nu2], &[m12, m21])?;
        if steps == 0 {
            return Ok(());
        }

        let n = grid.len();
        let points = grid.points();
        let midpoints = points
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect::<Vec<_>>();

        // Systems along population 1 depend on the frequency in population 2 through migration,
        // and vice versa, so assemble one system per line up front
        let v1 = variance(grid, nu1);
        let v2 = variance(grid, nu2);
        let mut systems1 = points
            .iter()
            .map(|&y| {
                let advection = midpoints.iter().map(|&x| m12 * (y - x)).collect::<Vec<_>>();
                let mut system = Tridiagonal::zeros(n);
                assemble(&mut system, grid, &v1, &advection, dt);
                system
            })
            .collect::<Vec<_>>();
        let mut systems2 = points
            .iter()
            .map(|&x| {
                let advection = midpoints.iter().map(|&y| m21 * (x - y)).collect::<Vec<_>>();
                let mut system = Tridiagonal::zeros(n);
                assemble(&mut system, grid, &v2, &advection, dt);
                system
            })
            .collect::<Vec<_>>();

        let mut line = vec![0.0; n];
        for _ in 0..steps {
            inject_two(phi.as_mut_slice(), grid, dt);

            let values = phi.as_mut_slice();

            // Population 1 varies along columns
            for (j, system) in systems1.iter_mut().enumerate() {
                line.iter_mut()
                    .enumerate()
                    .for_each(|(i, v)| *v = values[i * n + j]);
                system.solve_in_place(&mut line);
                line.iter()
                    .enumerate()
                    .for_each(|(i, v)| values[i * n + j] = *v);
            }

            // Population 2 varies along rows, which are contiguous
            for (i, system) in systems2.iter_mut().enumerate() {
                system.solve_in_place(&mut values[i * n..(i + 1) * n]);
            }
        }

        log::trace!(
            "Integrated two populations for {duration} with nu1={nu1}, nu2={nu2}, \
            m12={m12}, m21={m21} in {steps} steps"
        );

        field.check_finite()
    }

    fn sample(
        &self,
        field: &Self::Field,
        sample_sizes: &[usize],
    ) -> Result<ExpectedSfs, NumericsError> {
        if sample_sizes.len() != field.populations() {
            return Err(NumericsError::DimensionMismatch {
                expected: sample_sizes.len(),
                found: field.populations(),
            });
        }

        let sfs = match field {
            Field::OnePopulation { grid, phi } => {
                let n = sample_sizes[0];
                let sampling = sampling_matrix(grid, n);

                let values = sampling
                    .chunks(grid.len())
                    .map(|row| row.iter().zip(phi.iter()).map(|(s, p)| s * p).sum())
                    .collect::<Vec<f64>>();

                Array::new_unchecked(values, n + 1)
            }
            Field::TwoPopulations { grid, phi } => {
                let (n1, n2) = (sample_sizes[0], sample_sizes[1]);
                let pts = grid.len();
                let sampling1 = sampling_matrix(grid, n1);
                let sampling2 = sampling_matrix(grid, n2);
                let phi = phi.as_slice();

                // Marginalise population 1 first, giving a (n1 + 1) x pts intermediate
                let mut partial = vec![0.0; (n1 + 1) * pts];
                for (k1, row) in sampling1.chunks(pts).enumerate() {
                    let out = &mut partial[k1 * pts..(k1 + 1) * pts];
                    for (i, &s) in row.iter().enumerate() {
                        let line = &phi[i * pts..(i + 1) * pts];
                        out.iter_mut().zip(line).for_each(|(o, p)| *o += s * p);
                    }
                }

                let mut values: Vec<f64> = Vec::with_capacity((n1 + 1) * (n2 + 1));
                for out in partial.chunks(pts) {
                    for row in sampling2.chunks(pts) {
                        values.push(row.iter().zip(out).map(|(s, p)| s * p).sum::<f64>());
                    }
                }

                Array::new_unchecked(values, [n1 + 1, n2 + 1])
            }
        };
        let sfs = ExpectedSfs::from(sfs);

        if sfs.inner().iter().all(|x| x.is_finite()) {
            Ok(sfs)
        } else {
            Err(NumericsError::NonFinite)
        }
    }

    fn split(&self, field: Self::Field) -> Result<Self::Field, NumericsError> {
        let populations = field.populations();
        let Field::OnePopulation { grid, phi } = field else {
            return Err(NumericsError::DimensionMismatch {
                expected: 1,
                found: populations,
            });
        };

        // Mass on the diagonal, scaled so the joint density integrates like the marginal
        let n = grid.len();
        let mut joint = Array::from_zeros([n, n]);
        for (i, (p, d)) in phi.iter().zip(grid.dfactor()).enumerate() {
            joint[[i, i]] = p * d;
        }

        Ok(Field::TwoPopulations { grid, phi: joint })
    }
}

/// Returns the number of steps and their common length for integrating over `duration`.
fn time_steps(
    duration: f64,
    nus: &[f64],
    migration: &[f64],
) -> Result<(usize, f64), NumericsError> {
    if duration == 0.0 {
        return Ok((0, 0.0));
    }

    let fastest = nus
        .iter()
        .map(|nu| 0.25 / nu)
        .fold(migration.iter().sum::<f64>(), f64::max);
    let max_dt = TIMESCALE_FACTOR / fastest;

    let steps = (duration / max_dt).ceil();
    if steps > MAX_TIME_STEPS as f64 {
        return Err(NumericsError::TooManyTimeSteps {
            duration,
            max: MAX_TIME_STEPS,
        });
    }

    let steps = steps as usize;
    Ok((steps, duration / steps as f64))
}

fn variance(grid: &Grid, nu: f64) -> Vec<f64> {
    grid.points().iter().map(|x| x * (1.0 - x) / nu).collect()
}

/// Assembles the implicit Euler system `(I - dt A) φ' = φ` in conservative flux form.
///
/// `advection` holds the advection velocity at the midpoint between each pair of neighbours.
/// The flux between points `j` and `j + 1` is `P_j φ_j + Q_j φ_{j+1}` with upwinded
/// `P_j = max(M, 0) + V_j / 2h_j ≥ 0` and `Q_j = min(M, 0) - V_{j+1} / 2h_j ≤ 0`.
fn assemble(system: &mut Tridiagonal, grid: &Grid, v: &[f64], advection: &[f64], dt: f64) {
    let points = grid.points();
    let n = points.len();

    let (p, q): (Vec<f64>, Vec<f64>) = (0..n - 1)
        .map(|j| {
            let h = points[j + 1] - points[j];
            let m = advection[j];
            (m.max(0.0) + v[j] / (2.0 * h), m.min(0.0) - v[j + 1] / (2.0 * h))
        })
        .unzip();

    for (i, &d) in grid.dfactor().iter().enumerate() {
        let scale = dt * d;

        let (lower, from_left) = if i > 0 { (p[i - 1], q[i - 1]) } else { (0.0, 0.0) };
        let (to_right, upper) = if i + 1 < n { (p[i], q[i]) } else { (0.0, 0.0) };

        system.lower[i] = -scale * lower;
        system.diagonal[i] = 1.0 + scale * (to_right - from_left);
        system.upper[i] = scale * upper;
    }
}

/// Injects new mutations at the lowest interior frequency of a single population.
///
/// The rate is chosen so that `θ/x` is stationary in the interior under neutrality.
fn inject_one(phi: &mut [f64], grid: &Grid, dt: f64) {
    let x1 = grid.points()[1];
    phi[1] += dt / x1 * THETA / 2.0 * grid.dfactor()[1];
}

/// Injects new mutations into each population while absent from the other.
fn inject_two(phi: &mut [f64], grid: &Grid, dt: f64) {
    let n = grid.len();
    let x1 = grid.points()[1];
    let amount = dt / x1 * THETA / 2.0 * grid.dfactor()[1] * grid.dfactor()[0];

    phi[n] += amount;
    phi[1] += amount;
}

/// Returns a row-major `(n + 1) x pts` matrix of binomial sampling probabilities weighted by the
/// trapezoidal rule.
fn sampling_matrix(grid: &Grid, n: usize) -> Vec<f64> {
    let mut matrix = Vec::with_capacity((n + 1) * grid.len());

    for k in 0..=n {
        matrix.extend(
            grid.points()
                .iter()
                .zip(grid.weights())
                .map(|(&x, w)| w * binomial_pmf(n as u64, k as u64, x)),
        );
    }

    matrix
}
