use super::NumericsError;

/// Crowding of grid points towards the boundaries.
const CROWDING: f64 = 8.0;

/// A grid of allele frequencies on `[0, 1]`.
///
/// Points are spaced according to a logistic transform of a uniform grid, so that they are
/// densest near the boundaries where the density of rare and nearly fixed alleles changes most
/// rapidly.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    points: Vec<f64>,
    // Inverse of the width of the control volume around each point
    dfactor: Vec<f64>,
}

impl Grid {
    /// The minimum number of points.
    pub const MIN_POINTS: usize = 3;

    /// Returns the width of the control volume around each point.
    ///
    /// These are also the weights of the trapezoidal rule on the grid.
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.dfactor.iter().map(|d| 1.0 / d)
    }

    pub(super) fn dfactor(&self) -> &[f64] {
        &self.dfactor
    }

    /// Returns `true` if the grid has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Creates a new grid with `pts` points.
    pub fn new(pts: usize) -> Result<Self, NumericsError> {
        if pts < Self::MIN_POINTS {
            return Err(NumericsError::GridTooSmall {
                pts,
                min: Self::MIN_POINTS,
            });
        }

        let logistic = |i: usize| {
            let u = -1.0 + 2.0 * i as f64 / (pts - 1) as f64;
            1.0 / (1.0 + (-CROWDING * u).exp())
        };

        let first = logistic(0);
        let last = logistic(pts - 1);
        let mut points = (0..pts)
            .map(|i| (logistic(i) - first) / (last - first))
            .collect::<Vec<_>>();
        points[0] = 0.0;
        points[pts - 1] = 1.0;

        let dfactor = (0..pts)
            .map(|i| {
                let left = points[i.saturating_sub(1)];
                let right = points[(i + 1).min(pts - 1)];
                2.0 / (right - left)
            })
            .collect();

        Ok(Self { points, dfactor })
    }

    /// Returns the points in increasing order, from zero to one.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Returns the distance from the zero boundary to the first interior point.
    pub fn spacing_at_zero(&self) -> f64 {
        self.points[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_endpoints_and_order() {
        let grid = Grid::new(40).unwrap();

        assert_eq!(grid.len(), 40);
        assert_eq!(grid.points()[0], 0.0);
        assert_eq!(grid.points()[39], 1.0);
        assert!(grid.points().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_grid_symmetric() {
        let grid = Grid::new(31).unwrap();
        let points = grid.points();

        for i in 0..points.len() {
            assert_approx_eq!(points[i], 1.0 - points[points.len() - 1 - i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_grid_crowded_at_boundaries() {
        let grid = Grid::new(50).unwrap();
        let points = grid.points();

        let boundary = points[1] - points[0];
        let centre = points[25] - points[24];
        assert!(boundary < centre / 10.0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let grid = Grid::new(25).unwrap();

        assert_approx_eq!(grid.weights().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spacing_decreases_with_points() {
        let coarse = Grid::new(20).unwrap();
        let fine = Grid::new(30).unwrap();

        assert!(fine.spacing_at_zero() < coarse.spacing_at_zero());
    }

    #[test]
    fn test_too_small() {
        assert_eq!(
            Grid::new(2),
            Err(NumericsError::GridTooSmall { pts: 2, min: 3 })
        );
    }
}
