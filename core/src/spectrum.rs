use std::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

pub mod io;

pub mod likelihood;

use crate::array::{Array, Shape, ShapeError};

mod seal {
    #![deny(missing_docs)]
    pub trait Sealed {}
}
use seal::Sealed;

/// The state of a spectrum.
pub trait State: Sealed {
    #[doc(hidden)]
    fn debug_name() -> &'static str;
}

/// Observed site counts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Counts;
impl Sealed for Counts {}
impl State for Counts {
    fn debug_name() -> &'static str {
        "Scs"
    }
}

/// Expected site frequencies under a model, up to a scaling by θ.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Expected;
impl Sealed for Expected {}
impl State for Expected {
    fn debug_name() -> &'static str {
        "ExpectedSfs"
    }
}

/// A site count spectrum, typically observed data.
pub type Scs = Spectrum<Counts>;

/// An expected site frequency spectrum, typically the output of a model.
pub type ExpectedSfs = Spectrum<Expected>;

/// A site frequency spectrum.
///
/// The spectrum has one dimension per population, each of length one greater than the number of
/// sampled chromosomes in the population. The two corner entries, where the derived allele is
/// absent from or fixed in every population, are not polymorphic and are treated as masked.
#[derive(PartialEq)]
pub struct Spectrum<S: State> {
    array: Array<f64>,
    state: PhantomData<S>,
}

impl<S: State> Spectrum<S> {
    /// Returns the number of dimensions, i.e. the number of populations.
    pub fn dimensions(&self) -> usize {
        self.array.dimensions()
    }

    /// Returns the total number of entries, including masked corners.
    pub fn elements(&self) -> usize {
        self.array.elements()
    }

    /// Creates a new spectrum of zeros.
    pub fn from_zeros<T>(shape: T) -> Self
    where
        Shape: From<T>,
    {
        Self::from(Array::from_zeros(shape))
    }

    /// Returns the underlying array.
    pub fn inner(&self) -> &Array<f64> {
        &self.array
    }

    /// Returns `true` if the flat index is one of the two masked corners.
    pub fn is_masked(&self, flat: usize) -> bool {
        flat == 0 || flat + 1 == self.elements()
    }

    /// Returns an iterator over the unmasked values in row-major order.
    pub fn iter_unmasked(&self) -> impl Iterator<Item = &f64> {
        // The masked corners are exactly the first and last elements in row-major order
        let n = self.elements();
        self.array.iter().take(n.saturating_sub(1)).skip(1)
    }

    /// Creates a new spectrum from row-major data.
    pub fn new<D, T>(data: D, shape: T) -> Result<Self, ShapeError>
    where
        Vec<f64>: From<D>,
        Shape: From<T>,
    {
        Array::new(data, shape).map(Self::from)
    }

    /// Returns the number of sampled chromosomes per population.
    pub fn sample_sizes(&self) -> Vec<usize> {
        self.shape().iter().map(|n| n - 1).collect()
    }

    /// Returns the shape.
    pub fn shape(&self) -> &Shape {
        self.array.shape()
    }

    /// Returns the sum over all entries, including masked corners.
    pub fn sum(&self) -> f64 {
        self.array.sum()
    }

    /// Returns the sum over the unmasked values.
    pub fn sum_unmasked(&self) -> f64 {
        self.iter_unmasked().sum()
    }
}

impl<S: State> Clone for Spectrum<S> {
    fn clone(&self) -> Self {
        Self {
            array: self.array.clone(),
            state: PhantomData,
        }
    }
}

impl<S: State> fmt::Debug for Spectrum<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(S::debug_name())
            .field("array", &self.array)
            .finish()
    }
}

impl<S: State> From<Array<f64>> for Spectrum<S> {
    fn from(array: Array<f64>) -> Self {
        Self {
            array,
            state: PhantomData,
        }
    }
}

impl<I, S: State> Index<I> for Spectrum<S>
where
    I: AsRef<[usize]>,
{
    type Output = f64;

    fn index(&self, index: I) -> &Self::Output {
        self.array.index(index)
    }
}

impl<I, S: State> IndexMut<I> for Spectrum<S>
where
    I: AsRef<[usize]>,
{
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        self.array.index_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::approx::ApproxEq;

    impl<S: State> ApproxEq for Spectrum<S> {
        const DEFAULT_EPSILON: Self::Epsilon = <f64 as ApproxEq>::DEFAULT_EPSILON;

        type Epsilon = <f64 as ApproxEq>::Epsilon;

        fn approx_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
            self.shape() == other.shape()
                && self
                    .array
                    .as_slice()
                    .approx_eq(other.array.as_slice(), epsilon)
        }
    }

    #[test]
    fn test_unmasked_1d() {
        let scs = Scs::new([5., 1., 2., 3., 7.], 5).unwrap();

        assert_eq!(scs.iter_unmasked().copied().collect::<Vec<_>>(), [1., 2., 3.]);
        assert_eq!(scs.sum_unmasked(), 6.);
        assert!(scs.is_masked(0));
        assert!(scs.is_masked(4));
        assert!(!scs.is_masked(2));
    }

    #[test]
    fn test_unmasked_2d() {
        let scs = Scs::new([9., 1., 2., 3., 4., 5., 6., 7., 9.], [3, 3]).unwrap();

        assert_eq!(scs.sum_unmasked(), 28.);
        assert_eq!(scs.sample_sizes(), vec![2, 2]);
    }
}
