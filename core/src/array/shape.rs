//! Array shapes.

use std::{fmt, ops::Deref};

/// The shape of an array, with the length of each dimension.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Shape(pub Vec<usize>);

impl Shape {
    /// Returns the number of elements in an array of this shape.
    pub fn elements(&self) -> usize {
        self.iter().product()
    }

    pub(crate) fn strides(&self) -> Strides {
        let mut strides = vec![1; self.len()];

        for (i, v) in self.iter().enumerate().skip(1).rev() {
            strides.iter_mut().take(i).for_each(|stride| *stride *= v)
        }

        Strides(strides)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<usize>> for Shape {
    fn from(shape: Vec<usize>) -> Self {
        Self(shape)
    }
}

impl From<&[usize]> for Shape {
    fn from(shape: &[usize]) -> Self {
        Self(shape.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(shape: [usize; N]) -> Self {
        Self(shape.to_vec())
    }
}

impl From<usize> for Shape {
    fn from(shape: usize) -> Self {
        Self(vec![shape])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.first() {
            write!(f, "{first}")?;
        }
        for v in self.iter().skip(1) {
            write!(f, "/{v}")?;
        }
        Ok(())
    }
}

/// The row-major strides of an array.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Strides(pub Vec<usize>);

impl Strides {
    pub(crate) fn flat_index(&self, shape: &Shape, index: &[usize]) -> Option<usize> {
        index
            .iter()
            .zip(shape.iter())
            .zip(self.iter())
            .try_fold(0, |flat, ((&i, &n), &stride)| {
                (i < n).then_some(flat + i * stride)
            })
    }
}

impl Deref for Strides {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides() {
        let shape = Shape(vec![6, 3, 7]);
        let strides = shape.strides();

        assert_eq!(strides, Strides(vec![21, 7, 1]));
    }

    #[test]
    fn test_flat_index() {
        let shape = Shape(vec![3, 3, 4]);
        let strides = shape.strides();

        assert_eq!(strides.flat_index(&shape, &[0, 0, 0]), Some(0));
        assert_eq!(strides.flat_index(&shape, &[0, 1, 0]), Some(4));
        assert_eq!(strides.flat_index(&shape, &[2, 2, 3]), Some(35));
        assert_eq!(strides.flat_index(&shape, &[3, 0, 0]), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape(vec![11]).to_string(), "11");
        assert_eq!(Shape(vec![11, 13]).to_string(), "11/13");
    }
}
