use ndarray::{ArrayView1, NdFloat, ScalarOperand};
use num_traits::FromPrimitive;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign};

// Include submodules
mod common;
mod sampling;

// Re-export types from submodules
pub use common::{feature_dim, sorted_labels, DataPoint};
pub use sampling::{bootstrap_indices, feature_subset, seeded_rng, SeededRng};

/// Floating point type usable as a feature value by the tree learners.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Sum
    + for<'a> AddAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + ScalarOperand
    + std::marker::Unpin
{
    /// Converts a sample count into the float type.
    fn from_count(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::infinity)
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Index of the largest value, resolving ties toward the lowest index.
///
/// Returns `None` for an empty view or when every value is NaN.
pub fn argmax<F: Float>(values: ArrayView1<F>) -> Option<usize> {
    let mut best: Option<(usize, F)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_prefers_first_of_ties() {
        let v = array![0.25, 0.5, 0.5, 0.1];
        assert_eq!(argmax(v.view()), Some(1));
    }

    #[test]
    fn test_argmax_skips_nan() {
        let v = array![f64::NAN, 0.2, 0.1];
        assert_eq!(argmax(v.view()), Some(1));
        let empty: ndarray::Array1<f64> = array![];
        assert_eq!(argmax(empty.view()), None);
    }

    #[test]
    fn test_from_count() {
        assert_eq!(f64::from_count(7), 7.0);
        assert_eq!(f32::from_count(0), 0.0);
    }
}
