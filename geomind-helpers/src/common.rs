use ndarray::Array1;
use crate::Float;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Represents a single training sample with features and a label.
///
/// L: The type of the label (e.g., a class code, String, enum).
/// F: The float type for the features (e.g., f32, f64).
#[derive(Debug, Clone)]
pub struct DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        DataPoint { features, label }
    }

    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

/// Returns the shared feature dimension of `data`.
///
/// `None` if `data` is empty or the points disagree on their dimension.
pub fn feature_dim<L, F>(data: &[DataPoint<L, F>]) -> Option<usize>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    let first = data.first()?.dim();
    data.iter().all(|dp| dp.dim() == first).then_some(first)
}

/// Distinct labels of `data` in ascending order.
pub fn sorted_labels<L, F>(data: &[DataPoint<L, F>]) -> Vec<L>
where
    L: Clone + Eq + Ord + std::hash::Hash + Debug,
    F: Float,
{
    let labels: BTreeSet<&L> = data.iter().map(|dp| &dp.label).collect();
    labels.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_feature_dim() {
        let data = vec![
            DataPoint::new(array![1.0, 2.0], 0usize),
            DataPoint::new(array![3.0, 4.0], 1usize),
        ];
        assert_eq!(feature_dim(&data), Some(2));

        let bad = vec![
            DataPoint::new(array![1.0, 2.0], 0usize),
            DataPoint::new(array![3.0], 1usize),
        ];
        assert_eq!(feature_dim(&bad), None);

        let empty: Vec<DataPoint<usize, f64>> = vec![];
        assert_eq!(feature_dim(&empty), None);
    }

    #[test]
    fn test_sorted_labels_dedups() {
        let data = vec![
            DataPoint::new(array![1.0], "Low"),
            DataPoint::new(array![2.0], "High"),
            DataPoint::new(array![3.0], "Low"),
            DataPoint::new(array![4.0], "Medium"),
        ];
        assert_eq!(sorted_labels(&data), vec!["High", "Low", "Medium"]);
    }
}
