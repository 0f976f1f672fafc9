use std::fmt::Debug;
use std::hash::Hash;
// Core components from the shared library.
use geomind_helpers::{DataPoint, Float, argmax, bootstrap_indices, seeded_rng, sorted_labels};

pub use decision_tree::{DecisionTree, MaxFeatures, TreeError, TreeParams};

use ndarray::{Array1, ArrayView1};
use tracing::debug;

/// Errors that can occur when training or querying a random forest.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForestError {
    /// A forest needs at least one tree.
    #[error("A random forest needs at least one tree")]
    NoTrees,
    /// Training or querying one of the trees failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Hyperparameters of a random forest.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Growth limits shared by every tree.
    pub tree: TreeParams,
    /// Train each tree on a bootstrap sample instead of the full data.
    pub bootstrap: bool,
    /// Seed for bootstrap sampling and feature selection. `None` draws a
    /// random seed, which is then recorded on the fitted forest.
    pub seed: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeParams {
                max_features: MaxFeatures::Sqrt,
                ..TreeParams::default()
            },
            bootstrap: true,
            seed: None,
        }
    }
}

impl ForestParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A random forest classifier.
///
/// Every tree sees a bootstrap sample of the training data and a random
/// subset of the features at each split. Predictions average the trees' class
/// probabilities and pick the most probable class; ties go to the smallest
/// label. Inference is deterministic once the forest is trained.
#[derive(Debug, Clone)]
pub struct RandomForest<L, F>
where
    L: Clone + Eq + Ord + Hash + Debug,
    F: Float,
{
    classes: Vec<L>,
    trees: Vec<DecisionTree<L, F>>,
    n_features: usize,
    seed: u64,
}

impl<L, F> RandomForest<L, F>
where
    L: Clone + Eq + Ord + Hash + Debug,
    F: Float,
{
    /// Trains a forest on `data`.
    ///
    /// # Errors
    ///
    /// Returns `ForestError::NoTrees` if `params.n_trees` is zero and
    /// `ForestError::Tree` for empty or malformed training data.
    pub fn fit(data: &[DataPoint<L, F>], params: &ForestParams) -> Result<Self, ForestError> {
        if params.n_trees == 0 {
            return Err(ForestError::NoTrees);
        }
        if data.is_empty() {
            return Err(TreeError::EmptyDataSet.into());
        }
        params.tree.validate()?;

        let (mut rng, seed) = seeded_rng(params.seed);
        let classes = sorted_labels(data);
        let full: Vec<usize> = (0..data.len()).collect();

        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let sample = if params.bootstrap {
                bootstrap_indices(data.len(), &mut rng)
            } else {
                full.clone()
            };
            let tree = DecisionTree::fit_sample(data, &sample, classes.clone(), &params.tree, &mut rng)?;
            trees.push(tree);
        }

        let n_features = trees[0].n_features();
        debug!(
            n_trees = trees.len(),
            n_classes = classes.len(),
            n_samples = data.len(),
            seed,
            "random forest trained"
        );

        Ok(Self {
            classes,
            trees,
            n_features,
            seed,
        })
    }

    /// Mean class probabilities over all trees, indexed like [`Self::classes`].
    pub fn predict_proba(&self, features: ArrayView1<F>) -> Result<Array1<F>, ForestError> {
        let mut total = Array1::zeros(self.classes.len());
        for tree in &self.trees {
            total += &tree.predict_proba(features)?;
        }
        total /= F::from_count(self.trees.len());
        Ok(total)
    }

    /// Predicts the most probable class for `features`.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<L, ForestError> {
        let proba = self.predict_proba(features)?;
        argmax(proba.view())
            .and_then(|i| self.classes.get(i).cloned())
            .ok_or(ForestError::NoTrees)
    }

    /// The classes seen during training, in ascending order.
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn trees(&self) -> &[DecisionTree<L, F>] {
        &self.trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// The seed the forest was trained with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Mean impurity-based feature importance over all trees.
    pub fn feature_importances(&self) -> Array1<F> {
        let mut total = Array1::zeros(self.n_features);
        for tree in &self.trees {
            total += &tree.feature_importances();
        }
        let sum = total.sum();
        if sum > F::zero() {
            total /= sum;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn risk_data() -> Vec<DataPoint<&'static str, f64>> {
        vec![
            DataPoint::new(array![35.0, 80.0], "High"),
            DataPoint::new(array![38.0, 60.0], "High"),
            DataPoint::new(array![36.5, 75.0], "High"),
            DataPoint::new(array![40.0, 55.0], "High"),
            DataPoint::new(array![22.0, 250.0], "Low"),
            DataPoint::new(array![24.0, 220.0], "Low"),
            DataPoint::new(array![21.0, 280.0], "Low"),
            DataPoint::new(array![23.5, 240.0], "Low"),
        ]
    }

    #[test]
    fn test_forest_separates_clusters() {
        let data = risk_data();
        let forest = RandomForest::fit(&data, &ForestParams::default().with_seed(42)).unwrap();

        assert_eq!(forest.trees().len(), 100);
        assert_eq!(forest.classes(), &["High", "Low"]);
        assert_eq!(forest.predict(array![39.0, 50.0].view()).unwrap(), "High");
        assert_eq!(forest.predict(array![20.0, 290.0].view()).unwrap(), "Low");
    }

    #[test]
    fn test_same_seed_same_forest() {
        let data = risk_data();
        let params = ForestParams {
            n_trees: 15,
            ..ForestParams::default()
        }
        .with_seed(7);
        let a = RandomForest::fit(&data, &params).unwrap();
        let b = RandomForest::fit(&data, &params).unwrap();
        assert_eq!(a.seed(), 7);

        for x in [array![30.0, 150.0], array![27.0, 160.0], array![45.0, 300.0]] {
            let pa = a.predict_proba(x.view()).unwrap();
            let pb = b.predict_proba(x.view()).unwrap();
            assert_eq!(pa, pb);
            assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
        }
    }

    #[test]
    fn test_unseeded_forest_records_seed() {
        let data = risk_data();
        let params = ForestParams {
            n_trees: 3,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&data, &params).unwrap();
        let replay = RandomForest::fit(&data, &params.clone().with_seed(forest.seed())).unwrap();
        let x = array![30.0, 150.0];
        assert_eq!(
            forest.predict_proba(x.view()).unwrap(),
            replay.predict_proba(x.view()).unwrap()
        );
    }

    #[test]
    fn test_predict_proba_sums_to_one() {
        let data = risk_data();
        let forest = RandomForest::fit(&data, &ForestParams::default().with_seed(1)).unwrap();
        let proba = forest.predict_proba(array![30.0, 150.0].view()).unwrap();
        assert_eq!(proba.len(), 2);
        assert_abs_diff_eq!(proba.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_class() {
        let data = vec![
            DataPoint::new(array![1.0], "Medium"),
            DataPoint::new(array![2.0], "Medium"),
        ];
        let forest = RandomForest::fit(&data, &ForestParams::default().with_seed(3)).unwrap();
        assert_eq!(forest.predict(array![-50.0].view()).unwrap(), "Medium");
        assert_eq!(forest.predict(array![50.0].view()).unwrap(), "Medium");
        assert!(forest.feature_importances().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_without_bootstrap_trees_agree() {
        let data = risk_data();
        let params = ForestParams {
            n_trees: 5,
            bootstrap: false,
            tree: TreeParams::default(),
            seed: Some(11),
        };
        let forest = RandomForest::fit(&data, &params).unwrap();
        let proba = forest.predict_proba(array![39.0, 50.0].view()).unwrap();
        assert_abs_diff_eq!(proba[0], 1.0);
    }

    #[test]
    fn test_feature_importances_normalized() {
        let data = risk_data();
        let forest = RandomForest::fit(&data, &ForestParams::default().with_seed(5)).unwrap();
        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 2);
        assert_abs_diff_eq!(imp.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_errors() {
        let data = risk_data();
        let params = ForestParams {
            n_trees: 0,
            ..ForestParams::default()
        };
        assert_eq!(RandomForest::fit(&data, &params).unwrap_err(), ForestError::NoTrees);

        let empty: Vec<DataPoint<&str, f64>> = vec![];
        assert_eq!(
            RandomForest::fit(&empty, &ForestParams::default()).unwrap_err(),
            ForestError::Tree(TreeError::EmptyDataSet)
        );

        let forest = RandomForest::fit(&data, &ForestParams::default().with_seed(2)).unwrap();
        assert_eq!(
            forest.predict(array![1.0, 2.0, 3.0].view()).unwrap_err(),
            ForestError::Tree(TreeError::DimensionMismatch { expected: 2, found: 3 })
        );
    }
}
