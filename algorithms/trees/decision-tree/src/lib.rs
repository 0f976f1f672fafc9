use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;
// Core components from the shared library.
use geomind_helpers::{DataPoint, Float, argmax, feature_dim, feature_subset, sorted_labels};

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

/// Errors that can occur when training or querying a decision tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// The training data (or the training sample) is empty.
    #[error("Training data is empty")]
    EmptyDataSet,
    /// Training points do not share a single feature dimension.
    #[error("Training data points have mismatched feature dimensions")]
    MismatchedDimensions,
    /// A training feature is NaN or infinite.
    #[error("Feature {feature} of training point {point} is not a finite number")]
    NonFiniteFeature { point: usize, feature: usize },
    /// A training label is not part of the class list given to the tree.
    #[error("Label {0} is not one of the tree's classes")]
    UnknownLabel(String),
    /// A sample index points past the end of the training data.
    #[error("Sample index {0} is out of range")]
    SampleOutOfRange(usize),
    /// A query point has the wrong number of features.
    #[error("Expected {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// The tree parameters cannot be used for training.
    #[error("Invalid tree parameters: {0}")]
    InvalidParams(String),
}

/// How many features a node examines when searching for its split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxFeatures {
    /// Every feature.
    #[default]
    All,
    /// `floor(sqrt(n_features))`.
    Sqrt,
    /// `floor(log2(n_features))`.
    Log2,
    /// A fixed number of features.
    Count(usize),
}

impl MaxFeatures {
    /// Number of candidate features for a dataset with `n_features` columns.
    ///
    /// Always at least one and never more than `n_features`.
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    /// Maximum number of split levels; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum number of samples a node needs before it may split.
    pub min_samples_split: usize,
    /// Minimum number of samples on each side of a split.
    pub min_samples_leaf: usize,
    /// Candidate features per split.
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.min_samples_split < 2 {
            return Err(TreeError::InvalidParams(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(TreeError::InvalidParams(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(TreeError::InvalidParams(
                "max_features must select at least one feature".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node<F: Float> {
    Leaf {
        /// Class probabilities, indexed like `DecisionTree::classes`.
        proba: Array1<F>,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: F,
        left: Box<Node<F>>,
        right: Box<Node<F>>,
    },
}

impl<F: Float> Node<F> {
    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// A CART classification tree.
///
/// Nodes are split on the threshold that most reduces Gini impurity; a point
/// goes left when its feature value is `<=` the threshold. Leaves keep the
/// class distribution of the training samples that reached them.
///
/// # Type Parameters
///
/// * `L`: The label type. Classes are kept in ascending order, so ties in
///   prediction resolve toward the smallest label.
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
#[derive(Debug, Clone)]
pub struct DecisionTree<L, F>
where
    L: Clone + Eq + Ord + Hash + Debug,
    F: Float,
{
    classes: Vec<L>,
    root: Node<F>,
    n_features: usize,
    importances: Array1<F>,
}

impl<L, F> DecisionTree<L, F>
where
    L: Clone + Eq + Ord + Hash + Debug,
    F: Float,
{
    /// Trains a tree on every point of `data`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::EmptyDataSet` for empty data,
    /// `TreeError::MismatchedDimensions` if points disagree on their
    /// dimension, `TreeError::NonFiniteFeature` for NaN/infinite features and
    /// `TreeError::InvalidParams` for unusable parameters.
    pub fn fit<R: Rng + ?Sized>(
        data: &[DataPoint<L, F>],
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self, TreeError> {
        let classes = sorted_labels(data);
        let sample: Vec<usize> = (0..data.len()).collect();
        Self::fit_sample(data, &sample, classes, params, rng)
    }

    /// Trains a tree on the points of `data` selected by `sample`.
    ///
    /// `sample` may repeat indices (bootstrap sampling). `classes` fixes the
    /// class list the leaves report probabilities for, so trees trained on
    /// different samples of the same data stay comparable.
    pub fn fit_sample<R: Rng + ?Sized>(
        data: &[DataPoint<L, F>],
        sample: &[usize],
        mut classes: Vec<L>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self, TreeError> {
        params.validate()?;
        if data.is_empty() || sample.is_empty() {
            return Err(TreeError::EmptyDataSet);
        }
        if let Some(&bad) = sample.iter().find(|&&i| i >= data.len()) {
            return Err(TreeError::SampleOutOfRange(bad));
        }
        let n_features = feature_dim(data).ok_or(TreeError::MismatchedDimensions)?;

        for (point, dp) in data.iter().enumerate() {
            if let Some(feature) = dp.features.iter().position(|v| !v.is_finite()) {
                return Err(TreeError::NonFiniteFeature { point, feature });
            }
        }

        classes.sort();
        classes.dedup();
        let targets = data
            .iter()
            .map(|dp| {
                classes
                    .binary_search(&dp.label)
                    .map_err(|_| TreeError::UnknownLabel(format!("{:?}", dp.label)))
            })
            .collect::<Result<Vec<usize>, TreeError>>()?;

        let x = Array2::from_shape_fn((data.len(), n_features), |(i, j)| data[i].features[j]);

        let mut builder = Builder {
            x: &x,
            y: &targets,
            n_classes: classes.len(),
            n_candidates: params.max_features.resolve(n_features),
            params,
            importances: Array1::zeros(n_features),
        };
        let root = builder.build(sample.to_vec(), 0, rng);

        let mut importances = builder.importances;
        let total = importances.sum();
        if total > F::zero() {
            importances.mapv_inplace(|v| v / total);
        }

        Ok(Self {
            classes,
            root,
            n_features,
            importances,
        })
    }

    /// Class probabilities for `features`, indexed like [`Self::classes`].
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DimensionMismatch` if `features` has the wrong length.
    pub fn predict_proba(&self, features: ArrayView1<F>) -> Result<ArrayView1<'_, F>, TreeError> {
        if features.len() != self.n_features {
            return Err(TreeError::DimensionMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }

        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { proba, .. } => return Ok(proba.view()),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    /// Predicts the most probable class for `features`.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<L, TreeError> {
        let proba = self.predict_proba(features)?;
        argmax(proba)
            .and_then(|i| self.classes.get(i).cloned())
            .ok_or(TreeError::EmptyDataSet)
    }

    /// The classes this tree reports probabilities for, in ascending order.
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Impurity-based feature importances, summing to one (all zero for a
    /// tree that never split).
    pub fn feature_importances(&self) -> ArrayView1<'_, F> {
        self.importances.view()
    }

    /// Number of split levels on the longest path; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }

    /// Number of training samples that reached the leaf selected by `features`.
    pub fn leaf_size(&self, features: ArrayView1<F>) -> Result<usize, TreeError> {
        self.predict_proba(features)?;
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { n_samples, .. } => return Ok(*n_samples),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }
}

struct SplitCandidate<F> {
    feature: usize,
    threshold: F,
    gain: F,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Recursive tree growth over a dense copy of the training features.
struct Builder<'a, F: Float> {
    x: &'a Array2<F>,
    y: &'a [usize],
    n_classes: usize,
    n_candidates: usize,
    params: &'a TreeParams,
    importances: Array1<F>,
}

impl<F: Float> Builder<'_, F> {
    fn build<R: Rng + ?Sized>(&mut self, samples: Vec<usize>, depth: usize, rng: &mut R) -> Node<F> {
        let counts = self.class_counts(&samples);
        let impurity = gini::<F>(&counts, samples.len());

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || samples.len() < self.params.min_samples_split || impurity <= F::zero() {
            return self.leaf(&counts, samples.len());
        }

        match self.best_split(&samples, impurity, rng) {
            Some(split) => {
                self.importances[split.feature] += split.gain * F::from_count(samples.len());
                let left = self.build(split.left, depth + 1, rng);
                let right = self.build(split.right, depth + 1, rng);
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => self.leaf(&counts, samples.len()),
        }
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], n_samples: usize) -> Node<F> {
        let total = F::from_count(n_samples.max(1));
        let proba = counts.iter().map(|&c| F::from_count(c) / total).collect();
        Node::Leaf { proba, n_samples }
    }

    /// Visits the features in random order for the threshold with the largest
    /// impurity decrease. At least `n_candidates` features are examined, and
    /// more while none of them yields a valid split. Returns `None` when no
    /// feature improves on `parent`.
    fn best_split<R: Rng + ?Sized>(
        &self,
        samples: &[usize],
        parent: F,
        rng: &mut R,
    ) -> Option<SplitCandidate<F>> {
        let parent_counts = self.class_counts(samples);
        let mut order = samples.to_vec();
        let mut best: Option<(usize, F, F)> = None;

        let n_features = self.x.ncols();
        for (visited, feature) in feature_subset(n_features, n_features, rng).into_iter().enumerate() {
            if visited >= self.n_candidates && best.is_some() {
                break;
            }
            if let Some((threshold, gain)) = self.scan_feature(feature, &mut order, parent, &parent_counts) {
                if best.is_none_or(|(_, _, g)| gain > g) {
                    best = Some((feature, threshold, gain));
                }
            }
        }

        let (feature, threshold, gain) = best?;
        let column = self.x.column(feature);
        let (left, right): (Vec<usize>, Vec<usize>) =
            samples.iter().copied().partition(|&i| column[i] <= threshold);
        Some(SplitCandidate {
            feature,
            threshold,
            gain,
            left,
            right,
        })
    }

    /// Best `(threshold, gain)` on one feature, sweeping the samples in
    /// sorted order. `order` is scratch space holding the node's samples.
    fn scan_feature(
        &self,
        feature: usize,
        order: &mut [usize],
        parent: F,
        parent_counts: &[usize],
    ) -> Option<(F, F)> {
        let n = order.len();
        let n_total = F::from_count(n);
        let min_leaf = self.params.min_samples_leaf;
        let two = F::one() + F::one();

        let column = self.x.column(feature);
        order.sort_by(|&a, &b| column[a].partial_cmp(&column[b]).unwrap_or(Ordering::Equal));

        let mut left = vec![0usize; self.n_classes];
        let mut right = parent_counts.to_vec();
        let mut best: Option<(F, F)> = None;

        for pos in 0..n - 1 {
            let class = self.y[order[pos]];
            left[class] += 1;
            right[class] -= 1;

            let here = column[order[pos]];
            let next = column[order[pos + 1]];
            if next <= here {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let weighted = (F::from_count(n_left) * gini::<F>(&left, n_left)
                + F::from_count(n_right) * gini::<F>(&right, n_right))
                / n_total;
            let gain = parent - weighted;
            if gain > F::epsilon() && best.is_none_or(|(_, g)| gain > g) {
                let mut threshold = here + (next - here) / two;
                if threshold >= next {
                    threshold = here;
                }
                best = Some((threshold, gain));
            }
        }
        best
    }
}

/// Gini impurity of a class histogram holding `n` samples.
fn gini<F: Float>(counts: &[usize], n: usize) -> F {
    if n == 0 {
        return F::zero();
    }
    let total = F::from_count(n);
    let sum_sq: F = counts
        .iter()
        .map(|&c| {
            let p = F::from_count(c) / total;
            p * p
        })
        .sum();
    F::one() - sum_sq
}
