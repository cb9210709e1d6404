//! CART decision tree classifier over sparse features.
//!
//! Trees are grown greedily. At every node a random subset of the features
//! is examined and the threshold with the largest weighted Gini impurity
//! decrease is chosen. A node becomes a leaf when:
//! - the maximum depth is reached
//! - it holds fewer than `min_samples_split` samples, or fewer than
//!   `2 * min_samples_leaf`
//! - it is pure
//! - no examined feature admits a split with `min_samples_leaf` samples on
//!   both sides
//!
//! Leaves store the weighted class distribution of their samples, which is
//! what [`DecisionTree::predict_proba`] returns.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::ml::sparse::SparseVector;

/// Impurity below which a node counts as pure.
const PURITY_EPSILON: f64 = 1e-7;

/// Minimum gap between two feature values for a threshold between them.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Growth limits of a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (`None` for unlimited).
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split.
    pub min_samples_split: usize,
    /// Minimum samples in each leaf.
    pub min_samples_leaf: usize,
    /// Number of features drawn per split.
    pub max_features: usize,
}

/// Training data shared by all nodes of one tree.
struct TrainingSet<'a> {
    features: &'a [SparseVector],
    labels: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    n_features: usize,
}

/// A fitted classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<Box<TreeNode>>,
    n_classes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        /// Class probabilities, summing to 1.
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

struct Split {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl DecisionTree {
    /// Create an empty tree over `n_classes` classes.
    pub fn new(n_classes: usize) -> Self {
        Self {
            root: None,
            n_classes,
        }
    }

    /// Grow a tree.
    ///
    /// Samples with zero weight are ignored, which is how bootstrap samples
    /// are expressed.
    pub fn fit(
        features: &[SparseVector],
        labels: &[usize],
        weights: &[f64],
        n_classes: usize,
        n_features: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if features.len() != labels.len() || labels.len() != weights.len() {
            return Err(ClassifierError::invalid_argument(format!(
                "Length mismatch: {} feature rows, {} labels, {} weights",
                features.len(),
                labels.len(),
                weights.len()
            )));
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(ClassifierError::invalid_argument(format!(
                "Label {label} is out of range for {n_classes} classes"
            )));
        }

        let indices: Vec<usize> = (0..labels.len()).filter(|&i| weights[i] > 0.0).collect();
        if indices.is_empty() {
            return Err(ClassifierError::insufficient_data(
                "Cannot grow a tree without weighted samples",
            ));
        }

        let data = TrainingSet {
            features,
            labels,
            weights,
            n_classes,
            n_features,
        };
        let root = Self::build_tree(&data, indices, 0, params, rng);

        Ok(Self {
            root: Some(Box::new(root)),
            n_classes,
        })
    }

    /// Class probabilities for one sample. Uniform for an unfitted tree.
    pub fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        match self.root {
            Some(ref root) => Self::predict_node(root, features).to_vec(),
            None => vec![1.0 / self.n_classes.max(1) as f64; self.n_classes],
        }
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Depth of the tree (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_deref().map_or(0, node_depth)
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_deref().map_or(0, leaves)
    }

    fn build_tree(
        data: &TrainingSet<'_>,
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> TreeNode {
        let class_weights = Self::class_weights(data, &indices);
        let impurity = gini(&class_weights);

        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || indices.len() < params.min_samples_split
            || indices.len() < 2 * params.min_samples_leaf
            || impurity <= PURITY_EPSILON
        {
            return Self::leaf(class_weights);
        }

        match Self::find_best_split(data, &indices, &class_weights, impurity, params, rng) {
            Some(split) => TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(Self::build_tree(data, split.left, depth + 1, params, rng)),
                right: Box::new(Self::build_tree(data, split.right, depth + 1, params, rng)),
            },
            None => Self::leaf(class_weights),
        }
    }

    fn leaf(class_weights: Vec<f64>) -> TreeNode {
        let total: f64 = class_weights.iter().sum();
        let distribution = if total > 0.0 {
            class_weights.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / class_weights.len().max(1) as f64; class_weights.len()]
        };
        TreeNode::Leaf { distribution }
    }

    fn class_weights(data: &TrainingSet<'_>, indices: &[usize]) -> Vec<f64> {
        let mut totals = vec![0.0; data.n_classes];
        for &i in indices {
            totals[data.labels[i]] += data.weights[i];
        }
        totals
    }

    /// Draw the features examined at a node.
    ///
    /// `max_features` features are drawn without replacement from all
    /// features; the ones that are non-zero somewhere in the node count as
    /// hits. Returns the node's non-zero features in random order together
    /// with the number of non-constant features to examine (at least one).
    fn candidate_features(
        data: &TrainingSet<'_>,
        indices: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> (Vec<usize>, usize) {
        let mut active: Vec<usize> = indices
            .iter()
            .flat_map(|&i| data.features[i].iter().map(|(f, _)| f))
            .collect();
        active.sort_unstable();
        active.dedup();

        if active.is_empty() {
            return (active, 0);
        }

        let n_features = data.n_features.max(active.len());
        let draws = params.max_features.min(n_features);

        // Number of active features among `draws` draws without replacement.
        let mut remaining_active = active.len();
        let mut remaining = n_features;
        let mut hits = 0;
        for _ in 0..draws {
            if rng.random_range(0..remaining) < remaining_active {
                hits += 1;
                remaining_active -= 1;
            }
            remaining -= 1;
        }

        active.shuffle(rng);
        (active, hits.max(1))
    }

    fn find_best_split(
        data: &TrainingSet<'_>,
        indices: &[usize],
        node_weights: &[f64],
        node_impurity: f64,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Option<Split> {
        let node_total: f64 = node_weights.iter().sum();
        let min_leaf = params.min_samples_leaf.max(1);
        let mut best: Option<(usize, f64, f64)> = None;

        let (candidates, budget) = Self::candidate_features(data, indices, params, rng);
        let mut examined = 0;

        for feature in candidates {
            if examined >= budget {
                break;
            }

            let mut values: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (data.features[i].get(feature), i))
                .collect();
            values.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            // Constant features do not use up the budget.
            if values[values.len() - 1].0 <= values[0].0 + FEATURE_THRESHOLD {
                continue;
            }
            examined += 1;

            let mut left_weights = vec![0.0; data.n_classes];
            for pos in 0..values.len() - 1 {
                let (value, sample) = values[pos];
                left_weights[data.labels[sample]] += data.weights[sample];

                let n_left = pos + 1;
                let n_right = values.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let next_value = values[pos + 1].0;
                if next_value <= value + FEATURE_THRESHOLD {
                    continue;
                }

                let left_total: f64 = left_weights.iter().sum();
                let right_weights: Vec<f64> = node_weights
                    .iter()
                    .zip(&left_weights)
                    .map(|(n, l)| n - l)
                    .collect();
                let right_total = node_total - left_total;

                let improvement = node_total * node_impurity
                    - left_total * gini(&left_weights)
                    - right_total * gini(&right_weights);

                if best.is_none_or(|(_, _, b)| improvement > b) {
                    let mut threshold = value / 2.0 + next_value / 2.0;
                    if threshold >= next_value {
                        threshold = value;
                    }
                    best = Some((feature, threshold, improvement));
                }
            }
        }

        let (feature, threshold, _) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| data.features[i].get(feature) <= threshold);

        Some(Split {
            feature,
            threshold,
            left,
            right,
        })
    }

    fn predict_node<'a>(node: &'a TreeNode, features: &SparseVector) -> &'a [f64] {
        match node {
            TreeNode::Leaf { distribution } => distribution,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if features.get(*feature) <= *threshold {
                    Self::predict_node(left, features)
                } else {
                    Self::predict_node(right, features)
                }
            }
        }
    }
}

/// Gini impurity of weighted class totals.
fn gini(class_weights: &[f64]) -> f64 {
    let total: f64 = class_weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - class_weights
        .iter()
        .map(|w| {
            let p = w / total;
            p * p
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    fn toy_data() -> (Vec<SparseVector>, Vec<usize>) {
        // Class 0 uses feature 0, class 1 uses feature 1.
        let features = vec![
            SparseVector::from_pairs(vec![(0, 1.0)]),
            SparseVector::from_pairs(vec![(0, 0.8)]),
            SparseVector::from_pairs(vec![(0, 0.9), (1, 0.1)]),
            SparseVector::from_pairs(vec![(1, 1.0)]),
            SparseVector::from_pairs(vec![(1, 0.7)]),
            SparseVector::from_pairs(vec![(1, 0.9), (0, 0.2)]),
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        (features, labels)
    }

    #[test]
    fn test_fit_separable() {
        let (features, labels) = toy_data();
        let weights = vec![1.0; labels.len()];
        let mut rng = StdRng::seed_from_u64(7);

        let tree = DecisionTree::fit(&features, &labels, &weights, 2, 2, &params(), &mut rng).unwrap();

        for (x, &y) in features.iter().zip(&labels) {
            let proba = tree.predict_proba(x);
            assert_eq!(proba.len(), 2);
            assert!(proba[y] > 0.99, "sample of class {y} got {proba:?}");
        }
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn test_max_depth_zero_like_stump() {
        let (features, labels) = toy_data();
        let weights = vec![1.0; labels.len()];
        let mut rng = StdRng::seed_from_u64(7);
        let params = TreeParams {
            max_depth: Some(0),
            ..params()
        };

        let tree = DecisionTree::fit(&features, &labels, &weights, 2, 2, &params, &mut rng).unwrap();

        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict_proba(&features[0]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_weights_shift_leaf_distribution() {
        let (features, labels) = toy_data();
        let weights = vec![1.0, 1.0, 1.0, 3.0, 3.0, 3.0];
        let mut rng = StdRng::seed_from_u64(7);
        let params = TreeParams {
            max_depth: Some(0),
            ..params()
        };

        let tree = DecisionTree::fit(&features, &labels, &weights, 2, 2, &params, &mut rng).unwrap();

        let proba = tree.predict_proba(&features[0]);
        assert!((proba[0] - 0.25).abs() < 1e-12);
        assert!((proba[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let (features, labels) = toy_data();
        let weights = vec![1.0; labels.len()];
        let mut rng = StdRng::seed_from_u64(3);
        let params = TreeParams {
            min_samples_leaf: 4,
            ..params()
        };

        // Six samples cannot be split into two leaves of four.
        let tree = DecisionTree::fit(&features, &labels, &weights, 2, 2, &params, &mut rng).unwrap();
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_invalid_input() {
        let (features, labels) = toy_data();
        let mut rng = StdRng::seed_from_u64(1);

        let result = DecisionTree::fit(&features, &labels, &[1.0], 2, 2, &params(), &mut rng);
        assert!(matches!(result, Err(ClassifierError::InvalidArgument(_))));

        let zero = vec![0.0; labels.len()];
        let result = DecisionTree::fit(&features, &labels, &zero, 2, 2, &params(), &mut rng);
        assert!(matches!(result, Err(ClassifierError::InsufficientData(_))));
    }

    #[test]
    fn test_unfitted_tree_is_uniform() {
        let tree = DecisionTree::new(4);
        assert_eq!(tree.predict_proba(&SparseVector::new()), vec![0.25; 4]);
    }
}
