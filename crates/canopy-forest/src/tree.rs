use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::node::{Impurity, Node, NodeIndex, Step};
use crate::split::{SplitCriterion, find_best_split};

/// Growth parameters for one tree, resolved by the forest before training.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) criterion: SplitCriterion,
    pub(crate) min_node_size: usize,
    pub(crate) max_features: usize,
    pub(crate) seed: u64,
}

/// A fitted CART decision tree.
///
/// Stored as an arena `Vec<Node>` with index references; the root is node 0.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

impl DecisionTree {
    /// Grow a tree on column-major, pre-validated data.
    ///
    /// `sample_indices` selects (possibly repeated) rows of the columns.
    pub(crate) fn grow(
        col_features: &[Vec<f64>],
        labels: &[usize],
        sample_indices: &[usize],
        params: TreeParams,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut arena = Vec::new();
        build_node(col_features, labels, sample_indices, &params, &mut rng, &mut arena);
        trace!(n_nodes = arena.len(), "tree grown");
        Self {
            nodes: arena,
            n_features: col_features.len(),
        }
    }

    /// Positive-class probability of the leaf `sample` falls into.
    ///
    /// The caller guarantees `sample.len() == n_features`.
    pub(crate) fn positive_fraction(&self, sample: &[f64]) -> f64 {
        let mut idx = NodeIndex::new(0);
        loop {
            match self.nodes[idx.index()].step(sample) {
                Step::Descend(child) => idx = child,
                Step::Stop(fraction) => return fraction,
            }
        }
    }

    /// Unnormalized Mean Decrease in Impurity per feature.
    ///
    /// Sums `impurity_decrease` over split nodes by feature. All zeros when
    /// the tree is a single leaf.
    #[must_use]
    pub fn impurity_decreases(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for (feature, decrease) in self.nodes.iter().filter_map(Node::split_gain) {
            totals[feature.index()] += decrease;
        }
        totals
    }

    /// Return the arena of nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}

/// Recursively build the subtree for `sample_indices` and return its index.
fn build_node(
    col_features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    params: &TreeParams,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = sample_indices.len();
    let mut counts = [0usize; 2];
    for &si in sample_indices {
        counts[labels[si]] += 1;
    }
    let impurity = params.criterion.impurity(counts);

    let leaf = |arena: &mut Vec<Node>, impurity: Impurity| {
        let positive_fraction = if n_samples == 0 {
            0.0
        } else {
            counts[1] as f64 / n_samples as f64
        };
        arena.push(Node::Leaf {
            positive_fraction,
            impurity,
            n_samples,
        });
        NodeIndex::new(arena.len() - 1)
    };

    if n_samples < params.min_node_size || impurity.value() == 0.0 {
        return leaf(arena, impurity);
    }

    let Some(split) = find_best_split(
        col_features,
        labels,
        sample_indices,
        params.criterion,
        params.max_features,
        rng,
    ) else {
        return leaf(arena, impurity);
    };

    // Reserve this node's slot so children land after it.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        positive_fraction: 0.0,
        impurity,
        n_samples,
    });

    let left = build_node(col_features, labels, &split.left_indices, params, rng, arena);
    let right = build_node(col_features, labels, &split.right_indices, params, rng, arena);

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        impurity,
        n_samples,
        impurity_decrease: split.impurity_decrease,
    };
    NodeIndex::new(node_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min_node_size: usize) -> TreeParams {
        TreeParams {
            criterion: SplitCriterion::Gini,
            min_node_size,
            max_features: 1,
            seed: 7,
        }
    }

    #[test]
    fn separable_tree_is_pure() {
        let cols = vec![vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let idx: Vec<usize> = (0..6).collect();
        let tree = DecisionTree::grow(&cols, &labels, &idx, params(2));

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.positive_fraction(&[0.5]), 0.0);
        assert_eq!(tree.positive_fraction(&[11.5]), 1.0);
        assert!(tree.impurity_decreases()[0] > 0.0);
    }

    #[test]
    fn min_node_size_stops_growth() {
        let cols = vec![vec![0.0, 1.0, 2.0, 3.0]];
        let labels = vec![0, 1, 0, 1];
        let idx: Vec<usize> = (0..4).collect();
        let tree = DecisionTree::grow(&cols, &labels, &idx, params(5));

        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.positive_fraction(&[1.0]), 0.5);
        assert_eq!(tree.impurity_decreases(), vec![0.0]);
    }
}
