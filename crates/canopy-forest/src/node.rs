use std::fmt;

/// Zero-based feature column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the column position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position of a node in a tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Impurity of a node under the tree's split criterion.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Where a sample goes from one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
    /// Continue at this child.
    Descend(NodeIndex),
    /// Stop; the leaf's positive-class fraction.
    Stop(f64),
}

/// One node of a binary-classification tree arena.
///
/// Children are referenced by [`NodeIndex`]; the root is always index 0.
#[derive(Debug, Clone)]
pub enum Node {
    /// An interior node. Samples with `value <= threshold` go left.
    Split {
        /// Feature tested.
        feature: FeatureIndex,
        /// Split threshold.
        threshold: f64,
        /// Left child.
        left: NodeIndex,
        /// Right child.
        right: NodeIndex,
        /// Impurity before the split.
        impurity: Impurity,
        /// Training samples (bootstrap multiplicity included) reaching the node.
        n_samples: usize,
        /// `n_samples * impurity` minus the children's weighted impurities.
        impurity_decrease: f64,
    },
    /// A terminal node.
    Leaf {
        /// Fraction of the leaf's training samples that are positive.
        positive_fraction: f64,
        /// Impurity of the leaf's samples.
        impurity: Impurity,
        /// Training samples in the leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the node's impurity (before splitting, for interior nodes).
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Return the positive-class fraction of a leaf, or `None` for a split.
    #[must_use]
    pub fn positive_fraction(&self) -> Option<f64> {
        match self {
            Node::Leaf {
                positive_fraction, ..
            } => Some(*positive_fraction),
            Node::Split { .. } => None,
        }
    }

    /// Return the tested feature and its impurity decrease, or `None` for a leaf.
    #[must_use]
    pub fn split_gain(&self) -> Option<(FeatureIndex, f64)> {
        match self {
            Node::Split {
                feature,
                impurity_decrease,
                ..
            } => Some((*feature, *impurity_decrease)),
            Node::Leaf { .. } => None,
        }
    }

    /// Route `sample` one level down.
    pub(crate) fn step(&self, sample: &[f64]) -> Step {
        match self {
            Node::Leaf {
                positive_fraction, ..
            } => Step::Stop(*positive_fraction),
            Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[feature.index()] <= *threshold {
                    Step::Descend(*left)
                } else {
                    Step::Descend(*right)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> Node {
        Node::Split {
            feature: FeatureIndex::new(1),
            threshold: 1.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            impurity: Impurity::new(0.5),
            n_samples: 16,
            impurity_decrease: 2.0,
        }
    }

    #[test]
    fn split_routes_on_threshold() {
        let node = split();
        assert_eq!(node.step(&[9.0, 1.5]), Step::Descend(NodeIndex::new(1)));
        assert_eq!(node.step(&[-9.0, 1.6]), Step::Descend(NodeIndex::new(2)));
        assert_eq!(node.split_gain(), Some((FeatureIndex::new(1), 2.0)));
        assert_eq!(node.positive_fraction(), None);
        assert_eq!(node.n_samples(), 16);
    }

    #[test]
    fn leaf_stops() {
        let leaf = Node::Leaf {
            positive_fraction: 0.25,
            impurity: Impurity::new(0.375),
            n_samples: 8,
        };
        assert!(leaf.is_leaf());
        assert_eq!(leaf.step(&[0.0, 0.0]), Step::Stop(0.25));
        assert_eq!(leaf.split_gain(), None);
        assert_eq!(leaf.impurity().value(), 0.375);
    }

    #[test]
    fn impurity_display_has_six_decimals() {
        assert_eq!(format!("{}", Impurity::new(0.5)), "0.500000");
    }
}
