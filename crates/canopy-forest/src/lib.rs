//! Bagged CART ensemble for binary classification.
//!
//! Trains a forest of Gini/Entropy decision trees on bootstrap resamples,
//! restricting each split to a random subset of features. Trees are built in
//! parallel via rayon with one deterministic seed per tree. The fitted forest
//! exposes positive-class probabilities and mean-decrease-in-impurity
//! feature importances.

mod config;
mod error;
mod forest;
mod importance;
mod node;
mod predict;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use error::ForestError;
pub use forest::RandomForest;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use split::SplitCriterion;
pub use tree::DecisionTree;
