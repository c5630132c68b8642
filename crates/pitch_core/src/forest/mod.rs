//! Hand-rolled random forests over flat-array CART trees

pub mod fit;
pub mod tree;

pub use fit::{fit_classifier, fit_regressor, ForestConfig};
pub use tree::{DecisionTree, ForestClassifier, ForestRegressor, TreeNode, LEAF};
