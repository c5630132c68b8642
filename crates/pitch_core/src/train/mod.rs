//! Training harness: splits, metrics, and the two model trainers

pub mod classifier;
pub mod location;
pub mod metrics;
pub mod split;

pub use classifier::{balanced_weights, train_classifier, TrainedClassifier};
pub use location::{train_location, TrainedLocationModel};
pub use metrics::{
    accuracy, rmse, top_k_accuracy, top_k_indices, ClassMetrics, ClassificationReport,
    RegressionReport,
};
pub use split::{shuffled_split, stratified_split};
