//! Modification-time keyed artifact cache
//!
//! Loads are cached per path and invalidated when the file's mtime moves,
//! so a retrain picked up by the filesystem swaps in on the next request.
//! The cache is plain data handed to whoever needs it; nothing here is a
//! process-wide singleton, and tests get `reset` to force reloads.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use rustc_hash::FxHashMap;

use super::error::ArtifactError;
use super::store::{load_classifier, load_location, ClassifierArtifact, LocationArtifact};

#[derive(Default)]
pub struct ArtifactCache {
    classifiers: RwLock<FxHashMap<PathBuf, (SystemTime, Arc<ClassifierArtifact>)>>,
    locations: RwLock<FxHashMap<PathBuf, (SystemTime, Arc<LocationArtifact>)>>,
}

fn modified_time(path: &Path) -> Result<SystemTime, ArtifactError> {
    let metadata = fs::metadata(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ArtifactError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            ArtifactError::Io(e)
        }
    })?;
    Ok(metadata.modified()?)
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached classifier for `path`, reloading when the file changed on
    /// disk since the cached load.
    pub fn classifier(&self, path: &Path) -> Result<Arc<ClassifierArtifact>, ArtifactError> {
        let mtime = modified_time(path)?;
        {
            let cached = self
                .classifiers
                .read()
                .expect("artifact cache lock poisoned");
            if let Some((cached_at, artifact)) = cached.get(path) {
                if *cached_at == mtime {
                    return Ok(Arc::clone(artifact));
                }
            }
        }

        let artifact = Arc::new(load_classifier(path)?);
        self.classifiers
            .write()
            .expect("artifact cache lock poisoned")
            .insert(path.to_path_buf(), (mtime, Arc::clone(&artifact)));
        log::debug!("artifact cache loaded classifier: {}", path.display());
        Ok(artifact)
    }

    /// Cached location model for `path`, with the same mtime policy.
    pub fn location(&self, path: &Path) -> Result<Arc<LocationArtifact>, ArtifactError> {
        let mtime = modified_time(path)?;
        {
            let cached = self.locations.read().expect("artifact cache lock poisoned");
            if let Some((cached_at, artifact)) = cached.get(path) {
                if *cached_at == mtime {
                    return Ok(Arc::clone(artifact));
                }
            }
        }

        let artifact = Arc::new(load_location(path)?);
        self.locations
            .write()
            .expect("artifact cache lock poisoned")
            .insert(path.to_path_buf(), (mtime, Arc::clone(&artifact)));
        log::debug!("artifact cache loaded location model: {}", path.display());
        Ok(artifact)
    }

    /// Drop every cached entry, forcing the next request to hit disk.
    pub fn reset(&self) {
        self.classifiers
            .write()
            .expect("artifact cache lock poisoned")
            .clear();
        self.locations
            .write()
            .expect("artifact cache lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::store::{save_classifier, save_location};
    use crate::forest::{DecisionTree, ForestClassifier, ForestRegressor, TreeNode, LEAF};
    use crate::train::{TrainedClassifier, TrainedLocationModel};
    use std::time::Duration;

    fn leaf_tree(value: Vec<f64>) -> DecisionTree {
        DecisionTree {
            nodes: vec![TreeNode {
                feature: LEAF,
                threshold: 0.0,
                left: LEAF,
                right: LEAF,
                value: Some(value),
            }],
        }
    }

    fn classifier_with_labels(labels: &[&str]) -> TrainedClassifier {
        let n = labels.len();
        TrainedClassifier {
            forest: ForestClassifier {
                trees: vec![leaf_tree(vec![1.0 / n as f64; n])],
                n_features: 1,
                n_classes: n,
            },
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn location_model() -> TrainedLocationModel {
        TrainedLocationModel {
            forest: ForestRegressor {
                trees: vec![leaf_tree(vec![0.1, 2.0])],
                n_features: 2,
                n_outputs: 2,
            },
        }
    }

    fn bump_mtime(path: &Path, seconds_ahead: u64) {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(path)
            .expect("open for mtime bump");
        file.set_modified(SystemTime::now() + Duration::from_secs(seconds_ahead))
            .expect("set mtime");
    }

    #[test]
    fn test_unchanged_file_returns_shared_instance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pitch_model.bin");
        save_classifier(&path, &classifier_with_labels(&["FF", "SL"]), &[]).expect("save");

        let cache = ArtifactCache::new();
        let first = cache.classifier(&path).expect("first load");
        let second = cache.classifier(&path).expect("second load");
        assert!(
            Arc::ptr_eq(&first, &second),
            "Unchanged file should not reload"
        );
    }

    #[test]
    fn test_mtime_change_triggers_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pitch_model.bin");
        save_classifier(&path, &classifier_with_labels(&["FF", "SL"]), &[]).expect("save v1");

        let cache = ArtifactCache::new();
        let first = cache.classifier(&path).expect("first load");
        assert_eq!(first.classifier.labels.len(), 2);

        save_classifier(&path, &classifier_with_labels(&["CU", "FF", "SL"]), &[])
            .expect("save v2");
        bump_mtime(&path, 10);

        let second = cache.classifier(&path).expect("reload");
        assert_eq!(
            second.classifier.labels.len(),
            3,
            "New artifact should be visible after the mtime moved"
        );
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reset_forces_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("location_model.bin");
        save_location(&path, &location_model()).expect("save");

        let cache = ArtifactCache::new();
        let first = cache.location(&path).expect("first load");
        cache.reset();
        let second = cache.location(&path).expect("after reset");
        assert!(
            !Arc::ptr_eq(&first, &second),
            "Reset must drop cached entries"
        );
        assert_eq!(second.model.predict(&[0.0, 0.0]), (0.1, 2.0));
    }

    #[test]
    fn test_missing_file_is_not_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pitch_model.bin");

        let cache = ArtifactCache::new();
        let err = cache.classifier(&path).expect_err("missing");
        assert!(matches!(err, ArtifactError::FileNotFound { .. }));

        // The artifact appearing later must be picked up.
        save_classifier(&path, &classifier_with_labels(&["FF"]), &[]).expect("save");
        assert!(cache.classifier(&path).is_ok());
    }

    #[test]
    fn test_classifier_and_location_caches_are_independent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let classifier_path = dir.path().join("pitch_model.bin");
        let location_path = dir.path().join("location_model.bin");
        save_classifier(&classifier_path, &classifier_with_labels(&["FF"]), &[]).expect("save c");
        save_location(&location_path, &location_model()).expect("save l");

        let cache = ArtifactCache::new();
        assert!(cache.classifier(&classifier_path).is_ok());
        assert!(cache.location(&location_path).is_ok());
        assert!(
            cache.classifier(&location_path).is_err(),
            "A location artifact does not deserialize as a classifier"
        );
    }
}
