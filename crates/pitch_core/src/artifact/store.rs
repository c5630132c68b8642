//! On-disk artifact structs and atomic persistence

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ArtifactError;
use super::format::{decode, encode, ARTIFACT_VERSION};
use crate::features::warn_on_leakage;
use crate::train::{TrainedClassifier, TrainedLocationModel};

/// Classifier artifact: the model plus the exact feature-name order it was
/// fit on. No timestamps in the payload, so retraining on identical data
/// reproduces identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub version: u32,
    pub classifier: TrainedClassifier,
    pub feature_names: Vec<String>,
}

/// Location artifact: the regressor alone. Its input order is the
/// classifier schema plus the trailing pitch-type code column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationArtifact {
    pub version: u32,
    pub model: TrainedLocationModel,
}

/// Descriptive record returned by every save, for logs and sidecar files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub schema_version: u32,
    /// SHA-256 of the stored file, hex-encoded
    pub checksum: String,
    /// RFC3339 creation time
    pub created_at: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("bin.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn metadata_for(bytes: &[u8], raw_size: u64) -> ArtifactMetadata {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let checksum = hex_string(&hasher.finalize());
    let compressed_size = bytes.len() as u64;
    ArtifactMetadata {
        schema_version: ARTIFACT_VERSION,
        checksum,
        created_at: Utc::now().to_rfc3339(),
        original_size: raw_size,
        compressed_size,
        compression_ratio: if raw_size > 0 {
            compressed_size as f64 / raw_size as f64 * 100.0
        } else {
            0.0
        },
    }
}

fn hex_string(digest: &[u8]) -> String {
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// SHA-256 of an artifact file on disk, hex-encoded. Used by integrity
/// verification against a recorded checksum.
pub fn file_checksum(path: &Path) -> Result<String, ArtifactError> {
    let bytes = read_artifact_bytes(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex_string(&hasher.finalize()))
}

fn read_artifact_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(fs::read(path)?)
}

pub fn save_classifier(
    path: &Path,
    classifier: &TrainedClassifier,
    feature_names: &[String],
) -> Result<ArtifactMetadata, ArtifactError> {
    let artifact = ClassifierArtifact {
        version: ARTIFACT_VERSION,
        classifier: classifier.clone(),
        feature_names: feature_names.to_vec(),
    };
    let encoded = encode(&artifact)?;
    write_atomic(path, &encoded.bytes)?;
    let metadata = metadata_for(&encoded.bytes, encoded.raw_size);
    log::info!(
        "classifier artifact saved: {} ({} -> {} bytes, {:.2}%)",
        path.display(),
        metadata.original_size,
        metadata.compressed_size,
        metadata.compression_ratio
    );
    Ok(metadata)
}

pub fn load_classifier(path: &Path) -> Result<ClassifierArtifact, ArtifactError> {
    let bytes = read_artifact_bytes(path)?;
    let artifact: ClassifierArtifact = decode(&bytes)?;
    if artifact.version > ARTIFACT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            found: artifact.version,
            expected: ARTIFACT_VERSION,
        });
    }
    artifact
        .classifier
        .forest
        .validate()
        .map_err(ArtifactError::Corrupted)?;
    if artifact.classifier.labels.len() != artifact.classifier.forest.n_classes {
        return Err(ArtifactError::Corrupted(format!(
            "label list length {} does not match {} classes",
            artifact.classifier.labels.len(),
            artifact.classifier.forest.n_classes
        )));
    }
    warn_on_leakage(&artifact.feature_names);
    Ok(artifact)
}

pub fn save_location(
    path: &Path,
    model: &TrainedLocationModel,
) -> Result<ArtifactMetadata, ArtifactError> {
    let artifact = LocationArtifact {
        version: ARTIFACT_VERSION,
        model: model.clone(),
    };
    let encoded = encode(&artifact)?;
    write_atomic(path, &encoded.bytes)?;
    let metadata = metadata_for(&encoded.bytes, encoded.raw_size);
    log::info!(
        "location artifact saved: {} ({} -> {} bytes, {:.2}%)",
        path.display(),
        metadata.original_size,
        metadata.compressed_size,
        metadata.compression_ratio
    );
    Ok(metadata)
}

pub fn load_location(path: &Path) -> Result<LocationArtifact, ArtifactError> {
    let bytes = read_artifact_bytes(path)?;
    let artifact: LocationArtifact = decode(&bytes)?;
    if artifact.version > ARTIFACT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            found: artifact.version,
            expected: ARTIFACT_VERSION,
        });
    }
    artifact
        .model
        .forest
        .validate()
        .map_err(ArtifactError::Corrupted)?;
    Ok(artifact)
}
