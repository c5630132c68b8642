//! Artifact persistence errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("Decompression error")]
    Decompression,

    #[error("Corrupted artifact: {0}")]
    Corrupted(String),

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Artifact not found: {path}")]
    FileNotFound { path: String },
}

impl ArtifactError {
    /// Whether retrying or retraining can clear the condition without
    /// touching code.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArtifactError::Io(_)
                | ArtifactError::FileNotFound { .. }
                | ArtifactError::VersionMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ArtifactError::FileNotFound {
            path: "models/pitch_model.bin".to_string()
        }
        .is_recoverable());
        assert!(ArtifactError::VersionMismatch {
            found: 9,
            expected: 1
        }
        .is_recoverable());
        assert!(!ArtifactError::ChecksumMismatch.is_recoverable());
        assert!(!ArtifactError::Corrupted("truncated".to_string()).is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = ArtifactError::VersionMismatch {
            found: 2,
            expected: 1,
        };
        assert_eq!(err.to_string(), "Version mismatch: found 2, expected 1");
        let err = ArtifactError::FileNotFound {
            path: "x.bin".to_string(),
        };
        assert!(err.to_string().contains("x.bin"));
    }
}
