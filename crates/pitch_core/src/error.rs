//! Error types for the pitch recommendation engine

use std::fmt;

use crate::artifact::ArtifactError;

/// Errors surfaced by corpus processing, training, and recommendation
#[derive(Debug)]
pub enum PitchError {
    /// Source data that cannot be worked around: a malformed run-expectancy
    /// table, a corpus with no target-label column
    DataIntegrity { source: String, detail: String },
    /// A required model artifact does not exist on disk
    ModelNotFound { path: String },
    /// A stored artifact carries no usable feature-name list
    IncompatibleSchema(String),
    /// Training was asked to fit on zero usable rows
    EmptyTrainingSet(String),
    /// File IO outside the artifact layer (run-expectancy CSVs)
    Io(String),
    /// Artifact encode/decode failure
    Artifact(ArtifactError),
}

impl fmt::Display for PitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PitchError::DataIntegrity { source, detail } => {
                write!(f, "Data integrity error in {}: {}", source, detail)
            }
            PitchError::ModelNotFound { path } => {
                write!(f, "Model artifact not found: {}", path)
            }
            PitchError::IncompatibleSchema(msg) => {
                write!(f, "Incompatible feature schema: {}", msg)
            }
            PitchError::EmptyTrainingSet(msg) => {
                write!(f, "Empty training set: {}", msg)
            }
            PitchError::Io(msg) => {
                write!(f, "IO error: {}", msg)
            }
            PitchError::Artifact(err) => {
                write!(f, "Artifact error: {}", err)
            }
        }
    }
}

impl std::error::Error for PitchError {}

impl From<ArtifactError> for PitchError {
    fn from(err: ArtifactError) -> Self {
        match err {
            // A missing file is a policy-level condition callers match on,
            // so it keeps its own variant instead of hiding inside Artifact.
            ArtifactError::FileNotFound { path } => PitchError::ModelNotFound { path },
            other => PitchError::Artifact(other),
        }
    }
}

/// Result type alias for pitch engine operations
pub type Result<T> = std::result::Result<T, PitchError>;
