//! Model artifact persistence
//!
//! Trained models are stored as a MessagePack payload, LZ4-compressed,
//! with a trailing SHA-256 checksum over the compressed bytes. Writes go
//! through a temp file and an atomic rename so readers never observe a
//! half-written artifact. Loads verify the checksum, the format version,
//! and the structural integrity of every tree before handing the model out.

pub mod cache;
pub mod error;
pub mod format;
pub mod store;

pub use cache::ArtifactCache;
pub use error::ArtifactError;
pub use format::ARTIFACT_VERSION;
pub use store::{
    file_checksum, load_classifier, load_location, save_classifier, save_location,
    ArtifactMetadata, ClassifierArtifact, LocationArtifact,
};
