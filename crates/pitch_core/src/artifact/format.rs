//! Binary envelope shared by every persisted model artifact
//!
//! Layout: MessagePack with named fields, LZ4-compressed with a prepended
//! size, then a 32-byte SHA-256 of the compressed payload appended. Named
//! fields keep old artifacts readable when structs grow; the checksum
//! catches truncation and bit rot before deserialization runs.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::ArtifactError;

/// Current artifact format version. Artifacts embed it in their payload;
/// loading rejects anything newer.
pub const ARTIFACT_VERSION: u32 = 1;

const CHECKSUM_LEN: usize = 32;

/// Encoded artifact bytes plus the pre-compression size for metadata.
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub raw_size: u64,
}

pub fn encode<T: Serialize>(payload: &T) -> Result<Encoded, ArtifactError> {
    let msgpack = rmp_serde::to_vec_named(payload)?;
    let raw_size = msgpack.len() as u64;
    let mut bytes = compress_prepend_size(&msgpack);

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let checksum = hasher.finalize();
    bytes.extend_from_slice(&checksum);

    Ok(Encoded { bytes, raw_size })
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ArtifactError> {
    // 4-byte LZ4 size prefix plus the trailing checksum is the minimum
    // well-formed artifact.
    if bytes.len() < 4 + CHECKSUM_LEN {
        return Err(ArtifactError::Corrupted(
            "shorter than size prefix plus checksum".to_string(),
        ));
    }
    let (payload, stored_checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);

    let mut hasher = Sha256::new();
    hasher.update(payload);
    if hasher.finalize().as_slice() != stored_checksum {
        return Err(ArtifactError::ChecksumMismatch);
    }

    let msgpack =
        decompress_size_prepended(payload).map_err(|_| ArtifactError::Decompression)?;
    Ok(rmp_serde::from_slice(&msgpack)?)
}
