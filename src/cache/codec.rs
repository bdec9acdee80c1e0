//! Snapshot Encoding
//!
//! Blob encoding for cache entries: the entire [`RankingSnapshot`] is one
//! JSON value under one key. Round-trip fidelity is the contract here:
//! `decode(encode(x)) == x` for every snapshot, empty included.

use bytes::Bytes;

use crate::domain::RankingSnapshot;
use crate::error::{Error, Result};

/// Serialize a snapshot to the bytes stored in the cache.
pub fn encode_snapshot(snapshot: &RankingSnapshot) -> Result<Bytes> {
    let buf = serde_json::to_vec(snapshot)
        .map_err(|e| Error::Internal(format!("Failed to encode snapshot: {}", e)))?;
    Ok(Bytes::from(buf))
}

/// Deserialize stored bytes back into a snapshot.
///
/// A decode failure is `CacheCorrupt`, never treated as a miss: corrupt data
/// must surface rather than mask staleness bugs.
pub fn decode_snapshot(key: &str, bytes: &[u8]) -> Result<RankingSnapshot> {
    serde_json::from_slice(bytes).map_err(|e| Error::corrupt(key, e.to_string()))
}
