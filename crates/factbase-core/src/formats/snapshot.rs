//! # Snapshot Format
//!
//! Binary snapshot of a [`FactGraph`], for caching between runs. The TA
//! text format stays the exchange format; snapshots are a local fast path.
//!
//! Layout: 4 bytes magic (`FBSN`), 1 byte version, postcard payload.
//!
//! Size and header are validated before the payload is decoded.

use crate::graph::{FactGraph, SerializableGraph};
use crate::primitives::{MAX_SNAPSHOT_SIZE, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
use crate::types::FactError;

const HEADER_LEN: usize = 5;

/// Header preceding the snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), FactError> {
        if &self.magic != SNAPSHOT_MAGIC {
            return Err(FactError::Serialization(
                "not a fact snapshot (bad magic bytes)".to_string(),
            ));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(FactError::Serialization(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let [a, b, c, d] = self.magic;
        [a, b, c, d, self.version]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FactError> {
        let Some(&[a, b, c, d, version]) = bytes.first_chunk::<HEADER_LEN>() else {
            return Err(FactError::Serialization(format!(
                "snapshot too short: {} bytes, header needs {}",
                bytes.len(),
                HEADER_LEN
            )));
        };
        Ok(Self {
            magic: [a, b, c, d],
            version,
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a graph as header + payload.
pub fn graph_to_bytes(graph: &FactGraph) -> Result<Vec<u8>, FactError> {
    let payload = postcard::to_stdvec(&SerializableGraph::from(graph))
        .map_err(|e| FactError::Serialization(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SnapshotHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a graph written by [`graph_to_bytes`].
///
/// Indices are rebuilt from the decoded nodes and edges.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<FactGraph, FactError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(FactError::Serialization(format!(
            "snapshot of {} bytes exceeds the {} byte limit",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    SnapshotHeader::from_bytes(bytes)?.validate()?;

    let payload = bytes.get(HEADER_LEN..).unwrap_or_default();
    let serializable: SerializableGraph = postcard::from_bytes(payload)
        .map_err(|e| FactError::Serialization(format!("corrupt snapshot payload: {}", e)))?;
    Ok(FactGraph::from(serializable))
}
