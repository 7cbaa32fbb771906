use serde::{Deserialize, Serialize};

use crate::document::RESOURCE_COUNT;
use crate::framing::CompressionFraming;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerEntry {
    pub index: usize,
    pub name: String,
    /// Stored order: [Carbon, Food, Nova, Ore].
    pub resources: [f32; RESOURCE_COUNT],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub framing: CompressionFraming,
    pub compressed_len: usize,
    pub decompressed_len: usize,
    pub player_count: usize,
    /// Marker matches rejected during the scan; nonzero is worth a warning
    /// but never fatal on its own.
    pub skipped_markers: usize,
}
