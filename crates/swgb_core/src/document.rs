//! Player-record location and in-place editing inside the decompressed buffer.
//!
//! A skirmish save has no parseable outer structure we care about; each
//! player is found by a fixed 6-byte marker followed immediately by four
//! little-endian f32 resource values. Records hold plain offsets into the
//! document's owned buffer, so numeric edits are true in-place overwrites
//! that never move other records.

use crate::error::{LoadError, SaveError, ValidationError};
use crate::framing::{self, CompressionFraming};

/// Structural marker preceding each player's resource block.
pub const PLAYER_MARKER: [u8; 6] = [0x16, 0xDB, 0x00, 0x00, 0x00, 0x21];

/// Display labels in stored-slot order. The first stored slot is historically
/// "wood" but the game shows it as Carbon; storage order is never reordered.
pub const RESOURCE_NAMES: [&str; 4] = ["Carbon", "Food", "Nova", "Ore"];

pub const RESOURCE_COUNT: usize = 4;
pub const RESOURCE_MAX: f32 = 1_000_000.0;

const F32_WIDTH: usize = 4;
const RESOURCE_BLOCK_LEN: usize = RESOURCE_COUNT * F32_WIDTH;

/// How far before a marker the name backscan is allowed to look.
const NAME_SEARCH_WINDOW: usize = 512;
const NAME_MIN_LEN: usize = 3;
const NAME_MAX_LEN: usize = 32;

/// One player's location inside the decompressed buffer. Offsets are only
/// meaningful against the buffer they were scanned from; they stay valid
/// across resource writes because those never change the buffer length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub index: usize,
    pub name: String,
    marker_offset: usize,
}

impl PlayerRecord {
    pub fn marker_offset(&self) -> usize {
        self.marker_offset
    }

    /// First resource float sits 6 bytes past the marker start.
    fn resource_offset(&self) -> usize {
        self.marker_offset + PLAYER_MARKER.len()
    }
}

/// Owns the decompressed save content plus the framing it arrived in.
///
/// All mutation goes through [`SaveDocument::write_resources`]; the buffer is
/// never handed out mutably, so record offsets cannot be invalidated from
/// outside.
#[derive(Debug)]
pub struct SaveDocument {
    data: Vec<u8>,
    framing: CompressionFraming,
    players: Vec<PlayerRecord>,
    skipped_markers: usize,
    dirty: bool,
}

impl SaveDocument {
    /// Decompresses `raw`, scans for player records, and fails if either step
    /// finds nothing usable.
    pub fn from_compressed(raw: &[u8]) -> Result<Self, LoadError> {
        let (data, framing) = framing::detect_and_decompress(raw)?;
        let scan = scan_players(&data);
        if scan.players.is_empty() {
            return Err(LoadError::NoPlayersFound {
                decompressed_len: data.len(),
            });
        }

        Ok(Self {
            data,
            framing,
            players: scan.players,
            skipped_markers: scan.skipped,
            dirty: false,
        })
    }

    pub fn framing(&self) -> CompressionFraming {
        self.framing
    }

    /// Records in buffer order (file order).
    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn player(&self, index: usize) -> Option<&PlayerRecord> {
        self.players.get(index)
    }

    /// Marker matches the scan rejected (truncated, overlapping, or with
    /// implausible float content). Exposed so callers can warn about them.
    pub fn skipped_markers(&self) -> usize {
        self.skipped_markers
    }

    pub fn decompressed_len(&self) -> usize {
        self.data.len()
    }

    /// True once any resource write has landed since load.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reads the four resource values for a record scanned from this
    /// document, in stored order [Carbon, Food, Nova, Ore].
    pub fn read_resources(&self, record: &PlayerRecord) -> [f32; RESOURCE_COUNT] {
        read_floats(&self.data, record.resource_offset())
    }

    /// Overwrites one player's 16 resource bytes in place.
    ///
    /// All four values are validated before any byte is touched: a single
    /// out-of-range or non-finite value rejects the whole call and leaves the
    /// buffer byte-identical. The buffer length never changes, so every other
    /// record's offset stays valid.
    pub fn write_resources(
        &mut self,
        index: usize,
        values: [f32; RESOURCE_COUNT],
    ) -> Result<(), ValidationError> {
        let record = self
            .players
            .get(index)
            .ok_or(ValidationError::UnknownPlayer {
                index,
                count: self.players.len(),
            })?;

        for (slot, &value) in values.iter().enumerate() {
            if !value.is_finite() || !(0.0..=RESOURCE_MAX).contains(&value) {
                return Err(ValidationError::OutOfRangeValue {
                    resource: RESOURCE_NAMES[slot],
                    value,
                    max: RESOURCE_MAX,
                });
            }
        }

        let start = record.resource_offset();
        for (slot, value) in values.into_iter().enumerate() {
            let at = start + slot * F32_WIDTH;
            self.data[at..at + F32_WIDTH].copy_from_slice(&value.to_le_bytes());
        }
        self.dirty = true;
        Ok(())
    }

    /// Re-encodes the buffer with the framing recorded at load time.
    pub fn serialize(&self) -> Result<Vec<u8>, SaveError> {
        framing::recompress(&self.data, self.framing).map_err(SaveError::RecompressionFailed)
    }
}

struct ScanOutcome {
    players: Vec<PlayerRecord>,
    skipped: usize,
}

/// Finds every acceptable marker occurrence in buffer order.
///
/// A match is skipped (counted, not fatal) when fewer than 16 bytes of float
/// data remain, when it starts inside the previous accepted record's resource
/// block, or when its floats are not all finite within [0, RESOURCE_MAX].
fn scan_players(data: &[u8]) -> ScanOutcome {
    let mut players = Vec::new();
    let mut skipped = 0usize;
    let mut previous_end = 0usize;

    let mut pos = 0;
    while let Some(found) = find_marker(data, pos) {
        pos = found + 1;

        if found + PLAYER_MARKER.len() + RESOURCE_BLOCK_LEN > data.len() {
            skipped += 1;
            continue;
        }
        if found < previous_end {
            skipped += 1;
            continue;
        }

        let resources = read_floats(data, found + PLAYER_MARKER.len());
        if resources
            .iter()
            .any(|v| !v.is_finite() || !(0.0..=RESOURCE_MAX).contains(v))
        {
            skipped += 1;
            continue;
        }

        let index = players.len();
        let name = name_before_marker(data, found)
            .unwrap_or_else(|| format!("Player {}", index + 1));
        players.push(PlayerRecord {
            index,
            name,
            marker_offset: found,
        });
        previous_end = found + PLAYER_MARKER.len() + RESOURCE_BLOCK_LEN;
    }

    ScanOutcome { players, skipped }
}

fn find_marker(data: &[u8], from: usize) -> Option<usize> {
    if from >= data.len() {
        return None;
    }
    data[from..]
        .windows(PLAYER_MARKER.len())
        .position(|window| window == PLAYER_MARKER)
        .map(|offset| from + offset)
}

fn read_floats(data: &[u8], start: usize) -> [f32; RESOURCE_COUNT] {
    let mut out = [0f32; RESOURCE_COUNT];
    for (slot, value) in out.iter_mut().enumerate() {
        let at = start + slot * F32_WIDTH;
        let bytes: [u8; F32_WIDTH] = data[at..at + F32_WIDTH]
            .try_into()
            .unwrap_or([0u8; F32_WIDTH]);
        *value = f32::from_le_bytes(bytes);
    }
    out
}

/// Heuristic backscan for a length-prefixed display name before `marker_offset`.
///
/// Walks backward through at most [`NAME_SEARCH_WINDOW`] bytes looking for a
/// 2-byte little-endian length in 3..=32 followed by that many bytes of
/// alphanumeric/space text. The candidate nearest the marker wins; `None`
/// means the caller should fall back to a placeholder name.
fn name_before_marker(data: &[u8], marker_offset: usize) -> Option<String> {
    let window_start = marker_offset.saturating_sub(NAME_SEARCH_WINDOW);
    let mut i = marker_offset.checked_sub(2)?;

    loop {
        let len = u16::from_le_bytes([data[i], data[i + 1]]) as usize;
        if (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) && i + 2 + len <= marker_offset {
            if let Some(name) = decode_name(&data[i + 2..i + 2 + len]) {
                return Some(name);
            }
        }

        if i == window_start {
            return None;
        }
        i -= 1;
    }
}

fn decode_name(bytes: &[u8]) -> Option<String> {
    // Single-byte-per-character encoding; names in practice are plain ASCII.
    if !bytes.is_ascii() {
        return None;
    }
    let text = std::str::from_utf8(bytes).ok()?;
    let trimmed = text.trim_end_matches(['\0', ' ']);
    if trimmed.len() < NAME_MIN_LEN {
        return None;
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ')
    {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_block(name: &str, gap: usize, resources: [f32; 4]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&vec![0u8; gap]);
        out.extend_from_slice(&PLAYER_MARKER);
        for value in resources {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    #[test]
    fn backscan_finds_length_prefixed_name() {
        let data = named_block("Chewbacca", 7, [1.0, 2.0, 3.0, 4.0]);
        let marker_offset = 2 + 9 + 7;
        assert_eq!(
            name_before_marker(&data, marker_offset),
            Some("Chewbacca".to_string())
        );
    }

    #[test]
    fn backscan_rejects_non_printable_candidates() {
        let mut data = vec![0u8; 32];
        data[10] = 0x05;
        data[11] = 0x00;
        data[12..17].copy_from_slice(&[0xFF, 0xFE, 0xFD, 0xFC, 0xFB]);
        assert_eq!(name_before_marker(&data, 20), None);
    }

    #[test]
    fn backscan_trims_trailing_nuls() {
        let mut data = Vec::new();
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend_from_slice(b"Lando\0\0\0");
        data.extend_from_slice(&[0u8; 4]);
        let marker_offset = data.len();
        assert_eq!(
            name_before_marker(&data, marker_offset),
            Some("Lando".to_string())
        );
    }

    #[test]
    fn scan_skips_truncated_marker_match() {
        let mut data = vec![0u8; 64];
        let at = data.len() - PLAYER_MARKER.len() - 4;
        data[at..at + PLAYER_MARKER.len()].copy_from_slice(&PLAYER_MARKER);
        let outcome = scan_players(&data);
        assert!(outcome.players.is_empty());
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn scan_skips_marker_with_implausible_floats() {
        let mut data = vec![0u8; 16];
        data.extend_from_slice(&PLAYER_MARKER);
        for value in [f32::NAN, 1.0, 2.0, 3.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        let outcome = scan_players(&data);
        assert!(outcome.players.is_empty());
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn scan_assigns_placeholder_when_no_name_found() {
        let mut data = vec![0u8; 16];
        data.extend_from_slice(&PLAYER_MARKER);
        for value in [10.0f32, 20.0, 30.0, 40.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        let outcome = scan_players(&data);
        assert_eq!(outcome.players.len(), 1);
        assert_eq!(outcome.players[0].name, "Player 1");
    }

    #[test]
    fn scan_is_deterministic() {
        let mut data = vec![0u8; 8];
        data.extend(named_block("Han Solo", 5, [5.0, 6.0, 7.0, 8.0]));
        data.extend(vec![0u8; 9]);
        data.extend(named_block("Leia Organa", 3, [1.0, 2.0, 3.0, 4.0]));
        data.extend(vec![0u8; 12]);

        let first = scan_players(&data);
        let second = scan_players(&data);
        assert_eq!(first.players, second.players);
        assert_eq!(first.players[0].name, "Han Solo");
        assert_eq!(first.players[1].name, "Leia Organa");
        assert!(first.players[0].marker_offset < first.players[1].marker_offset);
    }
}
