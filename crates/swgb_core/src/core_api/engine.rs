use std::fs;
use std::path::Path;

use crate::document::{RESOURCE_COUNT, RESOURCE_NAMES, SaveDocument};
use crate::error::{LoadError, SaveError, ValidationError};

use super::types::{PlayerEntry, Snapshot};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// One edit session over a single loaded save. Callers must serialize access;
/// there is no support for concurrent mutation of a session.
#[derive(Debug)]
pub struct Session {
    document: SaveDocument,
    snapshot: Snapshot,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_path<P: AsRef<Path>>(&self, path: P) -> Result<Session, LoadError> {
        let bytes = fs::read(path)?;
        self.open_bytes(bytes)
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, LoadError> {
        let bytes = bytes.as_ref();
        let document = SaveDocument::from_compressed(bytes)?;
        let snapshot = Snapshot {
            framing: document.framing(),
            compressed_len: bytes.len(),
            decompressed_len: document.decompressed_len(),
            player_count: document.players().len(),
            skipped_markers: document.skipped_markers(),
        };
        Ok(Session { document, snapshot })
    }
}

impl Session {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Players in file order with their current resource values.
    pub fn players(&self) -> Vec<PlayerEntry> {
        self.document
            .players()
            .iter()
            .map(|record| PlayerEntry {
                index: record.index,
                name: record.name.clone(),
                resources: self.document.read_resources(record),
            })
            .collect()
    }

    pub fn player(&self, index: usize) -> Option<PlayerEntry> {
        self.document.player(index).map(|record| PlayerEntry {
            index: record.index,
            name: record.name.clone(),
            resources: self.document.read_resources(record),
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.document.is_dirty()
    }

    /// Replaces all four resource values of one player. All-or-nothing: any
    /// rejected value leaves the save untouched.
    pub fn set_resources(
        &mut self,
        index: usize,
        values: [f32; RESOURCE_COUNT],
    ) -> Result<(), ValidationError> {
        self.document.write_resources(index, values)
    }

    /// Replaces a single resource slot, keeping the other three as read.
    pub fn set_resource(
        &mut self,
        index: usize,
        slot: usize,
        value: f32,
    ) -> Result<(), ValidationError> {
        debug_assert!(slot < RESOURCE_NAMES.len());
        let record = self
            .document
            .player(index)
            .ok_or(ValidationError::UnknownPlayer {
                index,
                count: self.snapshot.player_count,
            })?;
        let mut values = self.document.read_resources(record);
        values[slot] = value;
        self.document.write_resources(index, values)
    }

    /// Final file bytes, recompressed with the framing the save was loaded
    /// with. Callable repeatedly; the session stays usable afterward.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        self.document.serialize()
    }

    /// Writes the recompressed save to `path`. Backing up whatever was there
    /// before is the caller's responsibility.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
