//! Saved-record index and world save file I/O.
//!
//! The store is the in-memory index of persisted chunk records, keyed by
//! chunk coordinate. It is owned by the chunk manager and mutated only from
//! the main thread. On disk the whole store is one JSON document,
//! LZ4-compressed. World-level faults (unreadable file, bad compression,
//! bad outer JSON) propagate to the caller; a single corrupt chunk entry is
//! logged and skipped, which downstream reads as "no saved data for this
//! chunk" and falls back to regeneration.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::persist::record::ChunkRecord;
use crate::world::coord::ChunkCoord;

/// On-disk world save layout.
#[derive(Serialize, Deserialize)]
struct WorldSave {
    seed: u64,
    /// Records kept as raw JSON values so one corrupt entry does not poison
    /// the whole load.
    chunks: Vec<serde_json::Value>,
}

/// In-memory index of saved chunk records.
#[derive(Default)]
pub struct SaveStore {
    records: HashMap<ChunkCoord, ChunkRecord>,
}

impl SaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for a coordinate.
    pub fn insert(&mut self, record: ChunkRecord) {
        self.records.insert(record.coord(), record);
    }

    pub fn get(&self, coord: &ChunkCoord) -> Option<&ChunkRecord> {
        self.records.get(coord)
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.records.contains_key(coord)
    }

    pub fn remove(&mut self, coord: &ChunkCoord) -> Option<ChunkRecord> {
        self.records.remove(coord)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.records.keys()
    }

    /// Write the store to disk as LZ4-compressed JSON.
    ///
    /// Failures here must reach the user-facing save flow, so everything
    /// propagates.
    pub fn save_to_path(&self, path: &Path, seed: u64) -> Result<()> {
        // Stable on-disk order keeps save files diffable
        let mut coords: Vec<_> = self.records.keys().copied().collect();
        coords.sort_by_key(|c| (c.x, c.y, c.z));

        let chunks = coords
            .iter()
            .map(|c| {
                serde_json::to_value(&self.records[c])
                    .map_err(|e| Error::Persistence(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let save = WorldSave { seed, chunks };
        let json = serde_json::to_vec(&save).map_err(|e| Error::Persistence(e.to_string()))?;
        let compressed = lz4_flex::compress_prepend_size(&json);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, compressed)?;

        log::info!(
            "saved {} chunk records to {}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a store from disk. Returns the persisted world seed alongside.
    ///
    /// Corrupt individual entries are logged and skipped; a corrupt file is
    /// an error.
    pub fn load_from_path(path: &Path) -> Result<(u64, Self)> {
        let compressed = std::fs::read(path)?;
        let json = lz4_flex::decompress_size_prepended(&compressed)
            .map_err(|e| Error::WorldLoad(format!("LZ4 decompression failed: {}", e)))?;
        let save: WorldSave = serde_json::from_slice(&json)
            .map_err(|e| Error::WorldLoad(format!("bad save file: {}", e)))?;

        let mut store = Self::new();
        let total = save.chunks.len();
        for value in save.chunks {
            match serde_json::from_value::<ChunkRecord>(value) {
                Ok(record) => store.insert(record),
                Err(e) => {
                    log::warn!("skipping corrupt chunk record: {}", e);
                }
            }
        }
        log::info!(
            "loaded {}/{} chunk records from {}",
            store.len(),
            total,
            path.display()
        );
        Ok((save.seed, store))
    }
}
