//! Chunk manager — observer-driven load/unload sweep.
//!
//! Owns the loaded-chunk map and the saved-record store; both are mutated
//! only from the main thread. Every tick it recomputes the observer's chunk
//! coordinate; on a change it unloads chunks that left the window and
//! constructs the missing ones, replaying saved records where they exist.
//! The window test is per-axis (Chebyshev-like), so the loaded region is a
//! square, which keeps the sweep a pair of nested loops.

use glam::Vec3;
use std::collections::HashMap;
use std::path::Path;

use crate::core::config::WorldConfig;
use crate::core::error::Result;
use crate::persist::store::SaveStore;
use crate::population::classifier::SurfaceClassifier;
use crate::terrain::heightfield::Heightfield;
use crate::terrain::material::SurfaceBlend;
use crate::world::chunk::{Chunk, ChunkState};
use crate::world::coord::ChunkCoord;
use crate::world::placement::{ObjectArena, ObjectHandle, ObjectPlacer};

pub const MIN_RENDER_DISTANCE: i32 = 2;
pub const MAX_RENDER_DISTANCE: i32 = 32;

/// Clamp a render distance to the admissible range and round it up to an
/// even number so the window stays symmetric.
pub fn normalize_render_distance(rd: i32) -> i32 {
    let rd = rd.clamp(MIN_RENDER_DISTANCE, MAX_RENDER_DISTANCE);
    if rd % 2 == 0 {
        rd
    } else {
        rd + 1
    }
}

/// Is `coord` inside the square window around `center`?
///
/// Per-axis bounds on X and Z; the vertical layer follows the observer's
/// chunk Y.
fn in_window(coord: ChunkCoord, center: ChunkCoord, rd: i32) -> bool {
    let dx = coord.x - center.x;
    let dz = coord.z - center.z;
    coord.y == center.y && dx >= -rd && dx < rd && dz >= -rd && dz < rd
}

/// Streams chunks around a moving observer.
pub struct ChunkManager {
    config: WorldConfig,
    render_distance: i32,
    heightfield: Heightfield,
    blend: SurfaceBlend,
    arena: ObjectArena,
    loaded: HashMap<ChunkCoord, Chunk>,
    store: SaveStore,
    last_observer: Option<ChunkCoord>,
}

impl ChunkManager {
    pub fn new(config: WorldConfig) -> Self {
        Self::with_store(config, SaveStore::new())
    }

    /// Create a manager over an existing saved-record store.
    pub fn with_store(config: WorldConfig, store: SaveStore) -> Self {
        let render_distance = normalize_render_distance(config.render_distance);
        let heightfield = Heightfield::new(config.terrain.clone());
        let blend = SurfaceBlend::new(config.surface.clone(), config.terrain.sea_level);
        Self {
            render_distance,
            heightfield,
            blend,
            arena: ObjectArena::new(),
            loaded: HashMap::new(),
            store,
            last_observer: None,
            config,
        }
    }

    /// Create a manager from a world save file. The persisted seed
    /// overrides the configured one.
    pub fn load_from_path(mut config: WorldConfig, path: &Path) -> Result<Self> {
        let (seed, store) = SaveStore::load_from_path(path)?;
        config.seed = seed;
        config.terrain.seed = seed as u32;
        Ok(Self::with_store(config, store))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    /// Chunk coordinate containing a world position.
    pub fn to_chunk_coord(&self, pos: Vec3) -> ChunkCoord {
        ChunkCoord::from_world(pos, self.config.chunk_edge)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn loaded_coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.loaded.keys()
    }

    pub fn chunk(&self, coord: &ChunkCoord) -> Option<&Chunk> {
        self.loaded.get(coord)
    }

    pub fn store(&self) -> &SaveStore {
        &self.store
    }

    pub fn arena(&self) -> &ObjectArena {
        &self.arena
    }

    /// All loaded chunks have finished generating.
    pub fn is_idle(&self) -> bool {
        self.loaded
            .values()
            .all(|c| c.state() == ChunkState::Loaded)
    }

    /// Per-tick drive. Sweeps the window if the observer changed chunks,
    /// then polls every loaded chunk once.
    pub fn update(&mut self, observer: Vec3) {
        let center = self.to_chunk_coord(observer);
        if self.last_observer != Some(center) {
            self.sweep(center);
            self.last_observer = Some(center);
        }

        let classifier = SurfaceClassifier::new(
            &self.heightfield,
            &self.blend,
            self.config.probe_altitude,
            self.config.full_influence,
        );
        for chunk in self.loaded.values_mut() {
            chunk.update(&classifier, &mut self.arena);
        }
    }

    /// Tick until every chunk is loaded. For headless tools and tests; the
    /// interactive loop calls `update` once per frame instead.
    pub fn settle(&mut self, observer: Vec3) {
        const MAX_TICKS: u32 = 10_000;
        for _ in 0..MAX_TICKS {
            self.update(observer);
            if self.is_idle() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        log::warn!("settle: chunks still generating after {} ticks", MAX_TICKS);
    }

    /// Unload everything outside the window, then construct whatever is
    /// missing inside it. Faults stay contained per chunk; the sweep always
    /// visits every coordinate.
    fn sweep(&mut self, center: ChunkCoord) {
        let rd = self.render_distance;

        let stale: Vec<ChunkCoord> = self
            .loaded
            .keys()
            .copied()
            .filter(|c| !in_window(*c, center, rd))
            .collect();
        for coord in stale {
            if let Some(chunk) = self.loaded.remove(&coord) {
                self.unload(chunk);
            }
        }

        for dx in -rd..rd {
            for dz in -rd..rd {
                let coord = ChunkCoord::new(center.x + dx, center.y, center.z + dz);
                if self.loaded.contains_key(&coord) {
                    continue;
                }
                let mut chunk = Chunk::new(
                    coord,
                    self.config.chunk_edge,
                    self.config.seed,
                    self.config.population.clone(),
                );
                if let Some(record) = self.store.get(&coord) {
                    chunk.replay(record, &mut self.arena);
                } else {
                    chunk.begin_generation();
                }
                self.loaded.insert(coord, chunk);
            }
        }

        log::debug!(
            "sweep around {}: {} chunks loaded",
            center,
            self.loaded.len()
        );
    }

    /// Serialize a dirty chunk into the store, then release its resources.
    fn unload(&mut self, mut chunk: Chunk) {
        if chunk.is_dirty() {
            let record = chunk.to_record(&self.arena);
            self.store.insert(record);
            chunk.clear_dirty();
        }
        chunk.release(&mut self.arena);
        log::trace!("unloaded chunk {}", chunk.coord());
    }

    /// Place an extra (non-procedural) object into a loaded chunk, marking
    /// it dirty. Returns `None` if the chunk is not loaded or the id is
    /// unknown to the placement system.
    pub fn place_extra(
        &mut self,
        coord: ChunkCoord,
        object_id: &str,
        position: Vec3,
    ) -> Option<ObjectHandle> {
        let chunk = self.loaded.get_mut(&coord)?;
        let handle = self.arena.place_new(object_id, position)?;
        chunk.add_object(handle);
        Some(handle)
    }

    /// Serialize every dirty loaded chunk into the store without unloading.
    pub fn save_dirty(&mut self) {
        let mut saved = 0usize;
        for chunk in self.loaded.values_mut() {
            if chunk.is_dirty() {
                self.store.insert(chunk.to_record(&self.arena));
                chunk.clear_dirty();
                saved += 1;
            }
        }
        if saved > 0 {
            log::info!("serialized {} dirty chunks", saved);
        }
    }

    /// Flush dirty chunks and write the store to disk.
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        self.save_dirty();
        self.store.save_to_path(path, self.config.seed)
    }

    /// Unload every chunk (serializing dirty ones), as on world shutdown.
    pub fn unload_all(&mut self) {
        let coords: Vec<ChunkCoord> = self.loaded.keys().copied().collect();
        for coord in coords {
            if let Some(chunk) = self.loaded.remove(&coord) {
                self.unload(chunk);
            }
        }
        self.last_observer = None;
    }
}
