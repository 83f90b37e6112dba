//! The chunk: one streamed cube of world space.
//!
//! Lifecycle per load: Empty → Generating (candidate jobs dispatched) →
//! Populating (per-category placement passes, in fixed order) → Loaded.
//! The replay path bypasses generation entirely: a chunk fed a save record
//! re-places its objects and jumps straight to Loaded.
//!
//! The population map is the cross-category claim table. A cell is claimed
//! (inserted, possibly with `None`) before its placement resolves, so no
//! later category can take the same cell. A claim whose placement failed
//! stays as `None` for the life of the chunk's data: the cell's outcome is
//! fixed and will not be retried, which keeps regeneration deterministic.

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::persist::record::ChunkRecord;
use crate::population::candidates::{CandidateJob, CellIndex};
use crate::population::classifier::SurfaceClassifier;
use crate::population::density;
use crate::population::params::{Category, PopulationParams};
use crate::world::coord::ChunkCoord;
use crate::world::placement::{ObjectHandle, ObjectPlacer};

/// Chunk lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Empty,
    Generating,
    Populating,
    Loaded,
}

/// Derive a chunk's seed from the world seed and its coordinate.
///
/// Deterministic per coordinate; no other entropy enters generation.
pub fn chunk_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    let mut h = world_seed;
    h = h.wrapping_add((coord.x as u64).wrapping_mul(0x8DA6_B343_9B5A_F2C1));
    h = h.wrapping_add((coord.y as u64).wrapping_mul(0xD819_3A6D_8F1B_0E7B));
    h = h.wrapping_add((coord.z as u64).wrapping_mul(0xCB1A_B31F_6D47_99E9));
    density::mix64(h)
}

/// One loaded cube of world space.
pub struct Chunk {
    coord: ChunkCoord,
    edge: u32,
    origin: Vec3,
    seed: u64,
    params: PopulationParams,
    state: ChunkState,
    dirty: bool,
    /// Procedurally claimed cells. `None` = claimed, but placement failed.
    population: HashMap<CellIndex, Option<ObjectHandle>>,
    /// Objects placed by means other than procedural population
    /// (replayed from a record, or added externally).
    objects: Vec<ObjectHandle>,
    /// In-flight candidate jobs, polled once per tick.
    jobs: Vec<CandidateJob>,
    /// Completed candidate sets awaiting placement, by category index.
    completed: [Option<Vec<CellIndex>>; 3],
    /// Placement cursor into `Category::ALL`.
    next_category: usize,
}

impl Chunk {
    pub fn new(coord: ChunkCoord, edge: u32, world_seed: u64, params: PopulationParams) -> Self {
        Self {
            coord,
            edge,
            origin: coord.world_origin(edge),
            seed: chunk_seed(world_seed, coord),
            params,
            state: ChunkState::Empty,
            dirty: false,
            population: HashMap::new(),
            objects: Vec::new(),
            jobs: Vec::new(),
            completed: [None, None, None],
            next_category: 0,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Procedurally claimed cells (including failed-placement claims).
    pub fn population(&self) -> &HashMap<CellIndex, Option<ObjectHandle>> {
        &self.population
    }

    /// Handles placed outside procedural population.
    pub fn objects(&self) -> &[ObjectHandle] {
        &self.objects
    }

    /// Number of live placed objects this chunk tracks.
    pub fn placed_count(&self) -> usize {
        self.population.values().filter(|v| v.is_some()).count() + self.objects.len()
    }

    /// Dispatch candidate generation for every enabled category.
    ///
    /// Categories that are disabled (or clamped to zero density) complete
    /// immediately with an empty candidate set so the placement cursor can
    /// pass over them.
    pub fn begin_generation(&mut self) {
        debug_assert_eq!(self.state, ChunkState::Empty);
        for category in Category::ALL {
            let params = self.params.get(category);
            if params.enabled && params.clamped_density(category) > 0.0 {
                self.jobs.push(CandidateJob::spawn(
                    category,
                    self.edge,
                    self.origin.x as i64,
                    self.origin.z as i64,
                    self.seed,
                    params,
                ));
            } else {
                self.completed[category.index()] = Some(Vec::new());
            }
        }
        self.state = ChunkState::Generating;
        log::trace!("chunk {}: generation dispatched", self.coord);
    }

    /// Per-tick drive: poll candidate jobs and run any placement passes
    /// that have become due.
    ///
    /// The parallel phase only ever writes into its own output list; every
    /// mutation here happens on the calling (main) thread. Placement passes
    /// run strictly in `Category::ALL` order even when jobs complete out of
    /// order, so cross-category suppression is reproducible.
    pub fn update(&mut self, classifier: &SurfaceClassifier, placer: &mut dyn ObjectPlacer) {
        if matches!(self.state, ChunkState::Empty | ChunkState::Loaded) {
            return;
        }

        let Self {
            jobs, completed, ..
        } = self;
        jobs.retain_mut(|job| match job.poll() {
            Some(cells) => {
                completed[job.category().index()] = Some(cells);
                false
            }
            None => true,
        });

        while self.next_category < Category::ALL.len() {
            let idx = self.next_category;
            let Some(cells) = self.completed[idx].take() else {
                break;
            };
            self.state = ChunkState::Populating;
            self.place_category(Category::ALL[idx], &cells, classifier, placer);
            self.next_category += 1;
        }

        if self.next_category == Category::ALL.len() {
            self.state = ChunkState::Loaded;
            log::debug!(
                "chunk {} loaded, {} objects placed",
                self.coord,
                self.placed_count()
            );
        }
    }

    /// Sequential classification + placement pass for one category.
    fn place_category(
        &mut self,
        category: Category,
        cells: &[CellIndex],
        classifier: &SurfaceClassifier,
        placer: &mut dyn ObjectPlacer,
    ) {
        let params = self.params.get(category).clone();
        let mut placed = 0usize;

        for &(lx, lz) in cells {
            if self.population.contains_key(&(lx, lz)) {
                // Claimed by an earlier category; never re-evaluated
                continue;
            }
            let wx = self.origin.x + lx as f32 + 0.5;
            let wz = self.origin.z + lz as f32 + 0.5;
            let Some(hit) = classifier.classify(wx, wz, &params.allowed) else {
                continue;
            };

            // Claim the cell before placement resolves
            self.population.insert((lx, lz), None);

            let position = Vec3::new(wx, hit.height, wz);
            match placer.place_new(&params.object_id, position) {
                Some(handle) => {
                    placer.set_rotation(handle, Quat::from_rotation_y(self.cell_yaw(lx, lz)));
                    self.population.insert((lx, lz), Some(handle));
                    placed += 1;
                }
                None => {
                    // Failed placement: the None claim stays, permanently
                    // suppressing this cell
                    log::debug!(
                        "chunk {}: placement of {:?} at ({}, {}) failed",
                        self.coord,
                        params.object_id,
                        lx,
                        lz
                    );
                }
            }
        }

        log::trace!(
            "chunk {}: {} pass placed {}/{} candidates",
            self.coord,
            category.label(),
            placed,
            cells.len()
        );
    }

    /// Deterministic yaw for a procedurally placed object.
    fn cell_yaw(&self, lx: u32, lz: u32) -> f32 {
        let h = density::mix64(self.seed ^ (((lx as u64) << 32) | lz as u64));
        let unit = (h >> 11) as f64 / (1u64 << 53) as f64;
        (unit * std::f64::consts::TAU) as f32
    }

    /// Restore this chunk's object set from a save record instead of
    /// generating. Each entry is re-placed by id/transform, then its extras
    /// are read back through the record contract.
    pub fn replay(&mut self, record: &ChunkRecord, placer: &mut dyn ObjectPlacer) {
        debug_assert_eq!(self.state, ChunkState::Empty);
        let mut restored = 0usize;
        for object in &record.objects {
            match placer.place_new(&object.id, object.transform.position()) {
                Some(handle) => {
                    placer.read_record(handle, object);
                    self.objects.push(handle);
                    restored += 1;
                }
                None => {
                    log::warn!(
                        "chunk {}: replay could not place {:?}",
                        self.coord,
                        object.id
                    );
                }
            }
        }
        self.state = ChunkState::Loaded;
        log::debug!(
            "chunk {} replayed, {}/{} objects restored",
            self.coord,
            restored,
            record.objects.len()
        );
    }

    /// Serialize the live object set into a save record.
    ///
    /// Output order is deterministic: procedural placements sorted by cell,
    /// then external objects in insertion order.
    pub fn to_record(&self, placer: &dyn ObjectPlacer) -> ChunkRecord {
        let mut record = ChunkRecord::new(self.coord);

        let mut cells: Vec<(CellIndex, ObjectHandle)> = self
            .population
            .iter()
            .filter_map(|(cell, handle)| handle.map(|h| (*cell, h)))
            .collect();
        cells.sort_unstable_by_key(|(cell, _)| *cell);

        for (_, handle) in cells {
            if let Some(object) = placer.write_record(handle) {
                record.objects.push(object);
            }
        }
        for &handle in &self.objects {
            if let Some(object) = placer.write_record(handle) {
                record.objects.push(object);
            }
        }
        record
    }

    /// Track an externally placed object and mark the chunk dirty.
    pub fn add_object(&mut self, handle: ObjectHandle) {
        self.objects.push(handle);
        self.dirty = true;
    }

    /// Release every owned placed object. In-flight candidate jobs are
    /// simply dropped; their workers finish into a closed channel.
    pub fn release(&mut self, placer: &mut dyn ObjectPlacer) {
        for handle in self.population.values().flatten() {
            placer.despawn(*handle);
        }
        for handle in &self.objects {
            placer.despawn(*handle);
        }
        self.population.clear();
        self.objects.clear();
        self.jobs.clear();
        self.completed = [None, None, None];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::heightfield::{Heightfield, TerrainParams};
    use crate::terrain::material::{SurfaceBlend, SurfaceBlendParams};
    use crate::world::placement::ObjectArena;

    /// Flat-ish pure grass terrain so classification accepts everything.
    fn grass_world() -> (Heightfield, SurfaceBlend) {
        let field = Heightfield::new(TerrainParams {
            scale: 10_000.0,
            height_scale: 40.0,
            sea_level: -100.0,
            ..Default::default()
        });
        let blend = SurfaceBlend::new(SurfaceBlendParams::default(), -100.0);
        (field, blend)
    }

    fn drive_to_loaded(chunk: &mut Chunk, classifier: &SurfaceClassifier, arena: &mut ObjectArena) {
        for _ in 0..2000 {
            chunk.update(classifier, arena);
            if chunk.state() == ChunkState::Loaded {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        panic!("chunk never reached Loaded");
    }

    fn dense_params() -> PopulationParams {
        let mut params = PopulationParams::default();
        params.trees.density = 0.3;
        params.trees.allowed = vec![crate::terrain::material::SurfaceMaterial::Grass];
        params.pickups.density = 0.3;
        params.pickups.allowed = vec![crate::terrain::material::SurfaceMaterial::Grass];
        params.deposits.enabled = false;
        params
    }

    #[test]
    fn test_generation_reaches_loaded() {
        let (field, blend) = grass_world();
        let classifier = SurfaceClassifier::new(&field, &blend, 512.0, 1.0);
        let mut arena = ObjectArena::new();

        let mut chunk = Chunk::new(
            ChunkCoord::new(1, 0, 0),
            16,
            42,
            PopulationParams::default(),
        );
        assert_eq!(chunk.state(), ChunkState::Empty);
        chunk.begin_generation();
        drive_to_loaded(&mut chunk, &classifier, &mut arena);

        assert!(!chunk.is_dirty(), "procedural generation must not dirty");
        assert_eq!(
            chunk.placed_count(),
            arena.live_count(),
            "chunk bookkeeping must match arena"
        );
    }

    #[test]
    fn test_generation_deterministic_across_runs() {
        let (field, blend) = grass_world();
        let classifier = SurfaceClassifier::new(&field, &blend, 512.0, 1.0);

        let mut claimed_sets = Vec::new();
        for _ in 0..2 {
            let mut arena = ObjectArena::new();
            let mut chunk = Chunk::new(ChunkCoord::new(3, 0, -2), 16, 42, dense_params());
            chunk.begin_generation();
            drive_to_loaded(&mut chunk, &classifier, &mut arena);

            let mut cells: Vec<_> = chunk.population().keys().copied().collect();
            cells.sort_unstable();
            claimed_sets.push(cells);
        }
        assert_eq!(claimed_sets[0], claimed_sets[1]);
        assert!(!claimed_sets[0].is_empty());
    }

    #[test]
    fn test_cross_category_suppression_is_order_deterministic() {
        let (field, blend) = grass_world();
        let classifier = SurfaceClassifier::new(&field, &blend, 512.0, 1.0);

        let count_by_id = |arena: &ObjectArena, id: &str, total: usize| -> usize {
            (0..total as u32)
                .filter_map(|h| arena.get(h))
                .filter(|o| o.object_id == id)
                .count()
        };

        // Pickups alone
        let mut solo_params = dense_params();
        solo_params.trees.enabled = false;
        let mut arena = ObjectArena::new();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), 16, 42, solo_params);
        chunk.begin_generation();
        drive_to_loaded(&mut chunk, &classifier, &mut arena);
        let solo_pickups = count_by_id(&arena, "flint_pickup", 1024);

        // Trees alone
        let mut solo_params = dense_params();
        solo_params.pickups.enabled = false;
        let mut arena = ObjectArena::new();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), 16, 42, solo_params);
        chunk.begin_generation();
        drive_to_loaded(&mut chunk, &classifier, &mut arena);
        let solo_trees = count_by_id(&arena, "oak_tree", 1024);

        // Both: trees keep their full set (they place first), pickups lose
        // every cell the tree pass already claimed.
        let mut arena = ObjectArena::new();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), 16, 42, dense_params());
        chunk.begin_generation();
        drive_to_loaded(&mut chunk, &classifier, &mut arena);
        let both_trees = count_by_id(&arena, "oak_tree", 1024);
        let both_pickups = count_by_id(&arena, "flint_pickup", 1024);

        assert_eq!(both_trees, solo_trees);
        assert!(both_pickups <= solo_pickups);
        // At ~30% density each, overlap is statistically certain on 256 cells
        assert!(both_pickups < solo_pickups, "expected overlapping cells");
        assert_eq!(chunk.placed_count(), both_trees + both_pickups);
    }

    #[test]
    fn test_failed_placement_suppresses_cell_permanently() {
        let (field, blend) = grass_world();
        let classifier = SurfaceClassifier::new(&field, &blend, 512.0, 1.0);

        // Arena that does not know "oak_tree": every tree placement fails
        let mut arena = ObjectArena::with_catalog(["flint_pickup", "iron_deposit"]);
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), 16, 42, dense_params());
        chunk.begin_generation();
        drive_to_loaded(&mut chunk, &classifier, &mut arena);

        let failed_claims = chunk
            .population()
            .values()
            .filter(|v| v.is_none())
            .count();
        assert!(failed_claims > 0, "tree claims should remain as None");

        // The failed claims still suppress pickups: pickup count matches the
        // run where trees placed successfully, not the trees-disabled run.
        let mut full_arena = ObjectArena::new();
        let mut full_chunk = Chunk::new(ChunkCoord::new(0, 0, 0), 16, 42, dense_params());
        full_chunk.begin_generation();
        drive_to_loaded(&mut full_chunk, &classifier, &mut full_arena);

        let mut claims: Vec<_> = chunk.population().keys().copied().collect();
        let mut full_claims: Vec<_> = full_chunk.population().keys().copied().collect();
        claims.sort_unstable();
        full_claims.sort_unstable();
        assert_eq!(claims, full_claims, "claim table must not depend on placement success");
    }

    #[test]
    fn test_record_roundtrip() {
        let (field, blend) = grass_world();
        let classifier = SurfaceClassifier::new(&field, &blend, 512.0, 1.0);
        let mut arena = ObjectArena::new();

        let mut chunk = Chunk::new(ChunkCoord::new(2, 0, 2), 16, 42, dense_params());
        chunk.begin_generation();
        drive_to_loaded(&mut chunk, &classifier, &mut arena);
        assert!(chunk.placed_count() > 0);

        let record = chunk.to_record(&arena);
        assert_eq!(record.coord(), ChunkCoord::new(2, 0, 2));
        assert_eq!(record.objects.len(), chunk.placed_count());

        // Replay into a fresh chunk and arena
        let mut fresh_arena = ObjectArena::new();
        let mut fresh = Chunk::new(ChunkCoord::new(2, 0, 2), 16, 42, dense_params());
        fresh.replay(&record, &mut fresh_arena);
        assert_eq!(fresh.state(), ChunkState::Loaded);
        assert_eq!(fresh.placed_count(), chunk.placed_count());

        // Round-trip equality under (id, rounded position, extras)
        let key = |r: &crate::persist::record::ObjectRecord| {
            (
                r.id.clone(),
                (r.transform.px * 1000.0).round() as i64,
                (r.transform.py * 1000.0).round() as i64,
                (r.transform.pz * 1000.0).round() as i64,
                serde_json::to_string(&r.extra).unwrap(),
            )
        };
        let mut original: Vec<_> = record.objects.iter().map(key).collect();
        let mut replayed: Vec<_> = fresh.to_record(&fresh_arena).objects.iter().map(key).collect();
        original.sort();
        replayed.sort();
        assert_eq!(original, replayed);
    }

    #[test]
    fn test_add_object_marks_dirty() {
        let mut arena = ObjectArena::new();
        let mut chunk = Chunk::new(
            ChunkCoord::new(0, 0, 0),
            16,
            42,
            PopulationParams::default(),
        );
        assert!(!chunk.is_dirty());

        let handle = arena.place_new("oak_tree", Vec3::ZERO).unwrap();
        chunk.add_object(handle);
        assert!(chunk.is_dirty());
        assert_eq!(chunk.objects(), &[handle]);
    }

    #[test]
    fn test_release_despawns_everything() {
        let (field, blend) = grass_world();
        let classifier = SurfaceClassifier::new(&field, &blend, 512.0, 1.0);
        let mut arena = ObjectArena::new();

        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), 16, 42, dense_params());
        chunk.begin_generation();
        drive_to_loaded(&mut chunk, &classifier, &mut arena);
        assert!(arena.live_count() > 0);

        chunk.release(&mut arena);
        assert_eq!(arena.live_count(), 0);
        assert_eq!(chunk.placed_count(), 0);
    }

    #[test]
    fn test_chunk_seed_varies_per_coordinate() {
        let a = chunk_seed(42, ChunkCoord::new(0, 0, 0));
        let b = chunk_seed(42, ChunkCoord::new(1, 0, 0));
        let c = chunk_seed(42, ChunkCoord::new(0, 0, 1));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
        // Stable across calls
        assert_eq!(a, chunk_seed(42, ChunkCoord::new(0, 0, 0)));
    }
}
