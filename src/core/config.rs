//! World streaming configuration.

use crate::population::params::PopulationParams;
use crate::terrain::heightfield::TerrainParams;
use crate::terrain::material::SurfaceBlendParams;

/// Configuration for a streamed world.
///
/// Everything that must be known before the first chunk loads: the world
/// seed, the spatial partitioning constants, terrain noise parameters and
/// the per-category population parameters.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// World seed; every chunk's per-category seeds derive from this.
    pub seed: u64,
    /// Edge length of a chunk cube, in world units (one cell per unit).
    pub chunk_edge: u32,
    /// Half-width, in chunks, of the square window kept loaded around the
    /// observer. Clamped and normalized to even by the chunk manager.
    pub render_distance: i32,
    /// Terrain-height noise parameters.
    pub terrain: TerrainParams,
    /// Surface material layering parameters.
    pub surface: SurfaceBlendParams,
    /// Per-category population parameters (trees, pickups, deposits).
    pub population: PopulationParams,
    /// Altitude the surface classifier probes down from.
    pub probe_altitude: f32,
    /// Minimum material influence for a candidate to be accepted.
    pub full_influence: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            chunk_edge: 16,
            render_distance: 4,
            terrain: TerrainParams::default(),
            surface: SurfaceBlendParams::default(),
            population: PopulationParams::default(),
            probe_altitude: 512.0,
            full_influence: 1.0,
        }
    }
}

impl WorldConfig {
    /// Create a config from a world seed, keeping every other parameter at
    /// its default. The terrain noise seed is derived from the world seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut config = Self {
            seed,
            ..Default::default()
        };
        config.terrain.seed = seed as u32;
        config
    }
}
