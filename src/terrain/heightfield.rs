//! Noise-based procedural terrain heightfield

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

/// Parameters controlling the terrain-height noise
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub height_scale: f32, // Vertical scale (max height)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
    pub sea_level: f32,    // Height below which is "water"
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 100.0,
            height_scale: 64.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            sea_level: 12.0,
        }
    }
}

/// Procedural terrain heightfield using fractal Brownian motion (FBM).
///
/// This is the terrain the surface classifier probes against. Note that the
/// population density sampler is cell-hash based and does not go through
/// this noise at all.
pub struct Heightfield {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

impl Heightfield {
    /// Create a new heightfield with the given parameters
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Get terrain height at world position (x, z)
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let nx = (x / self.params.scale) as f64;
        let nz = (z / self.params.scale) as f64;

        // Noise value is in [-1, 1]; map to [0, height_scale]
        let noise_value = self.noise.get([nx, nz]);
        let normalized = (noise_value + 1.0) / 2.0;
        (normalized * self.params.height_scale as f64) as f32
    }

    /// Estimate terrain slope at (x, z) using finite differences.
    ///
    /// Returns the angle from horizontal in radians.
    pub fn slope_at(&self, x: f32, z: f32) -> f32 {
        let eps = 0.5;
        let h = self.height_at(x, z);
        let hx = self.height_at(x + eps, z);
        let hz = self.height_at(x, z + eps);

        let dx = (hx - h) / eps;
        let dz = (hz - h) / eps;

        (dx * dx + dz * dz).sqrt().atan()
    }
}
