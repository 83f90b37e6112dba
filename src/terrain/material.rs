//! Layered surface material blend.
//!
//! Materials are blended by height band and slope, the way a layered terrain
//! texture splat works: every layer gets a weight at (x, z), the dominant
//! layer wins, and its normalized weight is the "influence" the surface
//! classifier checks. A pure patch (no neighbouring layer contributing) has
//! influence 1.0.

use serde::{Deserialize, Serialize};

use crate::terrain::heightfield::Heightfield;

/// Dominant surface material at a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceMaterial {
    Grass,
    Dirt,
    Sand,
    Rock,
    Snow,
}

/// Dominant material plus its local influence weight in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSample {
    pub material: SurfaceMaterial,
    pub influence: f32,
}

/// Parameters controlling the material layering
#[derive(Clone, Debug)]
pub struct SurfaceBlendParams {
    /// Height band above sea level that blends from sand to grass.
    pub sand_band: f32,
    /// Height at which snow starts to blend in.
    pub snow_line: f32,
    /// Half-width of the snow blend band.
    pub snow_band: f32,
    /// Slope (radians) at which rock starts to dominate.
    pub rock_slope: f32,
    /// Half-width of the rock blend band, in radians.
    pub rock_band: f32,
}

impl Default for SurfaceBlendParams {
    fn default() -> Self {
        Self {
            sand_band: 2.0,
            snow_line: 56.0,
            snow_band: 3.0,
            rock_slope: 0.9,
            rock_band: 0.15,
        }
    }
}

/// Layered material blend over a heightfield.
pub struct SurfaceBlend {
    params: SurfaceBlendParams,
    sea_level: f32,
}

fn smoothstep(lo: f32, hi: f32, x: f32) -> f32 {
    let t = ((x - lo) / (hi - lo)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

impl SurfaceBlend {
    pub fn new(params: SurfaceBlendParams, sea_level: f32) -> Self {
        Self { params, sea_level }
    }

    /// Sample the dominant material and its influence at world (x, z).
    ///
    /// Influence is the dominant layer's share of the total layer weight;
    /// 1.0 means no other layer contributes at all (an unblended patch).
    pub fn surface_at(&self, field: &Heightfield, x: f32, z: f32) -> MaterialSample {
        let p = &self.params;
        let h = field.height_at(x, z);
        let slope = field.slope_at(x, z);

        let w_sand = 1.0 - smoothstep(self.sea_level, self.sea_level + p.sand_band, h);
        let w_snow = smoothstep(p.snow_line - p.snow_band, p.snow_line + p.snow_band, h);
        let t_rock = smoothstep(p.rock_slope - p.rock_band, p.rock_slope + p.rock_band, slope);

        // Dirt lives on the seam between grass and rock; it peaks where the
        // rock transition is half way.
        let w_dirt = 4.0 * t_rock * (1.0 - t_rock);
        let w_rock = t_rock;
        let w_grass = (1.0 - w_sand) * (1.0 - w_snow) * (1.0 - t_rock);

        let weights = [
            (SurfaceMaterial::Grass, w_grass),
            (SurfaceMaterial::Dirt, w_dirt),
            (SurfaceMaterial::Sand, w_sand),
            (SurfaceMaterial::Rock, w_rock),
            (SurfaceMaterial::Snow, w_snow),
        ];

        let total: f32 = weights.iter().map(|(_, w)| w).sum();
        let (material, weight) = weights
            .iter()
            .copied()
            .fold((SurfaceMaterial::Grass, 0.0f32), |best, cur| {
                if cur.1 > best.1 { cur } else { best }
            });

        let influence = if total > 0.0 { weight / total } else { 1.0 };
        MaterialSample {
            material,
            influence,
        }
    }
}
