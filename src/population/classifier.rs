//! Surface classifier — decides whether a candidate cell is valid ground.
//!
//! A vertical probe is cast down from a fixed altitude onto the terrain;
//! the dominant material at the hit point must be allow-listed for the
//! category and effectively unblended (influence at or above the
//! full-influence threshold). This keeps scattered content off half-blended
//! terrain seams. Runs on the main thread, after the parallel candidate
//! phase, because it reads live world geometry.

use crate::terrain::heightfield::Heightfield;
use crate::terrain::material::{SurfaceBlend, SurfaceMaterial};

/// Result of a successful downward probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Terrain height at the probe column.
    pub height: f32,
    /// Dominant material at the hit point.
    pub material: SurfaceMaterial,
    /// The material's local influence weight in [0, 1].
    pub influence: f32,
}

/// Classifier over a heightfield and its material blend.
pub struct SurfaceClassifier<'a> {
    field: &'a Heightfield,
    blend: &'a SurfaceBlend,
    probe_altitude: f32,
    full_influence: f32,
}

impl<'a> SurfaceClassifier<'a> {
    pub fn new(
        field: &'a Heightfield,
        blend: &'a SurfaceBlend,
        probe_altitude: f32,
        full_influence: f32,
    ) -> Self {
        Self {
            field,
            blend,
            probe_altitude,
            full_influence,
        }
    }

    /// Probe down at world (x, z).
    ///
    /// Returns `None` if the terrain reaches above the probe altitude
    /// (nothing below the probe to hit).
    pub fn probe(&self, x: f32, z: f32) -> Option<SurfaceHit> {
        let height = self.field.height_at(x, z);
        if height > self.probe_altitude {
            return None;
        }
        let sample = self.blend.surface_at(self.field, x, z);
        Some(SurfaceHit {
            height,
            material: sample.material,
            influence: sample.influence,
        })
    }

    /// Probe and accept/reject against an allow-list.
    ///
    /// A rejected position is skipped, never deferred.
    pub fn classify(&self, x: f32, z: f32, allowed: &[SurfaceMaterial]) -> Option<SurfaceHit> {
        let hit = self.probe(x, z)?;
        if !allowed.contains(&hit.material) {
            return None;
        }
        if hit.influence < self.full_influence {
            return None;
        }
        Some(hit)
    }
}
