//! Terrain heightfield and surface material layering

pub mod heightfield;
pub mod material;

pub use heightfield::{Heightfield, TerrainParams};
pub use material::{MaterialSample, SurfaceBlend, SurfaceBlendParams, SurfaceMaterial};
