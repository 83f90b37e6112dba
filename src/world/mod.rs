//! Spatial partitioning, chunk lifecycle and the streaming manager

pub mod chunk;
pub mod coord;
pub mod manager;
pub mod placement;

pub use chunk::{Chunk, ChunkState};
pub use coord::ChunkCoord;
pub use manager::{ChunkManager, normalize_render_distance};
pub use placement::{ObjectArena, ObjectHandle, ObjectPlacer, PlacedObject};
