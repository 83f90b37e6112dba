//! Chunk coordinates

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Chunk coordinate in world space.
///
/// Identifies a cube of world space with edge length `edge`; derived from a
/// world position by floor-division per axis. Keys every chunk-indexed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate of the chunk containing a world position.
    pub fn from_world(pos: Vec3, edge: u32) -> Self {
        let e = edge as f32;
        Self {
            x: (pos.x / e).floor() as i32,
            y: (pos.y / e).floor() as i32,
            z: (pos.z / e).floor() as i32,
        }
    }

    /// World-space origin (min corner) of this chunk's cube.
    pub fn world_origin(&self, edge: u32) -> Vec3 {
        let e = edge as f32;
        Vec3::new(self.x as f32 * e, self.y as f32 * e, self.z as f32 * e)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_floor_division() {
        assert_eq!(
            ChunkCoord::from_world(Vec3::new(0.0, 0.0, 0.0), 16),
            ChunkCoord::new(0, 0, 0)
        );
        assert_eq!(
            ChunkCoord::from_world(Vec3::new(15.9, 0.0, 0.0), 16),
            ChunkCoord::new(0, 0, 0)
        );
        assert_eq!(
            ChunkCoord::from_world(Vec3::new(16.0, 0.0, 0.0), 16),
            ChunkCoord::new(1, 0, 0)
        );
        // Negative positions floor toward negative infinity
        assert_eq!(
            ChunkCoord::from_world(Vec3::new(-0.1, 0.0, -16.0), 16),
            ChunkCoord::new(-1, 0, -1)
        );
    }

    #[test]
    fn test_world_origin_inverse() {
        let coord = ChunkCoord::new(3, -2, 7);
        let origin = coord.world_origin(16);
        assert_eq!(origin, Vec3::new(48.0, -32.0, 112.0));
        assert_eq!(ChunkCoord::from_world(origin, 16), coord);
    }
}
