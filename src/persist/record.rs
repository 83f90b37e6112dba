//! Serializable chunk save records.
//!
//! A chunk persists as a list of (object id, transform, extras) entries
//! keyed by its coordinate. Extras are an open-ended string-keyed map so
//! collaborators can attach state (velocity, growth stage, ...) without the
//! engine knowing the schema; that open-endedness is why records are
//! self-describing JSON rather than a fixed binary layout.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::world::coord::ChunkCoord;

/// Position and rotation as explicit numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub rw: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_parts(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl Transform {
    pub fn from_parts(position: Vec3, rotation: Quat) -> Self {
        Self {
            px: position.x,
            py: position.y,
            pz: position.z,
            rx: rotation.x,
            ry: rotation.y,
            rz: rotation.z,
            rw: rotation.w,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.px, self.py, self.pz)
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_xyzw(self.rx, self.ry, self.rz, self.rw)
    }
}

/// One persisted placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: String,
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Persisted object set of one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Originating chunk coordinate as a 3-integer array.
    pub coord: [i32; 3],
    pub objects: Vec<ObjectRecord>,
}

impl ChunkRecord {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord: [coord.x, coord.y, coord.z],
            objects: Vec::new(),
        }
    }

    /// Coordinate by direct field assignment (never re-derived from a
    /// position).
    pub fn coord(&self) -> ChunkCoord {
        ChunkCoord::new(self.coord[0], self.coord[1], self.coord[2])
    }
}
