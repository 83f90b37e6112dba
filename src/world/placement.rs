//! Object placement collaborator.
//!
//! Placed world objects are owned by the placement system, not by chunks;
//! a chunk only tracks handles for save/unload bookkeeping. The in-crate
//! implementation is an arena with stable slot indices, so handles stay
//! valid across unrelated despawns and there are no ownership cycles
//! between chunks and objects.

use std::collections::{BTreeMap, HashSet};

use glam::{Quat, Vec3};

use crate::persist::record::{ObjectRecord, Transform};

/// Stable arena index of a placed object.
pub type ObjectHandle = u32;

/// A live placed object.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub object_id: String,
    pub position: Vec3,
    pub rotation: Quat,
    /// Open-ended per-object state, carried through save records verbatim.
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The narrow seam to the external object placement system.
pub trait ObjectPlacer {
    /// Place a new object of the given kind.
    ///
    /// Fails silently (returns `None`) if the id is unknown — mirroring a
    /// placement backend whose asset failed to load.
    fn place_new(&mut self, object_id: &str, position: Vec3) -> Option<ObjectHandle>;

    /// Overwrite an object's rotation.
    fn set_rotation(&mut self, handle: ObjectHandle, rotation: Quat);

    /// Remove an object from the world.
    fn despawn(&mut self, handle: ObjectHandle);

    /// Serialize an object into a save record. `None` if the handle is
    /// stale.
    fn write_record(&self, handle: ObjectHandle) -> Option<ObjectRecord>;

    /// Apply a save record's rotation and extras back onto a live object.
    /// The position was already fixed at placement time.
    fn read_record(&mut self, handle: ObjectHandle, record: &ObjectRecord);

    fn get(&self, handle: ObjectHandle) -> Option<&PlacedObject>;
}

/// Arena-backed placement system with stable indices.
pub struct ObjectArena {
    slots: Vec<Option<PlacedObject>>,
    free: Vec<u32>,
    /// Known placeable object ids; unknown ids fail silently.
    catalog: HashSet<String>,
}

impl Default for ObjectArena {
    fn default() -> Self {
        Self::with_catalog(["oak_tree", "flint_pickup", "iron_deposit"])
    }
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            catalog: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Register an additional placeable object id.
    pub fn register(&mut self, object_id: impl Into<String>) {
        self.catalog.insert(object_id.into());
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl ObjectPlacer for ObjectArena {
    fn place_new(&mut self, object_id: &str, position: Vec3) -> Option<ObjectHandle> {
        if !self.catalog.contains(object_id) {
            log::debug!("unknown object id {:?}, placement skipped", object_id);
            return None;
        }
        let object = PlacedObject {
            object_id: object_id.to_string(),
            position,
            rotation: Quat::IDENTITY,
            extra: BTreeMap::new(),
        };
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(object);
                Some(slot)
            }
            None => {
                self.slots.push(Some(object));
                Some((self.slots.len() - 1) as u32)
            }
        }
    }

    fn set_rotation(&mut self, handle: ObjectHandle, rotation: Quat) {
        if let Some(Some(object)) = self.slots.get_mut(handle as usize) {
            object.rotation = rotation;
        }
    }

    fn despawn(&mut self, handle: ObjectHandle) {
        if let Some(slot) = self.slots.get_mut(handle as usize) {
            if slot.take().is_some() {
                self.free.push(handle);
            }
        }
    }

    fn write_record(&self, handle: ObjectHandle) -> Option<ObjectRecord> {
        let object = self.get(handle)?;
        Some(ObjectRecord {
            id: object.object_id.clone(),
            transform: Transform::from_parts(object.position, object.rotation),
            extra: object.extra.clone(),
        })
    }

    fn read_record(&mut self, handle: ObjectHandle, record: &ObjectRecord) {
        if let Some(Some(object)) = self.slots.get_mut(handle as usize) {
            object.rotation = record.transform.rotation();
            object.extra = record.extra.clone();
        }
    }

    fn get(&self, handle: ObjectHandle) -> Option<&PlacedObject> {
        self.slots.get(handle as usize)?.as_ref()
    }
}
