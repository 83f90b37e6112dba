//! Chunk save records and the saved-record store

pub mod record;
pub mod store;

pub use record::{ChunkRecord, ObjectRecord, Transform};
pub use store::SaveStore;
