//! Veldt — chunk streaming and procedural world population engine
//!
//! Streams fixed-size world chunks around a moving observer, populates
//! newly-entered chunks with scattered content (trees, pickups, ore-like
//! deposits) from a deterministic cell-hash sampler, and reconciles that
//! procedural content with persisted state so save/reload is stable.

pub mod core;
pub mod persist;
pub mod population;
pub mod terrain;
pub mod world;
