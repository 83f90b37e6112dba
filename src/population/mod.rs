//! Procedural population: density sampling, candidate generation,
//! surface classification.

pub mod candidates;
pub mod classifier;
pub mod density;
pub mod params;

pub use candidates::{CandidateJob, CellIndex};
pub use classifier::{SurfaceClassifier, SurfaceHit};
pub use params::{Category, CategoryParams, PopulationParams};
