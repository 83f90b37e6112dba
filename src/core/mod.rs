//! Core types and utilities

pub mod config;
pub mod error;
pub mod logging;

pub use config::WorldConfig;
pub use error::{Error, Result};
