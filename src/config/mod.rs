//! Configuration module for Markport
//!
//! This module handles user preferences and application settings,
//! including serialization/deserialization to/from JSON and
//! persistent storage to platform-specific directories, plus the small
//! key-value store that remembers the last session.

mod persistence;
mod settings;
mod storage;

pub use persistence::*;
pub use settings::*;
pub use storage::*;
