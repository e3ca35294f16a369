//! Shadematch Engine Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod dispenser;

// Re-export commonly used types for convenience
pub use analysis::{SkinToneAnalysis, SkinToneAnalyzer};
pub use catalog::{HttpShadeCatalog, Season, ShadeCatalog, StaticShadeCatalog};
pub use dispenser::{CommandChannel, DispenseSequencer, DispenseState};
