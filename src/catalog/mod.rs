//! Shade catalog resolver.
//!
//! External collaborator boundary: given a season (and optionally a shade
//! name) the catalog returns lip-shade entries with their pigment
//! proportions. The core treats it as a read-only lookup.

mod http;
mod models;
mod static_store;
mod trait_def;

pub use http::HttpShadeCatalog;
pub use models::{find_shade, CatalogShade, LipShade, PigmentMix, Season, SeasonEntry};
pub use static_store::StaticShadeCatalog;
pub use trait_def::{CatalogError, ShadeCatalog};

#[cfg(feature = "mock")]
pub use trait_def::MockShadeCatalog;
