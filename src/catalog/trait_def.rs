//! Shade catalog lookup boundary.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{LipShade, Season, SeasonEntry};

/// Errors from catalog resolution.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("season {0} not found in catalog")]
    SeasonNotFound(Season),

    #[error("shade '{name}' not found for season {season}")]
    ShadeNotFound { season: Season, name: String },

    #[error("catalog request failed")]
    Http(#[from] reqwest::Error),

    #[error("catalog responded with status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },
}

/// Read-only shade catalog lookup.
///
/// Backed by an external store; no caching guarantees beyond request
/// scope. Shade lookup matches names case-insensitively.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait ShadeCatalog: Send + Sync {
    /// All season documents.
    async fn seasons(&self) -> Result<Vec<SeasonEntry>, CatalogError>;

    /// The document for a single season.
    async fn season(&self, season: Season) -> Result<SeasonEntry, CatalogError>;

    /// The single shade matching `name` within `season`.
    async fn lookup(&self, season: Season, name: &str) -> Result<LipShade, CatalogError>;
}
