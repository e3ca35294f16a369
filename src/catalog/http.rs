//! HTTP client for the external catalog store.

use async_trait::async_trait;
use std::time::Duration;

use super::models::{find_shade, CatalogShade, LipShade, Season, SeasonEntry};
use super::trait_def::{CatalogError, ShadeCatalog};

/// HTTP-backed shade catalog.
///
/// Consumes the external collaborator surface: `GET /ingredients` for
/// season documents and `GET /lipsticks` for the flattened shade list.
pub struct HttpShadeCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShadeCatalog {
    /// Create a new catalog client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the catalog store (e.g., "http://localhost:5001/api")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: impl Into<String>, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// The flattened shade list across all seasons.
    pub async fn all_shades(&self) -> Result<Vec<CatalogShade>, CatalogError> {
        self.get_json("lipsticks").await
    }
}

#[async_trait]
impl ShadeCatalog for HttpShadeCatalog {
    async fn seasons(&self) -> Result<Vec<SeasonEntry>, CatalogError> {
        self.get_json("ingredients").await
    }

    async fn season(&self, season: Season) -> Result<SeasonEntry, CatalogError> {
        self.seasons()
            .await?
            .into_iter()
            .find(|entry| entry.season == season)
            .ok_or(CatalogError::SeasonNotFound(season))
    }

    async fn lookup(&self, season: Season, name: &str) -> Result<LipShade, CatalogError> {
        let entry = self.season(season).await?;
        find_shade(&entry, name)
            .cloned()
            .ok_or_else(|| CatalogError::ShadeNotFound {
                season,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let catalog = HttpShadeCatalog::new("http://localhost:5001/api/", 10);
        assert_eq!(catalog.base_url, "http://localhost:5001/api");
    }

    #[test]
    fn lipsticks_response_shape_deserializes() {
        let json = r#"[
            {"name": "Valencia", "season": "Spring", "color": "rgba(220,66,61,255)",
             "ingredients": {"purple": 1, "red": 7, "oros": 2}},
            {"name": "Mulberry", "season": "Summer", "color": "rgba(206,75,124,255)",
             "ingredients": {"purple": 5, "red": 4, "oros": 1}}
        ]"#;
        let shades: Vec<CatalogShade> = serde_json::from_str(json).unwrap();
        assert_eq!(shades.len(), 2);
        assert_eq!(shades[1].season, Season::Summer);
    }
}
