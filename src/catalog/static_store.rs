//! In-crate seeded shade catalog.
//!
//! Carries the four seasonal palettes so tests and offline runs do not
//! depend on the external store. Pump counts here are representative
//! blend recipes; production counts live in the store.

use async_trait::async_trait;

use super::models::{find_shade, LipShade, PigmentMix, Season, SeasonEntry};
use super::trait_def::{CatalogError, ShadeCatalog};

/// Static shade catalog with the bundled seasonal palettes.
#[derive(Debug, Clone)]
pub struct StaticShadeCatalog {
    entries: Vec<SeasonEntry>,
}

fn shade(name: &str, color: &str, purple: u32, red: u32, oros: u32) -> LipShade {
    LipShade {
        name: name.to_string(),
        color: color.to_string(),
        ingredients: PigmentMix { purple, red, oros },
    }
}

impl Default for StaticShadeCatalog {
    fn default() -> Self {
        let entries = vec![
            SeasonEntry {
                season: Season::Spring,
                description: "Light Spring is warm-neutral, quite bright and characterised by \
                              extremely high levels of lightness. Your best colors are warm, \
                              clear, and light with golden undertones."
                    .to_string(),
                lip_colors: vec![
                    shade("Deep Blush", "rgba(225,110,129,255)", 2, 5, 3),
                    shade("Valencia", "rgba(220,66,61,255)", 1, 7, 2),
                    shade("Mauvelous", "rgba(239,148,161,255)", 3, 4, 3),
                ],
            },
            SeasonEntry {
                season: Season::Summer,
                description: "Soft Summer has cool-neutral undertones with medium levels of \
                              lightness and softness. Your ideal colors are muted, cool, and \
                              delicate with a subtle blue undertone."
                    .to_string(),
                lip_colors: vec![
                    shade("Night Shadz", "rgba(168,57,81,255)", 4, 5, 1),
                    shade("Mulberry", "rgba(206,75,124,255)", 5, 4, 1),
                    shade("Puce", "rgba(208,126,154,255)", 4, 3, 3),
                ],
            },
            SeasonEntry {
                season: Season::Autumn,
                description: "Deep Autumn features warm undertones with lower levels of \
                              lightness and clarity. Your complementary colors are warm, muted, \
                              and rich with earthy golden undertones."
                    .to_string(),
                lip_colors: vec![
                    shade("Tall Poppy", "rgba(168,44,49,255)", 2, 6, 2),
                    shade("Turkish Rose", "rgba(187,107,113,255)", 4, 4, 2),
                    shade("Tonys Pink", "rgb(232,156,156)", 2, 4, 4),
                ],
            },
            SeasonEntry {
                season: Season::Winter,
                description: "True Winter has cool undertones with high contrast and clarity. \
                              Your perfect colors are clear, cool, and dramatic with blue or \
                              blue-red undertones."
                    .to_string(),
                lip_colors: vec![
                    shade("Medium Carmine", "rgba(173,58,67,255)", 3, 6, 1),
                    shade("Viola", "rgba(211,156,195,255)", 6, 2, 2),
                    shade("Charm", "rgba(210,123,141,255)", 4, 4, 2),
                ],
            },
        ];
        Self { entries }
    }
}

#[async_trait]
impl ShadeCatalog for StaticShadeCatalog {
    async fn seasons(&self) -> Result<Vec<SeasonEntry>, CatalogError> {
        Ok(self.entries.clone())
    }

    async fn season(&self, season: Season) -> Result<SeasonEntry, CatalogError> {
        self.entries
            .iter()
            .find(|entry| entry.season == season)
            .cloned()
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

    #[tokio::test]
    async fn every_season_has_three_shades() {
        let catalog = StaticShadeCatalog::default();
        let seasons = catalog.seasons().await.unwrap();
        assert_eq!(seasons.len(), 4);
        for entry in seasons {
            assert_eq!(entry.lip_colors.len(), 3);
            assert!(!entry.description.is_empty());
        }
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let catalog = StaticShadeCatalog::default();
        let found = catalog.lookup(Season::Spring, "valencia").await.unwrap();
        assert_eq!(found.name, "Valencia");
    }

    #[tokio::test]
    async fn unknown_shade_fails_with_shade_not_found() {
        let catalog = StaticShadeCatalog::default();
        match catalog.lookup(Season::Winter, "valencia").await {
            Err(CatalogError::ShadeNotFound { season, name }) => {
                assert_eq!(season, Season::Winter);
                assert_eq!(name, "valencia");
            }
            other => panic!("expected ShadeNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn shade_names_are_unique_across_seasons() {
        let catalog = StaticShadeCatalog::default();
        let mut names = std::collections::HashSet::new();
        for entry in catalog.seasons().await.unwrap() {
            for shade in entry.lip_colors {
                assert!(names.insert(shade.name.to_ascii_lowercase()));
            }
        }
    }
}
