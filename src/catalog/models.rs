//! Catalog document models.
//!
//! Shapes mirror the external catalog store's JSON surface: season
//! documents from `GET /ingredients` and the flattened shade list from
//! `GET /lipsticks`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four style-palette categories driving shade recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        };
        f.write_str(name)
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" => Ok(Season::Autumn),
            "winter" => Ok(Season::Winter),
            other => Err(format!("unknown season: {}", other)),
        }
    }
}

/// Pigment proportions for one shade, as integer pump counts per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PigmentMix {
    pub purple: u32,
    pub red: u32,
    pub oros: u32,
}

impl PigmentMix {
    /// Total pumps dispensed for this shade across all channels.
    pub fn total_pumps(&self) -> u32 {
        self.purple + self.red + self.oros
    }
}

/// A single lip shade entry within a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LipShade {
    pub name: String,
    /// Display color string, passed through to the UI verbatim.
    pub color: String,
    pub ingredients: PigmentMix,
}

/// A season document: description plus its non-overlapping shade set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonEntry {
    pub season: Season,
    pub description: String,
    pub lip_colors: Vec<LipShade>,
}

/// Flattened shade document from `GET /lipsticks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogShade {
    pub name: String,
    pub season: Season,
    pub color: String,
    pub ingredients: PigmentMix,
}

/// Case-insensitive exact-name lookup within a season document.
pub fn find_shade<'a>(entry: &'a SeasonEntry, name: &str) -> Option<&'a LipShade> {
    entry
        .lip_colors
        .iter()
        .find(|shade| shade.name.eq_ignore_ascii_case(name))
}
