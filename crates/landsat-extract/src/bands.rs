//! Sensor generations and their band-to-RGB mapping.
//!
//! Landsat 4/5 TM and 7 ETM+ number the visible bands blue=B1, green=B2,
//! red=B3. Landsat 8/9 OLI inserts a coastal band first, shifting them to
//! blue=B2, green=B3, red=B4.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which band numbering an archive follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorGeneration {
    /// TM / ETM+ numbering: RGB = (B3, B2, B1).
    #[serde(alias = "l5", alias = "5")]
    Landsat5,
    /// OLI numbering: RGB = (B4, B3, B2).
    #[default]
    #[serde(alias = "l8", alias = "8")]
    Landsat8,
}

impl SensorGeneration {
    /// Band names in (red, green, blue) order.
    pub fn rgb_bands(&self) -> [&'static str; 3] {
        match self {
            SensorGeneration::Landsat5 => ["B3", "B2", "B1"],
            SensorGeneration::Landsat8 => ["B4", "B3", "B2"],
        }
    }

    /// Band names in ascending order, as requested from the catalog.
    pub fn download_bands(&self) -> Vec<String> {
        let mut bands: Vec<String> = self.rgb_bands().iter().map(|b| b.to_string()).collect();
        bands.reverse();
        bands
    }

    /// File name suffixes in (red, green, blue) order.
    pub fn rgb_suffixes(&self) -> [String; 3] {
        self.rgb_bands().map(|band| format!("{band}.tif"))
    }
}

impl fmt::Display for SensorGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorGeneration::Landsat5 => write!(f, "landsat5"),
            SensorGeneration::Landsat8 => write!(f, "landsat8"),
        }
    }
}

impl FromStr for SensorGeneration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5" | "l5" | "landsat5" => Ok(SensorGeneration::Landsat5),
            "8" | "l8" | "landsat8" => Ok(SensorGeneration::Landsat8),
            other => Err(format!(
                "unknown sensor generation '{}' (use landsat5 or landsat8)",
                other
            )),
        }
    }
}
