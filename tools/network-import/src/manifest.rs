//! Network description file read by `import`.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkManifest {
    pub categories: Vec<CategoryManifest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryManifest {
    pub name: String,
    #[serde(default)]
    pub lines: Vec<LineManifest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineManifest {
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub line_type: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub description: Option<String>,
    /// In travel order
    #[serde(default)]
    pub stops: Vec<StopManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopManifest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NetworkManifest {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse network file {}", path.display()))
    }

    pub fn line_count(&self) -> usize {
        self.categories.iter().map(|c| c.lines.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let manifest: NetworkManifest = serde_json::from_str(
            r#"{
                "categories": [
                    { "name": "Bus" },
                    {
                        "name": "Métro",
                        "lines": [{
                            "number": "A",
                            "name": "Métro A",
                            "startTime": "05:00:00",
                            "stops": [{ "name": "Arènes", "latitude": 43.6097, "longitude": 1.3887 }]
                        }]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.line_count(), 1);
        let line = &manifest.categories[1].lines[0];
        assert_eq!(line.start_time, NaiveTime::from_hms_opt(5, 0, 0));
        assert_eq!(line.end_time, None);
        assert_eq!(line.stops[0].name, "Arènes");
    }

    #[test]
    fn test_bundled_sample_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/toulouse.json");
        let manifest = NetworkManifest::read(&path).unwrap();
        assert_eq!(manifest.categories.len(), 2);
        assert_eq!(manifest.line_count(), 4);
    }
}
