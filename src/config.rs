//! Run configuration: dataset locations, basemap geometry and output settings.
//!
//! Every field has a default, so a config file only lists what it overrides.

use crate::error::{AtlasError, Result};
use crate::map::{BasemapStyle, TileRange, Viewport};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Paths of the input datasets
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Datasets {
    pub boundaries: PathBuf,
    pub battles: PathBuf,
    pub timeseries: PathBuf,
    pub summary: PathBuf,
    pub admin_totals: PathBuf,
    pub indicators: PathBuf,
}

impl Default for Datasets {
    fn default() -> Self {
        Self {
            boundaries: "data/geo/state-regions.geojson".into(),
            battles: "data/chart/1/coords_mmr.csv".into(),
            timeseries: "data/chart/2/timeseries_mmr.csv".into(),
            summary: "data/chart/3/myanmar_deadly_events_summary.csv".into(),
            admin_totals: "data/chart/4/myanmar_post_coup_events_fatalities_by_admin1.csv".into(),
            indicators: "data/chart/5/countries_indicators.csv".into(),
        }
    }
}

/// Indicator selection for the dumbbell chart
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DumbbellSettings {
    /// Defaults to the first series in the table
    pub series_code: Option<String>,
    pub exclude_country: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AtlasConfig {
    pub datasets: Datasets,
    pub viewport: Viewport,
    pub tiles: TileRange,
    pub tile_template: String,
    /// GeoJSON feature property holding the region name
    pub name_property: String,
    pub output_dir: PathBuf,
    pub stage_timeout_secs: f64,
    pub dumbbell: DumbbellSettings,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            datasets: Datasets::default(),
            viewport: Viewport::new(300.0, 600.0),
            tiles: TileRange::DEFAULT,
            tile_template: "data/geo/tiles/{z}_{x}_{y}.jfif".to_string(),
            name_property: "ST".to_string(),
            output_dir: "out".into(),
            stage_timeout_secs: 10.0,
            dumbbell: DumbbellSettings::default(),
        }
    }
}

impl AtlasConfig {
    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let mut bytes = std::fs::read(path).map_err(|source| AtlasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&mut bytes)
    }

    pub fn parse(bytes: &mut [u8]) -> Result<Self> {
        let config: Self = simd_json::serde::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.viewport.validate()?;
        if !(self.stage_timeout_secs.is_finite() && self.stage_timeout_secs > 0.0) {
            return Err(AtlasError::invalid(format!(
                "stage timeout must be positive, got {}",
                self.stage_timeout_secs
            )));
        }
        if self.name_property.is_empty() {
            return Err(AtlasError::invalid("name property must not be empty"));
        }
        Ok(())
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.stage_timeout_secs)
    }

    pub fn basemap_style(&self) -> BasemapStyle {
        BasemapStyle {
            tile_template: self.tile_template.clone(),
            ..BasemapStyle::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_article() {
        let config = AtlasConfig::default();
        assert_eq!(config.viewport, Viewport::new(300.0, 600.0));
        assert_eq!(config.tiles.len(), 10);
        assert_eq!(config.tiles.zoom(), 6);
        assert_eq!(config.stage_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let mut json = br#"{
            "viewport": {"width": 400, "height": 800},
            "datasets": {"battles": "events.csv"},
            "dumbbell": {"exclude_country": "Korea, Rep."}
        }"#
        .to_vec();
        let config = AtlasConfig::parse(&mut json).unwrap();
        assert_eq!(config.viewport, Viewport::new(400.0, 800.0));
        assert_eq!(config.datasets.battles, PathBuf::from("events.csv"));
        assert_eq!(config.datasets.boundaries, Datasets::default().boundaries);
        assert_eq!(config.dumbbell.exclude_country.as_deref(), Some("Korea, Rep."));
        assert_eq!(config.name_property, "ST");
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut json = br#"{"viewport": {"width": 0, "height": 800}}"#.to_vec();
        assert!(matches!(AtlasConfig::parse(&mut json), Err(AtlasError::InvalidInput(_))));

        let mut json = br#"{"stage_timeout_secs": -1}"#.to_vec();
        assert!(AtlasConfig::parse(&mut json).is_err());

        let mut json = br#"{"tiles": {"x": [49, 48], "y": [33, 37], "zoom": 6}}"#.to_vec();
        assert!(AtlasConfig::parse(&mut json).is_err());

        let mut json = br#"{"unknown": 1}"#.to_vec();
        assert!(AtlasConfig::parse(&mut json).is_err());
    }
}
