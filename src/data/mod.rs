use crate::error::{AtlasError, Result};
use crate::map::{Polygon, RegionBoundary};
use geojson::{GeoJson, Geometry, Value};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, warn};

/// Read a region boundary GeoJSON file without an async runtime
pub fn read_boundaries(path: &Path, name_property: &str) -> Result<Vec<RegionBoundary>> {
    let mut bytes = std::fs::read(path).map_err(|source| AtlasError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_boundaries(&mut bytes, name_property)
}

/// Load a region boundary GeoJSON file
pub async fn load_boundaries(path: &Path, name_property: &str) -> Result<Vec<RegionBoundary>> {
    let mut bytes = tokio::fs::read(path).await.map_err(|source| AtlasError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let regions = parse_boundaries(&mut bytes, name_property)?;
    debug!(path = %path.display(), regions = regions.len(), "loaded boundaries");
    Ok(regions)
}

/// Parse a FeatureCollection of named polygons.
///
/// The buffer is parsed in place by simd-json and is left clobbered.
pub fn parse_boundaries(bytes: &mut [u8], name_property: &str) -> Result<Vec<RegionBoundary>> {
    let json: serde_json::Value = simd_json::serde::from_slice(bytes)?;
    let geojson = GeoJson::from_json_value(json)?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(AtlasError::invalid(
                "boundary dataset is a bare geometry; expected named features",
            ))
        }
    };

    let mut regions = Vec::with_capacity(features.len());
    for (idx, feature) in features.into_iter().enumerate() {
        let name = match feature.property(name_property) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(AtlasError::invalid(format!(
                    "feature {idx} has no `{name_property}` property"
                )))
            }
        };

        let Some(geometry) = feature.geometry else {
            warn!(region = %name, "feature has no geometry, skipping");
            continue;
        };

        let mut polygons = Vec::new();
        collect_polygons(&geometry, &mut polygons);
        if polygons.is_empty() {
            warn!(region = %name, "feature has no polygon geometry, skipping");
            continue;
        }
        regions.push(RegionBoundary::new(name, polygons));
    }

    if regions.is_empty() {
        return Err(AtlasError::invalid("boundary dataset contains no regions"));
    }
    Ok(regions)
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    let to_polygon = |rings: &Vec<Vec<Vec<f64>>>| -> Polygon {
        rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .filter(|c| c.len() >= 2)
                    .map(|c| (c[0], c[1]))
                    .collect()
            })
            .collect()
    };

    match &geometry.value {
        Value::Polygon(rings) => out.push(to_polygon(rings)),
        Value::MultiPolygon(polygons) => out.extend(polygons.iter().map(to_polygon)),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// Load a CSV file into typed rows
pub async fn load_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = tokio::fs::read(path).await.map_err(|source| AtlasError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse_csv(&bytes, path)?;
    debug!(path = %path.display(), rows = rows.len(), "loaded table");
    Ok(rows)
}

/// Parse CSV with a header row; `origin` only labels errors
pub fn parse_csv<T: DeserializeOwned>(bytes: &[u8], origin: &Path) -> Result<Vec<T>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes)
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|source| AtlasError::Csv {
            path: origin.to_path_buf(),
            source,
        })
}

/// Lenient numeric cell: missing or non-numeric markers such as `..` become `None`
pub fn numeric_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const TWO_REGIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"ST": "Kachin"},
             "geometry": {"type": "Polygon", "coordinates": [[[96,24],[98,24],[98,27],[96,27],[96,24]]]}},
            {"type": "Feature", "properties": {"ST": "Yangon"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[95.5,16.5],[96.5,16.5],[96.5,17.5],[95.5,16.5]]],
                [[[96.6,16.6],[96.8,16.6],[96.8,16.8],[96.6,16.6]]]
             ]}},
            {"type": "Feature", "properties": {"ST": "Point"},
             "geometry": {"type": "Point", "coordinates": [96, 20]}}
        ]
    }"#;

    #[test]
    fn test_parse_named_polygons() {
        let mut bytes = TWO_REGIONS.as_bytes().to_vec();
        let regions = parse_boundaries(&mut bytes, "ST").unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name, "Kachin");
        assert_eq!(regions[0].vertex_count(), 5);
        assert_eq!(regions[1].name, "Yangon");
        assert_eq!(regions[1].polygons.len(), 2);
    }

    #[test]
    fn test_missing_name_property_is_invalid() {
        let mut bytes = TWO_REGIONS.as_bytes().to_vec();
        let err = parse_boundaries(&mut bytes, "NAME_1").unwrap_err();
        assert!(matches!(err, AtlasError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_collection_is_invalid() {
        let mut bytes = br#"{"type":"FeatureCollection","features":[]}"#.to_vec();
        assert!(matches!(
            parse_boundaries(&mut bytes, "ST"),
            Err(AtlasError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let mut bytes = b"{not json".to_vec();
        assert!(matches!(parse_boundaries(&mut bytes, "ST"), Err(AtlasError::Json(_))));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        name: String,
        value: f64,
    }

    #[test]
    fn test_parse_csv_rows() {
        let rows: Vec<Row> = parse_csv(b"name,value\nA, 42\nB,7.5\n", Path::new("t.csv")).unwrap();
        assert_eq!(
            rows,
            vec![
                Row { name: "A".into(), value: 42.0 },
                Row { name: "B".into(), value: 7.5 },
            ]
        );
    }

    #[test]
    fn test_parse_csv_reports_origin() {
        let err = parse_csv::<Row>(b"name,value\nA,oops\n", Path::new("bad.csv")).unwrap_err();
        assert!(err.to_string().contains("bad.csv"), "{err}");
    }

    #[test]
    fn test_numeric_cell() {
        assert_eq!(numeric_cell(" 12.5 "), Some(12.5));
        assert_eq!(numeric_cell(".."), None);
        assert_eq!(numeric_cell(""), None);
        assert_eq!(numeric_cell("NaN"), None);
    }
}
