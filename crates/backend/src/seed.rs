//! Startup import of plot data from a GeoJSON file or the built-in sample.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use plotmap_shared::error::DataError;
use plotmap_shared::geojson::{parse_geometry, primitive_attributes};
use plotmap_shared::geometry::{geodesic_area_hectares, plots_extent};
use plotmap_shared::models::{new_id, DatasetImport, Plot, PlotStatus};
use plotmap_shared::sample::sample_plots;
use serde_json::Value;
use thiserror::Error;

use crate::config::SeedConfig;
use crate::storage::{Storage, StorageError};

const CODE_KEYS: [&str; 4] = ["plot_code", "PLOT_CODE", "plotcode", "code"];
const AREA_KEYS: [&str; 3] = ["area_ha", "AREA_HA", "area"];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Dataset-wide values stamped onto every imported plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub dataset: String,
    pub district: String,
    pub ward: String,
    pub village: String,
}

fn code_from(props: &BTreeMap<String, Value>) -> Option<String> {
    CODE_KEYS.iter().find_map(|key| match props.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn area_from(props: &BTreeMap<String, Value>) -> Option<f64> {
    AREA_KEYS.iter().find_map(|key| {
        let area = match props.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        area.filter(|a| a.is_finite() && *a >= 0.0)
    })
}

/// Turn a raw FeatureCollection (shapefile export style, no ids) into
/// available plots. Features without a usable polygon are skipped.
pub fn import_collection(
    value: &Value,
    opts: &ImportOptions,
    now: DateTime<Utc>,
) -> Result<Vec<Plot>, DataError> {
    if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(DataError::NotFeatureCollection);
    }
    let features = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or(DataError::NotFeatureCollection)?;

    let mut plots = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let geometry = match parse_geometry(feature.get("geometry")) {
            Ok(g) => g.force_2d().into_multi_polygon(),
            Err(reason) => {
                tracing::warn!(index, %reason, "skipping seed feature");
                continue;
            }
        };
        let mut attributes = primitive_attributes(feature.get("properties"));
        attributes.retain(|_, v| !v.is_null());

        let plot_code =
            code_from(&attributes).unwrap_or_else(|| format!("{}_{:04}", opts.dataset, index + 1));
        let area_hectares = area_from(&attributes).unwrap_or_else(|| geodesic_area_hectares(&geometry));

        plots.push(Plot {
            id: new_id(),
            plot_code,
            status: PlotStatus::Available,
            area_hectares,
            district: opts.district.clone(),
            ward: opts.ward.clone(),
            village: opts.village.clone(),
            geometry,
            attributes,
            created_at: now,
            updated_at: now,
        });
    }
    Ok(plots)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Null => "null",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Attribute names across the imported plots with the type first seen.
fn attribute_schema(plots: &[Plot]) -> BTreeMap<String, String> {
    let mut schema = BTreeMap::new();
    for (key, value) in plots.iter().flat_map(|p| &p.attributes) {
        schema
            .entry(key.clone())
            .or_insert_with(|| json_type(value).to_string());
    }
    schema
}

/// Metadata describing one imported dataset.
pub fn import_record(dataset_name: &str, source: &Path, plots: &[Plot], now: DateTime<Utc>) -> DatasetImport {
    DatasetImport {
        dataset_name: dataset_name.to_string(),
        source_file: source.file_name().map(|n| n.to_string_lossy().into_owned()),
        attribute_schema: attribute_schema(plots),
        feature_count: plots.len() as u64,
        imported_at: now,
        bbox: plots_extent(plots).map(|b| b.to_polygon()),
    }
}

fn dataset_name(seed: &SeedConfig, path: &Path) -> String {
    seed.dataset.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string())
    })
}

/// Run the configured seeding. Returns how many plots were inserted.
pub fn run(storage: &Storage, seed: &SeedConfig) -> Result<usize, SeedError> {
    if let Some(path) = &seed.geojson {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| DataError::InvalidJson(e.to_string()))?;
        let opts = ImportOptions {
            dataset: dataset_name(seed, path),
            district: seed.district.clone(),
            ward: seed.ward.clone(),
            village: seed.village.clone(),
        };
        let now = Utc::now();
        let plots = import_collection(&value, &opts, now)?;
        let inserted = storage.insert_plots(&plots)?;
        storage.record_import(&import_record(&opts.dataset, path, &plots, now))?;
        tracing::info!(
            dataset = %opts.dataset,
            features = plots.len(),
            inserted,
            "imported seed file"
        );
        return Ok(inserted);
    }

    if seed.sample && storage.count_plots()? == 0 {
        let inserted = storage.insert_plots(&sample_plots())?;
        tracing::info!(inserted, "seeded sample plots");
        return Ok(inserted);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotmap_shared::models::Geometry;
    use serde_json::json;

    fn opts() -> ImportOptions {
        ImportOptions {
            dataset: "test_mbuyuni".into(),
            district: "Kilosa".into(),
            ward: "Mbuyuni".into(),
            village: "Mbuyuni".into(),
        }
    }

    fn square() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[37.0, -7.0, 410.0], [37.001, -7.0, 411.0], [37.001, -6.999, 412.0], [37.0, -6.999, 410.0], [37.0, -7.0, 410.0]]]
        })
    }

    #[test]
    fn test_import_fills_codes_and_areas() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"PLOT_CODE": "MBY-100", "area_ha": 2.5, "owner": null}, "geometry": square()},
                {"type": "Feature", "properties": {"landuse": "farm"}, "geometry": square()},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [37.0, -7.0]}}
            ]
        });
        let plots = import_collection(&collection, &opts(), Utc::now()).unwrap();
        assert_eq!(plots.len(), 2);

        assert_eq!(plots[0].plot_code, "MBY-100");
        assert_eq!(plots[0].area_hectares, 2.5);
        assert!(!plots[0].attributes.contains_key("owner"));
        assert_eq!(plots[0].status, PlotStatus::Available);
        assert_eq!(plots[0].district, "Kilosa");

        assert_eq!(plots[1].plot_code, "test_mbuyuni_0002");
        // Roughly 110m x 110m
        assert!(plots[1].area_hectares > 1.0 && plots[1].area_hectares < 1.5);
        assert_eq!(plots[1].attributes["landuse"], "farm");
    }

    #[test]
    fn test_import_stores_flat_multipolygons() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {"code": 7}, "geometry": square()}]
        });
        let plots = import_collection(&collection, &opts(), Utc::now()).unwrap();
        assert_eq!(plots[0].plot_code, "7");
        match &plots[0].geometry {
            Geometry::MultiPolygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert!(coordinates[0][0].iter().all(|pos| pos.len() == 2));
                assert_eq!(coordinates[0][0][1], vec![37.001, -7.0]);
            }
            other => panic!("expected MultiPolygon, got {}", other.kind()),
        }
    }

    #[test]
    fn test_not_a_collection() {
        let err = import_collection(&json!({"type": "Feature"}), &opts(), Utc::now()).unwrap_err();
        assert!(matches!(err, DataError::NotFeatureCollection));
    }

    #[test]
    fn test_sample_seeded_only_into_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("seed.redb")).unwrap();
        let seed = SeedConfig {
            sample: true,
            ..Default::default()
        };
        assert_eq!(run(&storage, &seed).unwrap(), 5);
        assert_eq!(run(&storage, &seed).unwrap(), 0);
        assert_eq!(storage.count_plots().unwrap(), 5);
    }

    #[test]
    fn test_seed_file_import() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("village.geojson");
        let collection = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {}, "geometry": square()}]
        });
        std::fs::write(&file, collection.to_string()).unwrap();
        let storage = Storage::open(&dir.path().join("seed.redb")).unwrap();
        let seed = SeedConfig {
            geojson: Some(file),
            district: "Kilosa".into(),
            ..Default::default()
        };
        assert_eq!(run(&storage, &seed).unwrap(), 1);
        let plots = storage.list_plots().unwrap();
        assert_eq!(plots[0].plot_code, "village_0001");

        let record = storage.get_import("village").unwrap().unwrap();
        assert_eq!(record.source_file.as_deref(), Some("village.geojson"));
        assert_eq!(record.feature_count, 1);
        let bbox = plotmap_shared::geometry::geometry_bounds(record.bbox.as_ref().unwrap()).unwrap();
        assert_eq!((bbox.min_lng, bbox.max_lat), (37.0, -6.999));

        // Same codes on a second run are skipped, the import record is refreshed
        assert_eq!(run(&storage, &seed).unwrap(), 0);
        assert_eq!(storage.list_imports().unwrap().len(), 1);
    }

    #[test]
    fn test_import_record_schema() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"landuse": "farm", "parcel_no": 12}, "geometry": square()},
                {"type": "Feature", "properties": {"surveyed": true, "parcel_no": 13}, "geometry": square()}
            ]
        });
        let plots = import_collection(&collection, &opts(), Utc::now()).unwrap();
        let record = import_record("test_mbuyuni", Path::new("data/mbuyuni.geojson"), &plots, Utc::now());
        assert_eq!(record.feature_count, 2);
        assert_eq!(record.source_file.as_deref(), Some("mbuyuni.geojson"));
        assert_eq!(record.attribute_schema["landuse"], "string");
        assert_eq!(record.attribute_schema["parcel_no"], "number");
        assert_eq!(record.attribute_schema["surveyed"], "boolean");
        assert!(record.bbox.is_some());
    }
}
