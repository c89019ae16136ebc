//! GeoJSON wire format for plots and lenient validation of registry responses.
//!
//! A response is rejected as a whole only when it is not a FeatureCollection.
//! Individual features that cannot be turned into a [`Plot`] are dropped and
//! logged so one bad record never hides the rest.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::DataError;
use crate::geometry::{geometry_bounds, Bounds, TANZANIA};
use crate::models::{Geometry, Plot, PlotStatus};

const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotProperties {
    pub id: String,
    pub plot_code: String,
    pub status: PlotStatus,
    pub area_hectares: f64,
    pub district: String,
    pub ward: String,
    pub village: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: PlotProperties,
    pub geometry: Geometry,
}

impl From<&Plot> for Feature {
    fn from(plot: &Plot) -> Self {
        Feature {
            kind: "Feature".to_string(),
            properties: PlotProperties {
                id: plot.id.clone(),
                plot_code: plot.plot_code.clone(),
                status: plot.status,
                area_hectares: plot.area_hectares,
                district: plot.district.clone(),
                ward: plot.ward.clone(),
                village: plot.village.clone(),
                attributes: plot.attributes.clone(),
                created_at: plot.created_at,
                updated_at: plot.updated_at,
            },
            geometry: plot.geometry.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_plots<'a>(plots: impl IntoIterator<Item = &'a Plot>) -> Self {
        FeatureCollection {
            kind: "FeatureCollection".to_string(),
            features: plots.into_iter().map(Feature::from).collect(),
        }
    }
}

/// How strictly incoming features are checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationOptions {
    /// Drop features whose extent is not inside `region`.
    pub strict_bounds: bool,
    pub region: Bounds,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            strict_bounds: false,
            region: TANZANIA,
        }
    }
}

impl ValidationOptions {
    pub fn strict() -> Self {
        ValidationOptions {
            strict_bounds: true,
            ..Default::default()
        }
    }
}

/// Why a single feature was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureRejection {
    #[error("feature is not an object")]
    NotAnObject,
    #[error("missing id")]
    MissingId,
    #[error("missing plot_code")]
    MissingPlotCode,
    #[error("missing geometry")]
    MissingGeometry,
    #[error("unsupported geometry type {0}")]
    UnsupportedGeometry(String),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("geometry has no usable ring")]
    EmptyGeometry,
    #[error("geometry lies outside the configured region")]
    OutOfRegion,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPlots {
    pub plots: Vec<Plot>,
    pub rejected: usize,
}

/// Parse a raw `/api/plots` body.
pub fn parse_plot_collection(
    body: &str,
    opts: &ValidationOptions,
    now: DateTime<Utc>,
) -> Result<ParsedPlots, DataError> {
    if body.trim().is_empty() {
        return Err(DataError::EmptyBody);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| DataError::InvalidJson(e.to_string()))?;
    plots_from_collection(&value, opts, now)
}

/// Validate an already-decoded FeatureCollection.
pub fn plots_from_collection(
    value: &Value,
    opts: &ValidationOptions,
    now: DateTime<Utc>,
) -> Result<ParsedPlots, DataError> {
    if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(DataError::NotFeatureCollection);
    }
    let features = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or(DataError::NotFeatureCollection)?;

    let mut parsed = ParsedPlots::default();
    for (index, feature) in features.iter().enumerate() {
        match plot_from_feature(feature, opts, now) {
            Ok(plot) => parsed.plots.push(plot),
            Err(reason) => {
                tracing::warn!(index, %reason, "dropping invalid plot feature");
                parsed.rejected += 1;
            }
        }
    }
    tracing::debug!(
        valid = parsed.plots.len(),
        rejected = parsed.rejected,
        "validated plot collection"
    );
    Ok(parsed)
}

/// Turn one GeoJSON feature into a plot, filling optional fields with
/// defaults.
pub fn plot_from_feature(
    feature: &Value,
    opts: &ValidationOptions,
    now: DateTime<Utc>,
) -> Result<Plot, FeatureRejection> {
    let feature = feature.as_object().ok_or(FeatureRejection::NotAnObject)?;
    let empty = Map::new();
    let props = feature
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let id = props
        .get("id")
        .and_then(id_string)
        .or_else(|| feature.get("id").and_then(id_string))
        .ok_or(FeatureRejection::MissingId)?;
    let plot_code = props
        .get("plot_code")
        .and_then(non_empty_str)
        .ok_or(FeatureRejection::MissingPlotCode)?;

    let geometry = parse_geometry(feature.get("geometry"))?;
    if opts.strict_bounds {
        let inside = geometry_bounds(&geometry).is_some_and(|b| opts.region.contains_bounds(&b));
        if !inside {
            return Err(FeatureRejection::OutOfRegion);
        }
    }

    let status = props
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();

    Ok(Plot {
        id,
        plot_code,
        status,
        area_hectares: props.get("area_hectares").map(coerce_area).unwrap_or(0.0),
        district: location_field(props, "district"),
        ward: location_field(props, "ward"),
        village: location_field(props, "village"),
        geometry,
        attributes: primitive_attributes(props.get("attributes")),
        created_at: props.get("created_at").and_then(parse_timestamp).unwrap_or(now),
        updated_at: props.get("updated_at").and_then(parse_timestamp).unwrap_or(now),
    })
}

pub fn parse_geometry(value: Option<&Value>) -> Result<Geometry, FeatureRejection> {
    let value = match value {
        Some(v) if !v.is_null() => v,
        _ => return Err(FeatureRejection::MissingGeometry),
    };
    match value.get("type").and_then(Value::as_str) {
        Some("Polygon") | Some("MultiPolygon") => {}
        Some(other) => return Err(FeatureRejection::UnsupportedGeometry(other.to_string())),
        None => return Err(FeatureRejection::MissingGeometry),
    }
    let geometry: Geometry = serde_json::from_value(value.clone())
        .map_err(|e| FeatureRejection::InvalidGeometry(e.to_string()))?;
    if !geometry.is_renderable() {
        return Err(FeatureRejection::EmptyGeometry);
    }
    Ok(geometry)
}

/// Ids may arrive as strings or numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        other => non_empty_str(other),
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn coerce_area(value: &Value) -> f64 {
    let area = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    area.filter(|a| a.is_finite() && *a >= 0.0).unwrap_or(0.0)
}

fn location_field(props: &Map<String, Value>, key: &str) -> String {
    props
        .get(key)
        .and_then(non_empty_str)
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

/// Keep only scalar attribute values.
pub fn primitive_attributes(value: Option<&Value>) -> BTreeMap<String, Value> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
