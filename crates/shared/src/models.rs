use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single `[lon, lat]` or `[lon, lat, elevation]` coordinate.
pub type Position = Vec<f64>;

/// A closed linear ring of positions.
pub type Ring = Vec<Position>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotStatus {
    #[default]
    Available,
    Taken,
    Pending,
    /// Any status string the registry sends that this client does not know.
    #[serde(other)]
    Unknown,
}

impl PlotStatus {
    pub const ALL: [PlotStatus; 3] = [PlotStatus::Available, PlotStatus::Taken, PlotStatus::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlotStatus::Available => "available",
            PlotStatus::Taken => "taken",
            PlotStatus::Pending => "pending",
            PlotStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlotStatus::Available => "Available",
            PlotStatus::Taken => "Taken",
            PlotStatus::Pending => "Pending",
            PlotStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotStatus {
    type Err = std::convert::Infallible;

    /// Case-insensitive. Unrecognised values become `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "available" => PlotStatus::Available,
            "taken" => PlotStatus::Taken,
            "pending" => PlotStatus::Pending,
            _ => PlotStatus::Unknown,
        })
    }
}

/// Plot outline in GeoJSON form. Only the two areal kinds are supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    /// Polygons of this geometry as MultiPolygon coordinates.
    ///
    /// A Polygon is wrapped in a single-element list; coordinate values are
    /// never touched.
    pub fn to_multi_polygon(&self) -> Vec<Vec<Ring>> {
        match self {
            Geometry::Polygon { coordinates } => vec![coordinates.clone()],
            Geometry::MultiPolygon { coordinates } => coordinates.clone(),
        }
    }

    pub fn into_multi_polygon(self) -> Geometry {
        match self {
            Geometry::Polygon { coordinates } => Geometry::MultiPolygon {
                coordinates: vec![coordinates],
            },
            multi => multi,
        }
    }

    /// True when at least one polygon has a non-empty outer ring and every
    /// position carries a finite longitude and latitude.
    pub fn is_renderable(&self) -> bool {
        let polygons = match self {
            Geometry::Polygon { coordinates } => std::slice::from_ref(coordinates),
            Geometry::MultiPolygon { coordinates } => coordinates.as_slice(),
        };
        let has_ring = polygons
            .iter()
            .any(|rings| rings.first().is_some_and(|outer| !outer.is_empty()));
        let positions_ok = polygons.iter().flatten().flatten().all(|pos| {
            pos.len() >= 2 && pos[0].is_finite() && pos[1].is_finite()
        });
        has_ring && positions_ok
    }

    /// Drop any elevation component, keeping `[lon, lat]` pairs.
    pub fn force_2d(self) -> Geometry {
        let flatten_ring = |ring: Ring| -> Ring {
            ring.into_iter()
                .map(|mut pos| {
                    pos.truncate(2);
                    pos
                })
                .collect()
        };
        match self {
            Geometry::Polygon { coordinates } => Geometry::Polygon {
                coordinates: coordinates.into_iter().map(flatten_ring).collect(),
            },
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .into_iter()
                    .map(|rings| rings.into_iter().map(flatten_ring).collect())
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: String,
    pub plot_code: String,
    pub status: PlotStatus,
    pub area_hectares: f64,
    pub district: String,
    pub ward: String,
    pub village: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plot {
    pub fn is_available(&self) -> bool {
        self.status == PlotStatus::Available
    }

    /// "Village, Ward, District" for display.
    pub fn location(&self) -> String {
        format!("{}, {}, {}", self.village, self.ward, self.district)
    }
}

/// Generate a fresh server-side identifier.
#[cfg(feature = "uuid-support")]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntendedUse {
    #[default]
    Residential,
    Commercial,
    Agricultural,
    Industrial,
    Mixed,
}

impl IntendedUse {
    pub const ALL: [IntendedUse; 5] = [
        IntendedUse::Residential,
        IntendedUse::Commercial,
        IntendedUse::Agricultural,
        IntendedUse::Industrial,
        IntendedUse::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntendedUse::Residential => "residential",
            IntendedUse::Commercial => "commercial",
            IntendedUse::Agricultural => "agricultural",
            IntendedUse::Industrial => "industrial",
            IntendedUse::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Option<IntendedUse> {
        IntendedUse::ALL.into_iter().find(|u| u.as_str() == s)
    }
}

impl std::fmt::Display for IntendedUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("Customer name must be at least 2 characters long")]
    NameTooShort,
    #[error("Customer phone must be at least 10 characters long")]
    PhoneTooShort,
    #[error("Phone number must be a valid Tanzania number")]
    PhoneNotTanzanian,
    #[error("Customer ID number must be at least 5 characters long")]
    IdNumberTooShort,
    #[error("Email address is not valid")]
    InvalidEmail,
}

/// Buyer details submitted against one plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub customer_id_number: String,
    pub intended_use: IntendedUse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderData {
    /// Check every field and return the normalised order: trimmed strings,
    /// phone without spaces or dashes, blank optionals turned into `None`.
    pub fn validated(self) -> Result<OrderData, OrderValidationError> {
        let customer_name = self.customer_name.trim().to_string();
        if customer_name.chars().count() < 2 {
            return Err(OrderValidationError::NameTooShort);
        }

        let raw_phone = self.customer_phone.trim();
        if raw_phone.chars().count() < 10 {
            return Err(OrderValidationError::PhoneTooShort);
        }
        let customer_phone: String = raw_phone
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect();
        if !(customer_phone.starts_with("+255")
            || customer_phone.starts_with("255")
            || customer_phone.starts_with('0'))
        {
            return Err(OrderValidationError::PhoneNotTanzanian);
        }

        let customer_id_number = self.customer_id_number.trim().to_string();
        if customer_id_number.chars().count() < 5 {
            return Err(OrderValidationError::IdNumberTooShort);
        }

        let customer_email = non_blank(self.customer_email);
        if let Some(email) = &customer_email {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                return Err(OrderValidationError::InvalidEmail);
            }
        }

        Ok(OrderData {
            customer_name,
            customer_phone,
            customer_email,
            customer_id_number,
            intended_use: self.intended_use,
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "approved" => Some(OrderStatus::Approved),
            "rejected" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order as stored and returned by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotOrder {
    pub id: String,
    pub plot_id: String,
    #[serde(default)]
    pub plot_code: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub customer_id_number: String,
    pub intended_use: IntendedUse,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<PlotOrder>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_plots: u64,
    pub available_plots: u64,
    pub taken_plots: u64,
    pub pending_plots: u64,
    pub total_orders: u64,
    pub pending_orders: u64,
    pub approved_orders: u64,
    pub rejected_orders: u64,
    pub districts: u64,
    pub wards: u64,
    pub villages: u64,
    pub total_area_hectares: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub database: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Metadata recorded for each imported plot dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetImport {
    pub dataset_name: String,
    #[serde(default)]
    pub source_file: Option<String>,
    /// Attribute name to JSON type (`string`, `number`, `boolean`) seen in
    /// the source features.
    #[serde(default)]
    pub attribute_schema: BTreeMap<String, String>,
    pub feature_count: u64,
    pub imported_at: DateTime<Utc>,
    /// Extent of the imported plots as a GeoJSON Polygon.
    #[serde(default)]
    pub bbox: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportList {
    pub imports: Vec<DatasetImport>,
}

/// Error body the registry sends for non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
