//! Built-in plots shown when the registry is unreachable during development.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{Geometry, Plot, PlotStatus};

const DISTRICT: &str = "Kilosa";
const WARD: &str = "Mbuyuni";
const VILLAGE: &str = "Mbuyuni";

/// 2024-01-15T08:00:00Z
const SEEDED_AT: i64 = 1_705_305_600;

/// South-west corner of the first plot and the plot edge length, in degrees.
const ORIGIN: (f64, f64) = (37.0500, -7.2000);
const EDGE: f64 = 0.0020;

const STATUSES: [PlotStatus; 5] = [
    PlotStatus::Available,
    PlotStatus::Taken,
    PlotStatus::Available,
    PlotStatus::Pending,
    PlotStatus::Available,
];

const AREAS: [f64; 5] = [4.9, 5.2, 4.7, 5.0, 4.8];

fn plot_square(column: usize) -> Geometry {
    let west = ORIGIN.0 + column as f64 * (EDGE + 0.0002);
    let east = west + EDGE;
    let south = ORIGIN.1;
    let north = south + EDGE;
    Geometry::Polygon {
        coordinates: vec![vec![
            vec![west, south],
            vec![east, south],
            vec![east, north],
            vec![west, north],
            vec![west, south],
        ]],
    }
}

/// Five adjacent plots with ids `"1"` to `"5"`.
pub fn sample_plots() -> Vec<Plot> {
    let seeded_at = DateTime::<Utc>::from_timestamp(SEEDED_AT, 0).unwrap_or_default();
    STATUSES
        .iter()
        .zip(AREAS)
        .enumerate()
        .map(|(i, (status, area))| Plot {
            id: (i + 1).to_string(),
            plot_code: format!("MBY-{:03}", i + 1),
            status: *status,
            area_hectares: area,
            district: DISTRICT.to_string(),
            ward: WARD.to_string(),
            village: VILLAGE.to_string(),
            geometry: plot_square(i),
            attributes: BTreeMap::new(),
            created_at: seeded_at,
            updated_at: seeded_at,
        })
        .collect()
}
