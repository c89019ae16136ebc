//! Planar helpers over plot geometries in longitude/latitude degrees.

use serde::{Deserialize, Serialize};

use crate::models::{Geometry, Plot, Ring};

/// Mean Earth radius used by the geodesic area formula, in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

const SQ_METERS_PER_HECTARE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }
}

/// Axis-aligned extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// Tanzania mainland and islands.
pub const TANZANIA: Bounds = Bounds {
    min_lng: 29.34,
    min_lat: -11.75,
    max_lng: 40.44,
    max_lat: -0.95,
};

impl Bounds {
    pub fn from_point(lng: f64, lat: f64) -> Self {
        Bounds {
            min_lng: lng,
            min_lat: lat,
            max_lng: lng,
            max_lat: lat,
        }
    }

    /// Parse `minx,miny,maxx,maxy`.
    pub fn parse_bbox(s: &str) -> Option<Bounds> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            &[min_lng, min_lat, max_lng, max_lat]
                if parts.iter().all(|v| v.is_finite()) && min_lng <= max_lng && min_lat <= max_lat =>
            {
                Some(Bounds {
                    min_lng,
                    min_lat,
                    max_lng,
                    max_lat,
                })
            }
            _ => None,
        }
    }

    pub fn extend(&mut self, lng: f64, lat: f64) {
        self.min_lng = self.min_lng.min(lng);
        self.min_lat = self.min_lat.min(lat);
        self.max_lng = self.max_lng.max(lng);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lng: self.min_lng.min(other.min_lng),
            min_lat: self.min_lat.min(other.min_lat),
            max_lng: self.max_lng.max(other.max_lng),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    pub fn span_lng(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn span_lat(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Zero-area or non-finite extents cannot be fitted to.
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.span_lng() <= 0.0 || self.span_lat() <= 0.0
    }

    pub fn contains(&self, ll: LatLng) -> bool {
        ll.lng >= self.min_lng && ll.lng <= self.max_lng && ll.lat >= self.min_lat && ll.lat <= self.max_lat
    }

    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_lng >= self.min_lng
            && other.max_lng <= self.max_lng
            && other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// Grow each side by `fraction` of the span on that axis.
    pub fn pad(&self, fraction: f64) -> Bounds {
        let dx = self.span_lng() * fraction;
        let dy = self.span_lat() * fraction;
        Bounds {
            min_lng: self.min_lng - dx,
            min_lat: self.min_lat - dy,
            max_lng: self.max_lng + dx,
            max_lat: self.max_lat + dy,
        }
    }

    /// Closed rectangle ring, counter-clockwise from the south-west corner.
    pub fn to_polygon(&self) -> Geometry {
        Geometry::Polygon {
            coordinates: vec![vec![
                vec![self.min_lng, self.min_lat],
                vec![self.max_lng, self.min_lat],
                vec![self.max_lng, self.max_lat],
                vec![self.min_lng, self.max_lat],
                vec![self.min_lng, self.min_lat],
            ]],
        }
    }
}

/// Extent of every position in a geometry.
pub fn geometry_bounds(geometry: &Geometry) -> Option<Bounds> {
    let polygons = geometry.to_multi_polygon();
    let mut bounds: Option<Bounds> = None;
    for pos in polygons.iter().flatten().flatten() {
        if pos.len() < 2 {
            continue;
        }
        match bounds.as_mut() {
            Some(b) => b.extend(pos[0], pos[1]),
            None => bounds = Some(Bounds::from_point(pos[0], pos[1])),
        }
    }
    bounds
}

/// Combined extent of a set of plots.
pub fn plots_extent<'a>(plots: impl IntoIterator<Item = &'a Plot>) -> Option<Bounds> {
    plots
        .into_iter()
        .filter_map(|p| geometry_bounds(&p.geometry))
        .reduce(|a, b| a.union(&b))
}

/// Even-odd test of a point against one ring.
fn ring_contains(ring: &Ring, lng: f64, lat: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > lat) != (yj > lat) && lng < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether the point lies inside any polygon, respecting holes.
pub fn geometry_contains(geometry: &Geometry, ll: LatLng) -> bool {
    geometry.to_multi_polygon().iter().any(|rings| {
        let Some((outer, holes)) = rings.split_first() else {
            return false;
        };
        ring_contains(outer, ll.lng, ll.lat)
            && !holes.iter().any(|hole| ring_contains(hole, ll.lng, ll.lat))
    })
}

/// Signed spherical area of one ring in square meters.
fn ring_area_m2(ring: &Ring) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        let p1 = &ring[i];
        let p2 = &ring[(i + 1) % n];
        total += (p2[0] - p1[0]).to_radians()
            * (2.0 + p1[1].to_radians().sin() + p2[1].to_radians().sin());
    }
    total * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0
}

/// Geodesic area of a geometry in hectares, rounded to 4 decimal places.
pub fn geodesic_area_hectares(geometry: &Geometry) -> f64 {
    let m2: f64 = geometry
        .to_multi_polygon()
        .iter()
        .map(|rings| {
            let Some((outer, holes)) = rings.split_first() else {
                return 0.0;
            };
            let holes_m2: f64 = holes.iter().map(|h| ring_area_m2(h).abs()).sum();
            (ring_area_m2(outer).abs() - holes_m2).max(0.0)
        })
        .sum();
    (m2 / SQ_METERS_PER_HECTARE * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_polygon_round_trips_extent() {
        let b = Bounds {
            min_lng: 37.0,
            min_lat: -7.0,
            max_lng: 37.5,
            max_lat: -6.5,
        };
        let polygon = b.to_polygon();
        assert_eq!(geometry_bounds(&polygon), Some(b));
        match polygon {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates[0].len(), 5);
                assert_eq!(coordinates[0].first(), coordinates[0].last());
            }
            other => panic!("expected Polygon, got {}", other.kind()),
        }
    }

    fn square(lng: f64, lat: f64, size: f64) -> Ring {
        vec![
            vec![lng, lat],
            vec![lng + size, lat],
            vec![lng + size, lat + size],
            vec![lng, lat + size],
            vec![lng, lat],
        ]
    }

    #[test]
    fn test_parse_bbox() {
        let b = Bounds::parse_bbox("37.0, -7.0, 38.0, -6.0").unwrap();
        assert_eq!(b.min_lng, 37.0);
        assert_eq!(b.max_lat, -6.0);
        assert!(Bounds::parse_bbox("37,-7,38").is_none());
        assert!(Bounds::parse_bbox("a,b,c,d").is_none());
        assert!(Bounds::parse_bbox("38,-7,37,-6").is_none());
    }

    #[test]
    fn test_geometry_bounds_multi() {
        let g = Geometry::MultiPolygon {
            coordinates: vec![vec![square(37.0, -7.0, 0.1)], vec![square(37.5, -6.5, 0.1)]],
        };
        let b = geometry_bounds(&g).unwrap();
        assert!((b.min_lng - 37.0).abs() < 1e-12);
        assert!((b.max_lng - 37.6).abs() < 1e-12);
        assert!((b.min_lat - -7.0).abs() < 1e-12);
        assert!((b.max_lat - -6.4).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_extent_is_degenerate() {
        let b = Bounds::from_point(37.0, -6.0);
        assert!(b.is_degenerate());
        let mut b = b;
        b.extend(37.01, -6.01);
        assert!(!b.is_degenerate());
    }

    #[test]
    fn test_contains_point_with_hole() {
        let g = Geometry::Polygon {
            coordinates: vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)],
        };
        assert!(geometry_contains(&g, LatLng::new(1.0, 1.0)));
        assert!(!geometry_contains(&g, LatLng::new(5.0, 5.0)));
        assert!(!geometry_contains(&g, LatLng::new(11.0, 1.0)));
    }

    #[test]
    fn test_intersects_and_contains_bounds() {
        let a = Bounds::parse_bbox("0,0,10,10").unwrap();
        let b = Bounds::parse_bbox("5,5,15,15").unwrap();
        let c = Bounds::parse_bbox("20,20,30,30").unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(TANZANIA.contains_bounds(&Bounds::parse_bbox("37,-7,37.1,-6.9").unwrap()));
        assert!(!TANZANIA.contains_bounds(&a));
    }

    #[test]
    fn test_geodesic_area_near_equator() {
        // 0.01° square at the equator is roughly 1.113km x 1.113km = ~123.9 ha
        let g = Geometry::Polygon {
            coordinates: vec![square(0.0, 0.0, 0.01)],
        };
        let ha = geodesic_area_hectares(&g);
        assert!(ha > 120.0 && ha < 128.0, "got {ha}");
    }

    #[test]
    fn test_geodesic_area_subtracts_holes() {
        let solid = Geometry::Polygon {
            coordinates: vec![square(37.0, -6.0, 0.01)],
        };
        let holed = Geometry::Polygon {
            coordinates: vec![square(37.0, -6.0, 0.01), square(37.002, -5.998, 0.005)],
        };
        assert!(geodesic_area_hectares(&holed) < geodesic_area_hectares(&solid));
    }

    #[test]
    fn test_pad_grows_each_side() {
        let b = Bounds::parse_bbox("0,0,10,20").unwrap().pad(0.1);
        assert_eq!(b.min_lng, -1.0);
        assert_eq!(b.max_lat, 22.0);
    }
}
