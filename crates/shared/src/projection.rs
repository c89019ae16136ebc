//! Web Mercator projection and the map viewport.
//!
//! World pixel space at zoom `z` is a square of `256 * 2^z` pixels with the
//! origin at the north-west corner (lat 85.0511, lng -180).

use std::f64::consts::PI;

use crate::geometry::{Bounds, LatLng};

pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LAT: f64 = 85.051_128_78;

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Width and height of the world in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2.0_f64.powf(zoom)
}

/// Project geographic coordinates to world pixels.
pub fn project(ll: LatLng, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = ll.lat.clamp(-MAX_LAT, MAX_LAT);
    let x = (ll.lng + 180.0) / 360.0 * size;
    let lat_rad = lat.to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// What the map currently shows: a centre and a fractional zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
}

impl MapView {
    pub const fn new(center: LatLng, zoom: f64) -> Self {
        MapView { center, zoom }
    }

    /// World pixel of the container's top-left corner.
    fn origin(&self, width: f64, height: f64) -> (f64, f64) {
        let (cx, cy) = project(self.center, self.zoom);
        (cx - width / 2.0, cy - height / 2.0)
    }

    /// Container-relative pixel for a geographic point.
    pub fn to_screen(&self, ll: LatLng, width: f64, height: f64) -> (f64, f64) {
        let (ox, oy) = self.origin(width, height);
        let (x, y) = project(ll, self.zoom);
        (x - ox, y - oy)
    }

    /// Geographic point under a container-relative pixel.
    pub fn from_screen(&self, sx: f64, sy: f64, width: f64, height: f64) -> LatLng {
        let (ox, oy) = self.origin(width, height);
        unproject(ox + sx, oy + sy, self.zoom)
    }

    /// Shift the view so content moves by `(dx, dy)` screen pixels.
    pub fn panned(&self, dx: f64, dy: f64) -> MapView {
        let (cx, cy) = project(self.center, self.zoom);
        MapView::new(unproject(cx - dx, cy - dy, self.zoom), self.zoom)
    }

    /// Change zoom while keeping the point under `cursor` fixed on screen.
    pub fn zoomed_at(&self, cursor: (f64, f64), new_zoom: f64, width: f64, height: f64) -> MapView {
        let new_zoom = new_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let anchor = self.from_screen(cursor.0, cursor.1, width, height);
        let (ax, ay) = project(anchor, new_zoom);
        let cx = ax - cursor.0 + width / 2.0;
        let cy = ay - cursor.1 + height / 2.0;
        MapView::new(unproject(cx, cy, new_zoom), new_zoom)
    }

    /// Geographic extent currently visible.
    pub fn visible_bounds(&self, width: f64, height: f64) -> Bounds {
        let nw = self.from_screen(0.0, 0.0, width, height);
        let se = self.from_screen(width, height, width, height);
        Bounds {
            min_lng: nw.lng,
            min_lat: se.lat,
            max_lng: se.lng,
            max_lat: nw.lat,
        }
    }

    /// Largest zoom (in `step` increments) showing all of `bounds` with
    /// `padding` pixels on each side.
    pub fn fit(bounds: &Bounds, width: f64, height: f64, padding: f64, max_zoom: f64) -> MapView {
        let inner_w = (width - 2.0 * padding).max(1.0);
        let inner_h = (height - 2.0 * padding).max(1.0);
        let (x0, y0) = project(LatLng::new(bounds.max_lat, bounds.min_lng), 0.0);
        let (x1, y1) = project(LatLng::new(bounds.min_lat, bounds.max_lng), 0.0);
        let span_x = (x1 - x0).abs().max(f64::EPSILON);
        let span_y = (y1 - y0).abs().max(f64::EPSILON);
        let zoom = (inner_w / span_x).min(inner_h / span_y).log2();
        let zoom = (zoom * 4.0).floor() / 4.0;
        MapView::new(bounds.center(), zoom.clamp(MIN_ZOOM, max_zoom))
    }
}

/// One basemap tile placed in container pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlacement {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl TilePlacement {
    /// Fill a `{z}/{x}/{y}` URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// Tiles covering the container at the view's integer zoom, scaled to the
/// fractional zoom.
pub fn visible_tiles(view: &MapView, width: f64, height: f64) -> Vec<TilePlacement> {
    let z = view.zoom.floor().max(0.0);
    let scale = 2.0_f64.powf(view.zoom - z);
    let size = TILE_SIZE * scale;
    let n = 2.0_f64.powf(z) as i64;

    let (cx, cy) = project(view.center, view.zoom);
    let ox = cx - width / 2.0;
    let oy = cy - height / 2.0;

    let first_x = (ox / size).floor() as i64;
    let last_x = ((ox + width) / size).floor() as i64;
    let first_y = ((oy / size).floor() as i64).max(0);
    let last_y = (((oy + height) / size).floor() as i64).min(n - 1);

    let mut tiles = Vec::new();
    for ty in first_y..=last_y {
        for tx in first_x..=last_x {
            // Wrap horizontally around the antimeridian
            let wrapped = tx.rem_euclid(n);
            tiles.push(TilePlacement {
                x: wrapped as u32,
                y: ty as u32,
                z: z as u32,
                left: tx as f64 * size - ox,
                top: ty as f64 * size - oy,
                size,
            });
        }
    }
    tiles
}
