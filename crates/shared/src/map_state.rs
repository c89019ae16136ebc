//! Map surface lifecycle, plot overlay and loaded-plot state.
//!
//! Everything here is independent of the DOM. The frontend owns one
//! [`MapSurface`] per mounted map and one [`PlotStore`] per page, and feeds
//! browser events into them.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::ApiError;
use crate::geometry::{geometry_bounds, geometry_contains, plots_extent, Bounds, LatLng, TANZANIA};
use crate::loader::{PlotLoad, PlotSource};
use crate::models::{Plot, PlotStatus, Ring};
use crate::projection::{MapView, MAX_ZOOM};

/// Regional view used when the plots cannot be fitted.
pub const DEFAULT_CENTER: LatLng = LatLng::new(-6.369, 34.8888);
pub const DEFAULT_ZOOM: f64 = 6.0;

/// Fraction of the region span the view centre may stray outside the region.
pub const OVERSCROLL: f64 = 0.25;

/// Plot extents wider than this (degrees, either axis) are not fitted.
pub const MAX_FIT_SPAN_DEG: f64 = 2.0;

const FIT_PADDING_PX: f64 = 32.0;
const FIT_MAX_ZOOM: f64 = 18.0;

pub fn default_view() -> MapView {
    MapView::new(DEFAULT_CENTER, DEFAULT_ZOOM)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DataState {
    #[default]
    Empty,
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map surface is already initialized")]
    AlreadyInitialized,
    #[error("map surface is not ready")]
    NotReady,
    #[error("map container has no size")]
    ZeroSizedContainer,
}

/// Limits applied to user-driven view changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConstraints {
    pub region: Bounds,
    pub overscroll: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ViewConstraints {
    fn default() -> Self {
        ViewConstraints {
            region: TANZANIA,
            overscroll: OVERSCROLL,
            min_zoom: 5.0,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl ViewConstraints {
    pub fn clamp(&self, view: MapView) -> MapView {
        let allowed = self.region.pad(self.overscroll);
        MapView::new(
            LatLng::new(
                view.center.lat.clamp(allowed.min_lat, allowed.max_lat),
                view.center.lng.clamp(allowed.min_lng, allowed.max_lng),
            ),
            view.zoom.clamp(self.min_zoom, self.max_zoom),
        )
    }
}

/// Whether an extent is small enough to zoom the map onto.
pub fn is_compact(extent: &Bounds) -> bool {
    !extent.is_degenerate()
        && extent.span_lng() <= MAX_FIT_SPAN_DEG
        && extent.span_lat() <= MAX_FIT_SPAN_DEG
}

/// View for freshly rendered plots: fit a compact extent, else the regional
/// default.
pub fn initial_view(extent: Option<Bounds>, width: f64, height: f64) -> MapView {
    match extent {
        Some(b) if is_compact(&b) => MapView::fit(&b, width, height, FIT_PADDING_PX, FIT_MAX_ZOOM),
        _ => default_view(),
    }
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

/// Which statuses the overlay draws. Unknown statuses are always drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFilter {
    pub available: bool,
    pub taken: bool,
    pub pending: bool,
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter {
            available: true,
            taken: true,
            pending: true,
        }
    }
}

impl StatusFilter {
    pub fn allows(&self, status: PlotStatus) -> bool {
        match status {
            PlotStatus::Available => self.available,
            PlotStatus::Taken => self.taken,
            PlotStatus::Pending => self.pending,
            PlotStatus::Unknown => true,
        }
    }

    pub fn toggled(mut self, status: PlotStatus) -> Self {
        match status {
            PlotStatus::Available => self.available = !self.available,
            PlotStatus::Taken => self.taken = !self.taken,
            PlotStatus::Pending => self.pending = !self.pending,
            PlotStatus::Unknown => {}
        }
        self
    }
}

/// Invoked with the plot the user picked on the map.
pub type SelectHandler = Rc<dyn Fn(Plot)>;

/// One drawable plot.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayShape {
    pub plot: Plot,
    /// Always MultiPolygon-shaped, coordinates as received.
    pub polygons: Vec<Vec<Ring>>,
    pub bounds: Bounds,
}

impl OverlayShape {
    fn contains(&self, ll: LatLng) -> bool {
        self.bounds.contains(ll) && geometry_contains(&self.plot.geometry, ll)
    }
}

/// All drawable plots for one plot set, plus the selection callback.
pub struct OverlayLayer {
    shapes: Vec<OverlayShape>,
    extent: Option<Bounds>,
    on_select: SelectHandler,
}

impl OverlayLayer {
    pub fn build(plots: &[Plot], filter: &StatusFilter, on_select: SelectHandler) -> Self {
        let shapes: Vec<OverlayShape> = plots
            .iter()
            .filter(|p| filter.allows(p.status))
            .filter_map(|p| {
                let bounds = geometry_bounds(&p.geometry)?;
                Some(OverlayShape {
                    plot: p.clone(),
                    polygons: p.geometry.to_multi_polygon(),
                    bounds,
                })
            })
            .collect();
        let extent = plots_extent(shapes.iter().map(|s| &s.plot));
        OverlayLayer {
            shapes,
            extent,
            on_select,
        }
    }

    pub fn shapes(&self) -> &[OverlayShape] {
        &self.shapes
    }

    pub fn extent(&self) -> Option<Bounds> {
        self.extent
    }

    /// Topmost shape under the point. Later shapes are drawn on top.
    pub fn hit_test(&self, ll: LatLng) -> Option<&OverlayShape> {
        self.shapes.iter().rev().find(|s| s.contains(ll))
    }

    /// Handle a click at `ll`. Fires the select callback only when the plot
    /// under the pointer is currently available in `current`.
    pub fn click(&self, ll: LatLng, current: &[Plot]) -> bool {
        let Some(shape) = self.hit_test(ll) else {
            return false;
        };
        match resolve_click(current, &shape.plot.id) {
            Some(plot) => {
                (self.on_select)(plot.clone());
                true
            }
            None => {
                tracing::debug!(plot_id = %shape.plot.id, "ignoring click on unavailable plot");
                false
            }
        }
    }
}

/// The plot a click on `plot_id` should open the order form for, if any.
pub fn resolve_click<'a>(plots: &'a [Plot], plot_id: &str) -> Option<&'a Plot> {
    plots.iter().find(|p| p.id == plot_id).filter(|p| p.is_available())
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Map widget state. `L` is whatever handle keeps a window listener attached;
/// dropping it detaches the listener.
pub struct MapSurface<L> {
    state: SurfaceState,
    view: MapView,
    size: (f64, f64),
    constraints: ViewConstraints,
    overlay: Option<OverlayLayer>,
    listeners: Vec<L>,
}

impl<L> Default for MapSurface<L> {
    fn default() -> Self {
        MapSurface::new(ViewConstraints::default())
    }
}

impl<L> MapSurface<L> {
    pub fn new(constraints: ViewConstraints) -> Self {
        MapSurface {
            state: SurfaceState::Uninitialized,
            view: default_view(),
            size: (0.0, 0.0),
            constraints,
            overlay: None,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::Ready
    }

    pub fn begin_init(&mut self) -> Result<(), MapError> {
        if self.state != SurfaceState::Uninitialized {
            return Err(MapError::AlreadyInitialized);
        }
        self.state = SurfaceState::Initializing;
        Ok(())
    }

    /// Complete initialization once the container has been measured.
    pub fn finish_init(&mut self, width: f64, height: f64) -> Result<(), MapError> {
        if self.state != SurfaceState::Initializing {
            return Err(MapError::NotReady);
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(MapError::ZeroSizedContainer);
        }
        self.size = (width, height);
        self.view = default_view();
        self.state = SurfaceState::Ready;
        tracing::debug!(width, height, "map surface ready");
        Ok(())
    }

    pub fn initialize(&mut self, width: f64, height: f64) -> Result<(), MapError> {
        self.begin_init()?;
        self.finish_init(width, height)
    }

    pub fn register_listener(&mut self, listener: L) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.size = (width, height);
        }
    }

    /// Apply a user-driven view, clamped to the region.
    pub fn set_view(&mut self, view: MapView) {
        self.view = self.constraints.clamp(view);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.set_view(self.view.panned(dx, dy));
    }

    pub fn zoom_at(&mut self, cursor: (f64, f64), zoom: f64) {
        let (w, h) = self.size;
        self.set_view(self.view.zoomed_at(cursor, zoom, w, h));
    }

    pub fn reset_view(&mut self) {
        self.view = default_view();
    }

    /// Swap in a new overlay. The previous layer is dropped first.
    pub fn replace_overlay(&mut self, layer: OverlayLayer) -> Result<(), MapError> {
        if self.state == SurfaceState::Uninitialized {
            return Err(MapError::NotReady);
        }
        if let Some(old) = self.overlay.take() {
            tracing::trace!(shapes = old.shapes.len(), "removing previous overlay");
        }
        self.overlay = Some(layer);
        Ok(())
    }

    pub fn overlay(&self) -> Option<&OverlayLayer> {
        self.overlay.as_ref()
    }

    /// Fit the view to the overlay when its extent is compact, otherwise fall
    /// back to the regional default. Returns whether it fitted.
    pub fn fit_to_overlay(&mut self) -> bool {
        let extent = self.overlay.as_ref().and_then(OverlayLayer::extent);
        let fitted = extent.is_some_and(|b| is_compact(&b));
        let (w, h) = self.size;
        self.view = initial_view(extent, w, h);
        fitted
    }

    pub fn hit_test(&self, ll: LatLng) -> Option<&OverlayShape> {
        self.overlay.as_ref()?.hit_test(ll)
    }

    /// Handle a click at container pixel `(sx, sy)`.
    pub fn click_at(&self, sx: f64, sy: f64, current: &[Plot]) -> bool {
        let (w, h) = self.size;
        let ll = self.view.from_screen(sx, sy, w, h);
        self.overlay
            .as_ref()
            .is_some_and(|layer| layer.click(ll, current))
    }

    /// Release the overlay and detach every listener. The surface can be
    /// initialized again afterwards.
    pub fn teardown(&mut self) -> usize {
        let detached = self.listeners.len();
        self.listeners.clear();
        self.overlay = None;
        self.state = SurfaceState::Uninitialized;
        tracing::debug!(detached, "map surface torn down");
        detached
    }
}

// ---------------------------------------------------------------------------
// Loaded plots
// ---------------------------------------------------------------------------

/// Identifies one plot load; only the latest one may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub available: usize,
    pub taken: usize,
    pub pending: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn get(&self, status: PlotStatus) -> usize {
        match status {
            PlotStatus::Available => self.available,
            PlotStatus::Taken => self.taken,
            PlotStatus::Pending => self.pending,
            PlotStatus::Unknown => self.unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotStore {
    plots: Vec<Plot>,
    data: DataState,
    source: Option<PlotSource>,
    generation: u64,
}

impl PlotStore {
    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    pub fn data_state(&self) -> &DataState {
        &self.data
    }

    pub fn source(&self) -> Option<PlotSource> {
        self.source
    }

    pub fn get(&self, id: &str) -> Option<&Plot> {
        self.plots.iter().find(|p| p.id == id)
    }

    /// Start a load, superseding any load still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.data = DataState::Loading;
        LoadTicket(self.generation)
    }

    /// Land a load result. Results for superseded tickets are discarded and
    /// `false` is returned.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<PlotLoad, ApiError>) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale plot load"
            );
            return false;
        }
        match result {
            Ok(load) => {
                self.data = if load.plots.is_empty() {
                    DataState::Empty
                } else {
                    DataState::Loaded
                };
                self.source = Some(load.source);
                self.plots = load.plots;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load plots");
                self.data = DataState::Error(err.user_message());
            }
        }
        true
    }

    /// Local update after a successful order. Returns whether the plot was
    /// found.
    pub fn mark_pending(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.plots.iter_mut().find(|p| p.id == id) {
            Some(plot) => {
                plot.status = PlotStatus::Pending;
                plot.updated_at = now;
                true
            }
            None => false,
        }
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for plot in &self.plots {
            match plot.status {
                PlotStatus::Available => counts.available += 1,
                PlotStatus::Taken => counts.taken += 1,
                PlotStatus::Pending => counts.pending += 1,
                PlotStatus::Unknown => counts.unknown += 1,
            }
        }
        counts
    }
}
