use std::rc::Rc;

use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use plotmap_shared::geometry::Bounds;
use plotmap_shared::map_state::{MapSurface, OverlayLayer, OverlayShape, PlotStore, SelectHandler, StatusFilter};
use plotmap_shared::models::{Plot, Ring};
use plotmap_shared::projection::{visible_tiles, MapView};
use plotmap_shared::style::effective_style;
use wasm_bindgen::JsCast;

use crate::listeners::WindowListener;

const MAP_CONTAINER_ID: &str = "plot-map-container";

/// Drag threshold in pixels. Movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Touch drag threshold in pixels.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

/// Layout may not be done on the first effect run; poll roughly once a frame.
const MOUNT_ATTEMPTS: u32 = 120;
const MOUNT_RETRY_MS: u32 = 16;

const WHEEL_ZOOM_STEP: f64 = 0.5;
const KEY_ZOOM_STEP: f64 = 1.0;

const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

type Surface = MapSurface<WindowListener>;

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Get the bounding client rect of the map container element.
fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

/// Client coordinates relative to the map container.
fn to_container(client_x: f64, client_y: f64) -> Option<(f64, f64)> {
    let rect = container_rect()?;
    Some((client_x - rect.left(), client_y - rect.top()))
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Container size, if the container has been laid out.
fn usable_size(width: f64, height: f64) -> Option<(f64, f64)> {
    (width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0).then_some((width, height))
}

/// Bring the surface to Ready and register its window listeners.
fn mount_surface(mut surface: Signal<Surface>, width: f64, height: f64, on_escape: EventHandler<()>) -> bool {
    let resize = WindowListener::attach("resize", move |_| {
        if let Some((w, h)) = container_rect().and_then(|r| usable_size(r.width(), r.height())) {
            surface.write().resize(w, h);
        }
    });
    let keydown = WindowListener::attach("keydown", move |evt| handle_key(evt, surface, on_escape));

    let mut s = surface.write();
    if let Err(err) = s.finish_init(width, height) {
        tracing::warn!(%err, "map surface initialization failed");
        return false;
    }
    for listener in [resize, keydown].into_iter().flatten() {
        s.register_listener(listener);
    }
    true
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyAction {
    ZoomIn,
    ZoomOut,
    Reset,
    Escape,
}

fn key_action(key: &str) -> Option<KeyAction> {
    match key {
        "+" | "=" => Some(KeyAction::ZoomIn),
        "-" | "_" => Some(KeyAction::ZoomOut),
        "0" | "r" | "R" => Some(KeyAction::Reset),
        "Escape" => Some(KeyAction::Escape),
        _ => None,
    }
}

/// Keys typed into form fields must not move the map.
fn is_text_entry(tag_name: &str) -> bool {
    matches!(tag_name.to_ascii_uppercase().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
}

fn event_target_tag(evt: &web_sys::Event) -> Option<String> {
    let element = evt.target()?.dyn_into::<web_sys::Element>().ok()?;
    Some(element.tag_name())
}

fn handle_key(evt: web_sys::Event, mut surface: Signal<Surface>, on_escape: EventHandler<()>) {
    let Some(key_evt) = evt.dyn_ref::<web_sys::KeyboardEvent>() else {
        return;
    };
    let Some(action) = key_action(&key_evt.key()) else {
        return;
    };
    if action != KeyAction::Escape && event_target_tag(&evt).is_some_and(|t| is_text_entry(&t)) {
        return;
    }
    let mut s = surface.write();
    let (w, h) = s.size();
    let center = (w / 2.0, h / 2.0);
    let zoom = s.view().zoom;
    match action {
        KeyAction::ZoomIn => s.zoom_at(center, zoom + KEY_ZOOM_STEP),
        KeyAction::ZoomOut => s.zoom_at(center, zoom - KEY_ZOOM_STEP),
        KeyAction::Reset => {
            s.fit_to_overlay();
        }
        KeyAction::Escape => {
            drop(s);
            on_escape.call(());
        }
    }
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

fn ring_path(ring: &Ring, view: &MapView, width: f64, height: f64) -> String {
    let mut d = String::with_capacity(ring.len() * 16);
    for (i, pos) in ring.iter().enumerate() {
        let (x, y) = view.to_screen(
            plotmap_shared::geometry::LatLng::new(pos[1], pos[0]),
            width,
            height,
        );
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&format!("{x:.1},{y:.1}"));
    }
    d.push('Z');
    d
}

/// Escape text for use inside a double-quoted XML attribute.
fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn shape_path(svg: &mut String, shape: &OverlayShape, view: &MapView, width: f64, height: f64, hovered: bool) {
    let d: String = shape
        .polygons
        .iter()
        .flatten()
        .map(|ring| ring_path(ring, view, width, height))
        .collect();
    let style = effective_style(shape.plot.status, hovered);
    svg.push_str(&format!(
        r#"<path data-plot-id="{}" d="{d}" fill-rule="evenodd" {}/>"#,
        escape_attr(&shape.plot.id),
        style.svg_attributes()
    ));
}

/// Build the overlay SVG for the shapes intersecting the visible area.
/// The hovered plot is drawn last so its outline sits on top.
fn build_overlay_svg(
    shapes: &[OverlayShape],
    view: &MapView,
    width: f64,
    height: f64,
    hovered: Option<&str>,
) -> String {
    let visible: Bounds = view.visible_bounds(width, height);
    let mut svg = String::with_capacity(8192);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" style="position:absolute;top:0;left:0;pointer-events:none;z-index:5;">"#
    ));
    let mut hovered_shape = None;
    for shape in shapes.iter().filter(|s| s.bounds.intersects(&visible)) {
        if Some(shape.plot.id.as_str()) == hovered {
            hovered_shape = Some(shape);
            continue;
        }
        shape_path(&mut svg, shape, view, width, height, false);
    }
    if let Some(shape) = hovered_shape {
        shape_path(&mut svg, shape, view, width, height, true);
    }
    svg.push_str("</svg>");
    svg
}

fn format_area(hectares: f64) -> String {
    format!("{hectares:.2} ha")
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Interactive plot map: raster basemap, plot overlay, hover tooltip.
///
/// `on_select` fires only for plots that are currently available.
/// `fit_generation` changes whenever a fresh plot load lands, which refits
/// the view to the loaded plots.
#[component]
pub fn PlotMap(
    store: Signal<PlotStore>,
    filter: Signal<StatusFilter>,
    tile_url: String,
    fit_generation: ReadSignal<u64>,
    on_select: EventHandler<Plot>,
    on_escape: EventHandler<()>,
) -> Element {
    let mut surface = use_signal(|| {
        let mut s = Surface::default();
        // Container size is known only after mount
        let _ = s.begin_init();
        s
    });
    let mut fitted_generation = use_signal(|| None::<u64>);
    let mut hovered = use_signal(|| None::<String>);
    let mut pointer = use_signal(|| (0.0_f64, 0.0_f64));

    // Drag state (mouse)
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start = use_signal(|| (0.0_f64, 0.0_f64));
    let mut drag_start_view = use_signal(|| None::<MapView>);

    // Touch state
    let mut touch_start_pos = use_signal(|| None::<(f64, f64)>);
    let mut touch_did_pan = use_signal(|| false);
    let mut is_pinching = use_signal(|| false);
    let mut pinch_start_distance = use_signal(|| 0.0_f64);
    let mut pinch_midpoint = use_signal(|| (0.0_f64, 0.0_f64));

    // Measure the container once it has been laid out, then attach window listeners.
    use_effect(move || {
        spawn(async move {
            for _ in 0..MOUNT_ATTEMPTS {
                let measured = container_rect().and_then(|r| usable_size(r.width(), r.height()));
                if let Some((width, height)) = measured {
                    if !mount_surface(surface, width, height, on_escape) {
                        return;
                    }
                    let mut s = surface.write();
                    if s.overlay().is_some() {
                        s.fit_to_overlay();
                        fitted_generation.set(Some(*fit_generation.peek()));
                    }
                    return;
                }
                gloo_timers::future::TimeoutFuture::new(MOUNT_RETRY_MS).await;
            }
            tracing::warn!("map container never got a usable size");
        });
    });

    // Rebuild the overlay whenever the plots or the filter change.
    use_effect(move || {
        let plots = store.read().plots().to_vec();
        let current_filter = *filter.read();
        let generation = *fit_generation.read();
        let handler: SelectHandler = Rc::new(move |plot: Plot| on_select.call(plot));
        let layer = OverlayLayer::build(&plots, &current_filter, handler);

        let mut s = surface.write();
        if let Err(err) = s.replace_overlay(layer) {
            tracing::warn!(%err, "overlay not applied");
            return;
        }
        if s.is_ready() && *fitted_generation.peek() != Some(generation) {
            s.fit_to_overlay();
            fitted_generation.set(Some(generation));
        }
    });

    use_drop(move || {
        if let Ok(mut s) = surface.try_write() {
            s.teardown();
        }
    });

    let svg_html = use_memo(move || {
        let s = surface.read();
        let (w, h) = s.size();
        let hovered_id = hovered.read();
        match s.overlay() {
            Some(layer) if w > 0.0 && h > 0.0 => {
                build_overlay_svg(layer.shapes(), &s.view(), w, h, hovered_id.as_deref())
            }
            _ => String::new(),
        }
    });

    let s = surface.read();
    let view = s.view();
    let (width, height) = s.size();
    let tiles: Vec<(String, String, String)> = if width > 0.0 && height > 0.0 {
        visible_tiles(&view, width, height)
            .into_iter()
            .map(|t| {
                (
                    format!("{}/{}/{}/{}", t.z, t.x, t.y, t.left),
                    t.url(&tile_url),
                    format!(
                        "left:{}px;top:{}px;width:{}px;height:{}px;",
                        t.left, t.top, t.size, t.size
                    ),
                )
            })
            .collect()
    } else {
        Vec::new()
    };

    let hovered_plot = hovered
        .read()
        .as_deref()
        .and_then(|id| s.overlay()?.shapes().iter().find(|sh| sh.plot.id == id))
        .map(|sh| sh.plot.clone());
    drop(s);

    let dragging = *is_dragging.read();
    let container_class = if dragging {
        "map-container dragging"
    } else if hovered_plot.as_ref().is_some_and(Plot::is_available) {
        "map-container clickable"
    } else {
        "map-container"
    };
    let (pointer_x, pointer_y) = *pointer.read();
    let tooltip = hovered_plot.map(|plot| {
        (
            format!("left:{}px;top:{}px;", pointer_x + 14.0, pointer_y + 14.0),
            plot.plot_code.clone(),
            format!("status-dot status-{}", plot.status),
            format!("{} · {}", plot.status.label(), format_area(plot.area_hectares)),
            plot.location(),
        )
    });

    // Hover tracking and clicks go through the same hit test
    let mut update_hover = move |x: f64, y: f64| {
        let s = surface.read();
        let (w, h) = s.size();
        let ll = s.view().from_screen(x, y, w, h);
        let id = s.hit_test(ll).map(|shape| shape.plot.id.clone());
        drop(s);
        if *hovered.peek() != id {
            hovered.set(id);
        }
        pointer.set((x, y));
    };
    let click_at = move |x: f64, y: f64| {
        let store = store.read();
        surface.read().click_at(x, y, store.plots());
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let delta_y = wheel_delta_y(evt.data().delta());
                if delta_y == 0.0 {
                    return;
                }
                let client = evt.data().client_coordinates();
                let Some(cursor) = to_container(client.x, client.y) else { return };
                let step = if delta_y < 0.0 { WHEEL_ZOOM_STEP } else { -WHEEL_ZOOM_STEP };
                let zoom = surface.read().view().zoom;
                surface.write().zoom_at(cursor, zoom + step);
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                is_dragging.set(true);
                did_drag.set(false);
                drag_start.set((client.x, client.y));
                drag_start_view.set(Some(surface.read().view()));
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                if !*is_dragging.read() {
                    if let Some((x, y)) = to_container(client.x, client.y) {
                        update_hover(x, y);
                    }
                    return;
                }
                let (sx, sy) = *drag_start.read();
                let dx = client.x - sx;
                let dy = client.y - sy;
                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                    hovered.set(None);
                }
                if *did_drag.read() {
                    if let Some(start) = *drag_start_view.read() {
                        surface.write().set_view(start.panned(dx, dy));
                    }
                }
            },

            onmouseup: move |evt: Event<MouseData>| {
                let was_dragging = *is_dragging.read();
                let was_drag = *did_drag.read();
                is_dragging.set(false);

                // A mouseup without drag movement = a click
                if was_dragging && !was_drag {
                    let client = evt.client_coordinates();
                    if let Some((x, y)) = to_container(client.x, client.y) {
                        click_at(x, y);
                    }
                }
            },

            onmouseleave: move |_| {
                is_dragging.set(false);
                hovered.set(None);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                surface.write().fit_to_overlay();
            },

            // --- Touch event handlers ---

            ontouchstart: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let t = &touches[0];
                    touch_start_pos.set(Some((t.client_coordinates().x, t.client_coordinates().y)));
                    touch_did_pan.set(false);
                    drag_start_view.set(Some(surface.read().view()));
                } else if touches.len() >= 2 {
                    let p0 = (touches[0].client_coordinates().x, touches[0].client_coordinates().y);
                    let p1 = (touches[1].client_coordinates().x, touches[1].client_coordinates().y);
                    is_pinching.set(true);
                    pinch_start_distance.set(point_distance(p0, p1));
                    pinch_midpoint.set(((p0.0 + p1.0) / 2.0, (p0.1 + p1.1) / 2.0));
                    drag_start_view.set(Some(surface.read().view()));
                    // Cancel any tap tracking
                    touch_start_pos.set(None);
                    touch_did_pan.set(true);
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                let Some(start_view) = *drag_start_view.read() else { return };

                if *is_pinching.read() && touches.len() >= 2 {
                    let p0 = (touches[0].client_coordinates().x, touches[0].client_coordinates().y);
                    let p1 = (touches[1].client_coordinates().x, touches[1].client_coordinates().y);
                    let start_d = *pinch_start_distance.read();
                    if start_d < 1.0 {
                        return;
                    }
                    let new_zoom = start_view.zoom + (point_distance(p0, p1) / start_d).log2();
                    let mid = *pinch_midpoint.read();
                    let Some(cursor) = to_container(mid.0, mid.1) else { return };
                    let (w, h) = surface.read().size();
                    surface.write().set_view(start_view.zoomed_at(cursor, new_zoom, w, h));
                } else if touches.len() == 1 {
                    let t = &touches[0];
                    let cur = (t.client_coordinates().x, t.client_coordinates().y);
                    if let Some(start) = *touch_start_pos.read() {
                        if !*touch_did_pan.read() && point_distance(start, cur) > TOUCH_DRAG_THRESHOLD {
                            touch_did_pan.set(true);
                        }
                        if *touch_did_pan.read() {
                            surface
                                .write()
                                .set_view(start_view.panned(cur.0 - start.0, cur.1 - start.1));
                        }
                    }
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let remaining = evt.data().touches().len();

                if *is_pinching.read() {
                    // Wait for all fingers to lift before resetting pinch state
                    if remaining == 0 {
                        is_pinching.set(false);
                        touch_start_pos.set(None);
                    }
                    return;
                }

                // Single-finger tap: no pan and all fingers up
                if remaining == 0 && !*touch_did_pan.read() {
                    if let Some(start) = *touch_start_pos.read() {
                        if let Some((x, y)) = to_container(start.0, start.1) {
                            click_at(x, y);
                        }
                    }
                }

                if remaining == 0 {
                    touch_start_pos.set(None);
                }
            },

            ontouchcancel: move |_evt: Event<TouchData>| {
                touch_start_pos.set(None);
                touch_did_pan.set(false);
                is_pinching.set(false);
            },

            div { class: "map-tiles",
                for (key, src, style) in tiles {
                    img {
                        key: "{key}",
                        class: "map-tile",
                        src: "{src}",
                        draggable: "false",
                        alt: "",
                        style: "{style}",
                    }
                }
            }

            div {
                class: "map-overlay",
                dangerous_inner_html: "{svg_html}",
            }

            if let Some((style, code, dot_class, summary, location)) = tooltip {
                div {
                    class: "plot-tooltip",
                    style: "{style}",
                    div { class: "tooltip-code", "{code}" }
                    div { class: "tooltip-row",
                        span { class: "{dot_class}" }
                        "{summary}"
                    }
                    div { class: "tooltip-row", "{location}" }
                }
            }

            div { class: "map-zoom-controls",
                button {
                    title: "Zoom in",
                    onclick: move |evt: Event<MouseData>| {
                        evt.stop_propagation();
                        let (w, h) = surface.read().size();
                        let zoom = surface.read().view().zoom;
                        surface.write().zoom_at((w / 2.0, h / 2.0), zoom + KEY_ZOOM_STEP);
                    },
                    onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                    "+"
                }
                button {
                    title: "Zoom out",
                    onclick: move |evt: Event<MouseData>| {
                        evt.stop_propagation();
                        let (w, h) = surface.read().size();
                        let zoom = surface.read().view().zoom;
                        surface.write().zoom_at((w / 2.0, h / 2.0), zoom - KEY_ZOOM_STEP);
                    },
                    onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                    "−"
                }
            }

            div { class: "map-attribution", "{TILE_ATTRIBUTION}" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotmap_shared::map_state::{initial_view, OverlayLayer};
    use plotmap_shared::models::PlotStatus;
    use plotmap_shared::sample::sample_plots;

    fn layer() -> OverlayLayer {
        OverlayLayer::build(&sample_plots(), &StatusFilter::default(), Rc::new(|_: Plot| {}))
    }

    fn fitted_view(layer: &OverlayLayer) -> MapView {
        initial_view(layer.extent(), 800.0, 600.0)
    }

    #[test]
    fn test_overlay_svg_draws_every_visible_plot() {
        let layer = layer();
        let view = fitted_view(&layer);
        let svg = build_overlay_svg(layer.shapes(), &view, 800.0, 600.0, None);
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<path").count(), 5);
        assert_eq!(svg.matches("stroke-dasharray=\"6 4\"").count(), 1);
        assert!(!svg.contains("#ffffff"));
    }

    #[test]
    fn test_overlay_svg_emphasises_hovered_plot_last() {
        let layer = layer();
        let view = fitted_view(&layer);
        let svg = build_overlay_svg(layer.shapes(), &view, 800.0, 600.0, Some("2"));
        let last_path = svg.rfind("<path").unwrap();
        assert!(svg[last_path..].contains(r#"data-plot-id="2""#));
        assert!(svg[last_path..].contains("#ffffff"));
        assert_eq!(svg.matches("#ffffff").count(), 1);
    }

    #[test]
    fn test_overlay_svg_skips_offscreen_plots() {
        let layer = layer();
        let far_away = MapView::new(plotmap_shared::geometry::LatLng::new(-10.0, 31.0), 14.0);
        let svg = build_overlay_svg(layer.shapes(), &far_away, 800.0, 600.0, None);
        assert_eq!(svg.matches("<path").count(), 0);
    }

    #[test]
    fn test_overlay_svg_escapes_plot_ids() {
        let mut plots = sample_plots();
        plots[0].id = r#"1"/><image href="x" onerror="alert(1)"/><path d=""#.to_string();
        let layer = OverlayLayer::build(&plots, &StatusFilter::default(), Rc::new(|_: Plot| {}));
        let view = fitted_view(&layer);
        let svg = build_overlay_svg(layer.shapes(), &view, 800.0, 600.0, None);
        assert!(!svg.contains("<image"));
        assert!(!svg.contains(r#"onerror="alert(1)""#));
        assert_eq!(svg.matches("<path").count(), 5);
        assert!(svg.contains(r#"data-plot-id="1&quot;/&gt;&lt;image"#));
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("MBY-001"), "MBY-001");
        assert_eq!(escape_attr(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }

    #[test]
    fn test_ring_path_closes() {
        let layer = layer();
        let view = fitted_view(&layer);
        let d = ring_path(&layer.shapes()[0].polygons[0][0], &view, 800.0, 600.0);
        assert!(d.starts_with('M'));
        assert!(d.ends_with('Z'));
        assert_eq!(d.matches('L').count(), 4);
    }

    #[test]
    fn test_status_colors_in_svg() {
        let layer = layer();
        let view = fitted_view(&layer);
        let svg = build_overlay_svg(layer.shapes(), &view, 800.0, 600.0, None);
        assert!(svg.contains(plotmap_shared::style::status_color(PlotStatus::Taken)));
        assert!(svg.contains(plotmap_shared::style::status_color(PlotStatus::Available)));
    }

    #[test]
    fn test_unlaid_container_has_no_usable_size() {
        assert_eq!(usable_size(0.0, 0.0), None);
        assert_eq!(usable_size(800.0, 0.0), None);
        assert_eq!(usable_size(f64::NAN, 600.0), None);
        assert_eq!(usable_size(800.0, 600.0), Some((800.0, 600.0)));
    }

    #[test]
    fn test_key_actions() {
        assert_eq!(key_action("+"), Some(KeyAction::ZoomIn));
        assert_eq!(key_action("-"), Some(KeyAction::ZoomOut));
        assert_eq!(key_action("r"), Some(KeyAction::Reset));
        assert_eq!(key_action("Escape"), Some(KeyAction::Escape));
        assert_eq!(key_action("x"), None);
    }

    #[test]
    fn test_text_entry_tags() {
        assert!(is_text_entry("INPUT"));
        assert!(is_text_entry("textarea"));
        assert!(!is_text_entry("DIV"));
    }

    #[test]
    fn test_format_area() {
        assert_eq!(format_area(4.9), "4.90 ha");
        assert_eq!(format_area(0.0), "0.00 ha");
    }
}
