//! Status colours for the plot overlay.

use crate::models::PlotStatus;

pub const AVAILABLE_COLOR: &str = "#22c55e";
pub const TAKEN_COLOR: &str = "#ef4444";
pub const PENDING_COLOR: &str = "#f59e0b";
pub const UNKNOWN_COLOR: &str = "#9ca3af";

const PENDING_DASH: &str = "6 4";
const HOVER_OUTLINE: &str = "#ffffff";

/// Drawing parameters for one plot outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStyle {
    pub fill: &'static str,
    pub fill_opacity: f64,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub dash_array: Option<&'static str>,
}

impl PathStyle {
    /// SVG presentation attributes, ready to splice into a `<path>` tag.
    pub fn svg_attributes(&self) -> String {
        let mut attrs = format!(
            r#"fill="{}" fill-opacity="{:.2}" stroke="{}" stroke-width="{:.1}" stroke-linejoin="round""#,
            self.fill, self.fill_opacity, self.stroke, self.stroke_width
        );
        if let Some(dash) = self.dash_array {
            attrs.push_str(&format!(r#" stroke-dasharray="{dash}""#));
        }
        attrs
    }
}

pub fn status_color(status: PlotStatus) -> &'static str {
    match status {
        PlotStatus::Available => AVAILABLE_COLOR,
        PlotStatus::Taken => TAKEN_COLOR,
        PlotStatus::Pending => PENDING_COLOR,
        PlotStatus::Unknown => UNKNOWN_COLOR,
    }
}

/// Base style of a plot in the given status.
pub fn status_style(status: PlotStatus) -> PathStyle {
    let color = status_color(status);
    PathStyle {
        fill: color,
        fill_opacity: 0.35,
        stroke: color,
        stroke_width: 2.0,
        dash_array: (status == PlotStatus::Pending).then_some(PENDING_DASH),
    }
}

/// Emphasised variant of `base` shown while the pointer is over a plot.
pub fn hover_style(base: PathStyle) -> PathStyle {
    PathStyle {
        fill_opacity: (base.fill_opacity + 0.25).min(0.9),
        stroke: HOVER_OUTLINE,
        stroke_width: base.stroke_width + 1.5,
        ..base
    }
}

/// Style to draw with, derived fresh on every render.
pub fn effective_style(status: PlotStatus, hovered: bool) -> PathStyle {
    let base = status_style(status);
    if hovered {
        hover_style(base)
    } else {
        base
    }
}
