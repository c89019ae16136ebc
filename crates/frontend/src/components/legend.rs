use dioxus::prelude::*;
use plotmap_shared::map_state::{PlotStore, StatusCounts, StatusFilter};
use plotmap_shared::models::PlotStatus;
use plotmap_shared::style::status_color;

#[derive(Debug, Clone, PartialEq)]
struct LegendRow {
    status: PlotStatus,
    label: &'static str,
    color: &'static str,
    count: usize,
    shown: bool,
}

fn legend_rows(counts: &StatusCounts, filter: &StatusFilter) -> Vec<LegendRow> {
    let mut rows: Vec<LegendRow> = PlotStatus::ALL
        .into_iter()
        .map(|status| LegendRow {
            status,
            label: status.label(),
            color: status_color(status),
            count: counts.get(status),
            shown: filter.allows(status),
        })
        .collect();
    // Only listed when the registry actually sent such plots
    if counts.unknown > 0 {
        rows.push(LegendRow {
            status: PlotStatus::Unknown,
            label: PlotStatus::Unknown.label(),
            color: status_color(PlotStatus::Unknown),
            count: counts.unknown,
            shown: true,
        });
    }
    rows
}

/// Status colour key with per-status counts and visibility toggles.
#[component]
pub fn Legend(store: Signal<PlotStore>, filter: Signal<StatusFilter>) -> Element {
    let counts = store.read().counts();
    let rows = legend_rows(&counts, &filter.read());
    let total = store.read().plots().len();

    rsx! {
        div { class: "panel legend",
            h3 { "Plots ({total})" }
            for row in rows {
                label {
                    key: "{row.label}",
                    class: if row.shown { "legend-row" } else { "legend-row hidden" },
                    input {
                        r#type: "checkbox",
                        checked: row.shown,
                        disabled: row.status == PlotStatus::Unknown,
                        onchange: move |_| {
                            let next = filter.read().toggled(row.status);
                            filter.set(next);
                        },
                    }
                    span { class: "legend-swatch", style: "background: {row.color}" }
                    span { class: "legend-label", "{row.label}" }
                    span { class: "legend-count", "{row.count}" }
                }
            }
        }
    }
}
