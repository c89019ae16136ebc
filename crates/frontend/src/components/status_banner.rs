use dioxus::prelude::*;
use plotmap_shared::loader::PlotSource;
use plotmap_shared::map_state::DataState;

#[derive(Debug, Clone, PartialEq)]
enum Banner {
    Loading,
    Empty,
    Error(String),
    Sample,
}

fn banner_for(data: &DataState, source: Option<PlotSource>) -> Option<Banner> {
    match data {
        DataState::Loading => Some(Banner::Loading),
        DataState::Empty => Some(Banner::Empty),
        DataState::Error(message) => Some(Banner::Error(message.clone())),
        DataState::Loaded if source == Some(PlotSource::Sample) => Some(Banner::Sample),
        DataState::Loaded => None,
    }
}

/// Load progress, empty and error notices shown above the map.
#[component]
pub fn StatusBanner(data: DataState, source: Option<PlotSource>, on_retry: EventHandler<()>) -> Element {
    let Some(banner) = banner_for(&data, source) else {
        return rsx! {};
    };

    match banner {
        Banner::Loading => rsx! {
            div { class: "status-banner loading", role: "status",
                span { class: "spinner" }
                "Loading plots…"
            }
        },
        Banner::Empty => rsx! {
            div { class: "status-banner empty", role: "status",
                "No plots are registered yet."
                button { onclick: move |_| on_retry.call(()), "Reload" }
            }
        },
        Banner::Error(message) => rsx! {
            div { class: "status-banner error", role: "alert",
                "{message}"
                button { onclick: move |_| on_retry.call(()), "Retry" }
            }
        },
        Banner::Sample => rsx! {
            div { class: "status-banner sample", role: "status",
                "The registry is unreachable. Showing sample plots."
                button { onclick: move |_| on_retry.call(()), "Retry" }
            }
        },
    }
}
