use chrono::Utc;
use dioxus::prelude::*;
use plotmap_shared::map_state::{resolve_click, DataState, PlotStore, StatusFilter};
use plotmap_shared::models::Plot;
use plotmap_shared::order_flow::{settle_order, OrderFlow};

use crate::api::RegistryClient;
use crate::components::help_overlay::HelpOverlay;
use crate::components::legend::Legend;
use crate::components::map_view::PlotMap;
use crate::components::order_form::OrderForm;
use crate::components::status_banner::StatusBanner;
use crate::config::AppConfig;

/// Order form a `/plot/{id}` link should open once plots are loaded.
fn linked_flow(plots: &[Plot], plot_id: &str) -> Option<OrderFlow> {
    resolve_click(plots, plot_id).and_then(OrderFlow::open)
}

#[component]
pub fn Registry(plot_id: Option<String>) -> Element {
    let config = use_hook(AppConfig::load);
    let client = use_hook(|| RegistryClient::new(&config));

    let mut store = use_signal(PlotStore::default);
    let filter = use_signal(StatusFilter::default);
    let mut fit_generation = use_signal(|| 0u64);
    let mut order_flow = use_signal(|| None::<OrderFlow>);
    let mut show_help = use_signal(|| false);
    let mut reload = use_signal(|| 0u32);
    let mut linked_plot = use_signal(|| plot_id.clone());

    // Reruns on every reload request; a restart drops the superseded fetch
    let loader_client = client.clone();
    let environment = config.environment;
    let validation = config.validation.clone();
    let _loader = use_resource(move || {
        let attempt = *reload.read();
        let client = loader_client.clone();
        let validation = validation.clone();
        async move {
            tracing::info!(attempt, "loading plots");
            let ticket = store.write().begin_load();
            let result = client.get_all_plots(environment, &validation).await;
            if store.write().finish_load(ticket, result) {
                *fit_generation.write() += 1;
            }
        }
    });

    use_effect(move || {
        let store = store.read();
        if *store.data_state() != DataState::Loaded {
            return;
        }
        let Some(id) = linked_plot.peek().clone() else {
            return;
        };
        linked_plot.set(None);
        match linked_flow(store.plots(), &id) {
            Some(flow) => order_flow.set(Some(flow)),
            None => tracing::warn!(plot_id = %id, "linked plot is not available for ordering"),
        }
    });

    let order_client = client.clone();
    let submit = move |_| {
        let payload = {
            let mut open = order_flow.write();
            let Some(flow) = open.as_mut() else {
                return;
            };
            flow.begin_submit().map(|data| (flow.plot.id.clone(), data))
        };
        let Some((plot_id, data)) = payload else {
            return;
        };
        let client = order_client.clone();
        spawn(async move {
            let result = client.create_order(&plot_id, &data).await;
            let open = order_flow.write().take();
            let next = settle_order(open, &plot_id, result, &mut store.write(), Utc::now());
            order_flow.set(next);
        });
    };

    let close_form = move |_| {
        if order_flow.read().as_ref().is_some_and(|f| f.is_submitting()) {
            return;
        }
        order_flow.set(None);
    };

    let data = store.read().data_state().clone();
    let source = store.read().source();
    let tile_url = config.tile_url.clone();

    rsx! {
        div { class: "app",
            // Header
            div { class: "header",
                h1 { "Land Plot Registry" }
                button {
                    class: "help-btn",
                    title: "Help",
                    onclick: move |_| show_help.toggle(),
                    "?"
                }
            }

            // Sidebar
            div { class: "sidebar",
                StatusBanner {
                    data: data,
                    source: source,
                    on_retry: move |_| *reload.write() += 1,
                }
                Legend { store: store, filter: filter }
            }

            PlotMap {
                store: store,
                filter: filter,
                tile_url: tile_url,
                fit_generation: fit_generation,
                on_select: move |plot: Plot| {
                    if order_flow.read().as_ref().is_some_and(|f| f.is_submitting()) {
                        return;
                    }
                    order_flow.set(OrderFlow::open(&plot));
                },
                on_escape: close_form,
            }

            OrderForm {
                flow: order_flow,
                on_submit: submit,
                on_close: close_form,
            }

            HelpOverlay { show: show_help }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotmap_shared::sample::sample_plots;

    #[test]
    fn test_link_to_available_plot_opens_form() {
        let plots = sample_plots();
        let flow = linked_flow(&plots, "3").unwrap();
        assert_eq!(flow.plot.plot_code, "MBY-003");
        assert!(flow.error().is_none());
    }

    #[test]
    fn test_link_to_unavailable_or_unknown_plot_is_ignored() {
        let plots = sample_plots();
        assert!(linked_flow(&plots, "2").is_none());
        assert!(linked_flow(&plots, "4").is_none());
        assert!(linked_flow(&plots, "99").is_none());
    }
}
