use dioxus::prelude::*;
use plotmap_shared::models::IntendedUse;
use plotmap_shared::order_flow::{OrderDraft, OrderFlow};

/// Apply an edit to the open draft, if any.
fn edit_draft(mut flow: Signal<Option<OrderFlow>>, edit: impl FnOnce(&mut OrderDraft)) {
    if let Some(open) = flow.write().as_mut() {
        edit(&mut open.draft);
    }
}

fn intended_use_label(usage: IntendedUse) -> &'static str {
    match usage {
        IntendedUse::Residential => "Residential",
        IntendedUse::Commercial => "Commercial",
        IntendedUse::Agricultural => "Agricultural",
        IntendedUse::Industrial => "Industrial",
        IntendedUse::Mixed => "Mixed use",
    }
}

/// Modal order form for the plot in `flow`. Renders nothing when no form is
/// open.
#[component]
pub fn OrderForm(
    flow: Signal<Option<OrderFlow>>,
    on_submit: EventHandler<()>,
    on_close: EventHandler<()>,
) -> Element {
    let Some(open) = flow.read().clone() else {
        return rsx! {};
    };
    let plot = &open.plot;
    let draft = &open.draft;
    let submitting = open.is_submitting();
    let error = open.error().map(str::to_string);
    let area = format!("{:.2} ha", plot.area_hectares);
    let location = plot.location();
    let use_options: Vec<(&'static str, &'static str, bool)> = IntendedUse::ALL
        .into_iter()
        .map(|u| (u.as_str(), intended_use_label(u), u == draft.intended_use))
        .collect();

    rsx! {
        div {
            class: "order-backdrop",
            onclick: move |_| {
                if !submitting {
                    on_close.call(());
                }
            },

            div {
                class: "order-modal",
                role: "dialog",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                div { class: "order-header",
                    h2 { "Order plot {plot.plot_code}" }
                    button {
                        class: "close-btn",
                        title: "Close",
                        disabled: submitting,
                        onclick: move |_| on_close.call(()),
                        "×"
                    }
                }

                dl { class: "plot-summary",
                    dt { "Plot code" }
                    dd { "{plot.plot_code}" }
                    dt { "Area" }
                    dd { "{area}" }
                    dt { "Location" }
                    dd { "{location}" }
                }

                form {
                    onsubmit: move |evt: Event<FormData>| {
                        evt.prevent_default();
                        on_submit.call(());
                    },

                    label { "Full name"
                        input {
                            r#type: "text",
                            required: true,
                            value: "{draft.customer_name}",
                            disabled: submitting,
                            oninput: move |evt: Event<FormData>| {
                                edit_draft(flow, |d| d.customer_name = evt.value());
                            },
                        }
                    }
                    label { "Phone number"
                        input {
                            r#type: "tel",
                            required: true,
                            placeholder: "+255 7xx xxx xxx",
                            value: "{draft.customer_phone}",
                            disabled: submitting,
                            oninput: move |evt: Event<FormData>| {
                                edit_draft(flow, |d| d.customer_phone = evt.value());
                            },
                        }
                    }
                    label { "Email (optional)"
                        input {
                            r#type: "email",
                            value: "{draft.customer_email}",
                            disabled: submitting,
                            oninput: move |evt: Event<FormData>| {
                                edit_draft(flow, |d| d.customer_email = evt.value());
                            },
                        }
                    }
                    label { "National ID number"
                        input {
                            r#type: "text",
                            required: true,
                            value: "{draft.customer_id_number}",
                            disabled: submitting,
                            oninput: move |evt: Event<FormData>| {
                                edit_draft(flow, |d| d.customer_id_number = evt.value());
                            },
                        }
                    }
                    label { "Intended use"
                        select {
                            disabled: submitting,
                            onchange: move |evt: Event<FormData>| {
                                if let Some(usage) = IntendedUse::parse(&evt.value()) {
                                    edit_draft(flow, |d| d.intended_use = usage);
                                }
                            },
                            for (value, label, selected) in use_options {
                                option { value: "{value}", selected: selected, "{label}" }
                            }
                        }
                    }
                    label { "Notes (optional)"
                        textarea {
                            rows: "3",
                            value: "{draft.notes}",
                            disabled: submitting,
                            oninput: move |evt: Event<FormData>| {
                                edit_draft(flow, |d| d.notes = evt.value());
                            },
                        }
                    }

                    if let Some(message) = error {
                        div { class: "form-error", role: "alert", "{message}" }
                    }

                    div { class: "order-actions",
                        button {
                            r#type: "button",
                            class: "secondary",
                            disabled: submitting,
                            onclick: move |_| on_close.call(()),
                            "Cancel"
                        }
                        button {
                            r#type: "submit",
                            class: "primary",
                            disabled: submitting,
                            if submitting { "Submitting…" } else { "Submit order" }
                        }
                    }
                }
            }
        }
    }
}
