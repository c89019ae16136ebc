use dioxus::prelude::*;

#[component]
pub fn HelpOverlay(show: Signal<bool>) -> Element {
    if !*show.read() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "help-overlay-backdrop",
            onclick: move |_| show.set(false),

            div {
                class: "help-overlay",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h2 { "Help" }

                // --- Keyboard shortcuts ---

                div { class: "shortcut-section",
                    h3 { "Map" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "+" } " / " kbd { "=" } }
                        span { "Zoom in" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "-" } }
                        span { "Zoom out" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "0" } " / " kbd { "R" } }
                        span { "Fit all plots" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "Esc" } }
                        span { "Close the order form" }
                    }
                }

                // --- Using the map ---

                div { class: "help-divider" }

                h2 { class: "help-section-title", "Ordering a Plot" }

                div { class: "help-info-section",
                    h3 { "Plot colours" }
                    p {
                        span { class: "available-text", "Green" }
                        " plots are available, "
                        span { class: "taken-text", "red" }
                        " plots are taken and "
                        span { class: "pending-text", "amber" }
                        " plots have an order under review."
                    }
                }

                div { class: "help-info-section",
                    h3 { "Placing an order" }
                    p { "Click an available plot to open the order form. Orders need your full name, a Tanzanian phone number (+255 or a leading 0) and your national ID number. Once submitted the plot turns amber until the registry reviews it." }
                }

                div { class: "help-info-section",
                    h3 { "Map Interactions" }
                    p { "Scroll or pinch to zoom, drag to pan, double-click to fit all plots. Use the legend to hide plots by status." }
                }

                button {
                    class: "close-help",
                    onclick: move |_| show.set(false),
                    "Close"
                }
            }
        }
    }
}
