mod api;
mod components;
mod config;
mod listeners;
mod pages;

use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
    #[route("/plot/:id")]
    PlotView { id: String },
}

#[component]
fn Home() -> Element {
    rsx! {
        pages::registry::Registry { plot_id: None::<String> }
    }
}

#[component]
fn PlotView(id: String) -> Element {
    rsx! {
        pages::registry::Registry { plot_id: Some(id) }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    dioxus::logger::initialize_default();
    launch(App);
}
