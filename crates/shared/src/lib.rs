pub mod error;
pub mod geojson;
pub mod geometry;
pub mod loader;
pub mod map_state;
pub mod models;
pub mod order_flow;
pub mod projection;
pub mod retry;
pub mod sample;
pub mod style;
