//! Build-time configuration for the web app.
//!
//! Values come from environment variables present when the wasm bundle is
//! compiled (`PLOTMAP_API_URL`, `PLOTMAP_ENV`, `PLOTMAP_TILE_URL`,
//! `PLOTMAP_STRICT_BOUNDS`).

use plotmap_shared::geojson::ValidationOptions;
use plotmap_shared::loader::Environment;
use plotmap_shared::retry::RetryPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub environment: Environment,
    pub tile_url: String,
    pub retry: RetryPolicy,
    pub validation: ValidationOptions,
}

impl AppConfig {
    pub fn load() -> Self {
        AppConfig::from_values(
            option_env!("PLOTMAP_API_URL"),
            option_env!("PLOTMAP_ENV"),
            option_env!("PLOTMAP_TILE_URL"),
            option_env!("PLOTMAP_STRICT_BOUNDS"),
        )
    }

    fn from_values(
        api_url: Option<&str>,
        env: Option<&str>,
        tile_url: Option<&str>,
        strict_bounds: Option<&str>,
    ) -> Self {
        let api_base = api_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        let environment = env
            .and_then(Environment::parse)
            .unwrap_or_else(default_environment);
        let tile_url = tile_url
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_TILE_URL)
            .to_string();
        let strict = strict_bounds.is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));
        AppConfig {
            api_base,
            environment,
            tile_url,
            retry: RetryPolicy::default(),
            validation: ValidationOptions {
                strict_bounds: strict,
                ..Default::default()
            },
        }
    }
}

/// Debug builds behave as development, release builds as production.
fn default_environment() -> Environment {
    if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    }
}
