//! Turning a raw `/api/plots` outcome into the plots the map shows.

use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::geojson::{parse_plot_collection, ValidationOptions};
use crate::models::Plot;
use crate::sample::sample_plots;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Option<Environment> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" => Some(Environment::Development),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotSource {
    Registry,
    Sample,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotLoad {
    pub plots: Vec<Plot>,
    pub rejected: usize,
    pub source: PlotSource,
}

/// Validate a fetched body, or fall back to the sample plots when the
/// registry could not be reached outside production.
pub fn resolve_plot_response(
    fetched: Result<String, ApiError>,
    env: Environment,
    opts: &ValidationOptions,
    now: DateTime<Utc>,
) -> Result<PlotLoad, ApiError> {
    match fetched {
        Ok(body) => {
            let parsed = parse_plot_collection(&body, opts, now)?;
            Ok(PlotLoad {
                plots: parsed.plots,
                rejected: parsed.rejected,
                source: PlotSource::Registry,
            })
        }
        Err(err) if err.is_connectivity() && !env.is_production() => {
            tracing::warn!(error = %err, "plot registry unreachable, using sample plots");
            Ok(PlotLoad {
                plots: sample_plots(),
                rejected: 0,
                source: PlotSource::Sample,
            })
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn resolve(fetched: Result<String, ApiError>, env: Environment) -> Result<PlotLoad, ApiError> {
        resolve_plot_response(fetched, env, &ValidationOptions::default(), Utc::now())
    }

    #[test]
    fn test_connectivity_failure_uses_sample_in_development() {
        let load = resolve(Err(ApiError::Network("refused".into())), Environment::Development).unwrap();
        assert_eq!(load.source, PlotSource::Sample);
        assert_eq!(load.plots.len(), 5);

        let load = resolve(Err(ApiError::Timeout(Duration::from_secs(30))), Environment::Development)
            .unwrap();
        assert_eq!(load.source, PlotSource::Sample);
    }

    #[test]
    fn test_connectivity_failure_in_production_is_an_error() {
        let err = resolve(Err(ApiError::Network("refused".into())), Environment::Production)
            .unwrap_err();
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_http_error_never_falls_back() {
        let err = resolve(
            Err(ApiError::from_status(500, r#"{"detail":"database down"}"#)),
            Environment::Development,
        )
        .unwrap_err();
        assert_eq!(err.user_message(), "database down");
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        let err = resolve(Ok("[]".to_string()), Environment::Development).unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
        let err = resolve(Ok(String::new()), Environment::Development).unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn test_empty_collection_loads_no_plots() {
        let load = resolve(
            Ok(r#"{"type":"FeatureCollection","features":[]}"#.to_string()),
            Environment::Production,
        )
        .unwrap();
        assert!(load.plots.is_empty());
        assert_eq!(load.source, PlotSource::Registry);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("Production"), Some(Environment::Production));
        assert_eq!(Environment::parse("dev"), Some(Environment::Development));
        assert_eq!(Environment::parse("staging"), None);
    }
}
