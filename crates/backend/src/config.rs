use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Built frontend (`index.html` plus bundles).
    pub dist_dir: PathBuf,
    /// Static files served under `/static`.
    pub assets_dir: PathBuf,
    pub seed: SeedConfig,
}

/// Startup import of plot data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedConfig {
    pub geojson: Option<PathBuf>,
    pub dataset: Option<String>,
    pub district: String,
    pub ward: String,
    pub village: String,
    /// Insert the sample plots into an empty store when no file is given.
    pub sample: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("PORT", "8000")
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let seed = SeedConfig {
            geojson: lookup("SEED_GEOJSON")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            dataset: lookup("SEED_DATASET").filter(|s| !s.trim().is_empty()),
            district: var("SEED_DISTRICT", "Unknown"),
            ward: var("SEED_WARD", "Unknown"),
            village: var("SEED_VILLAGE", "Unknown"),
            sample: lookup("SEED_SAMPLE").is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes")),
        };

        Ok(Config {
            host: var("HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(var("DB_PATH", "data/plots.redb")),
            dist_dir: PathBuf::from(var("DIST_DIR", "dist")),
            assets_dir: PathBuf::from(var("ASSETS_DIR", "assets")),
            seed,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.server_address(), "0.0.0.0:8000");
        assert_eq!(cfg.db_path, PathBuf::from("data/plots.redb"));
        assert_eq!(cfg.dist_dir, PathBuf::from("dist"));
        assert_eq!(cfg.seed.geojson, None);
        assert!(!cfg.seed.sample);
        assert_eq!(cfg.seed.district, "Unknown");
    }

    #[test]
    fn test_seed_settings() {
        let cfg = config(&[
            ("SEED_GEOJSON", "data/mbuyuni.geojson"),
            ("SEED_DISTRICT", "Kilosa"),
            ("SEED_SAMPLE", "true"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.seed.geojson, Some(PathBuf::from("data/mbuyuni.geojson")));
        assert_eq!(cfg.seed.district, "Kilosa");
        assert!(cfg.seed.sample);
    }

    #[test]
    fn test_invalid_port() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.starts_with("Invalid PORT"));
    }
}
