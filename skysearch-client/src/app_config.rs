use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub autocomplete: AutocompleteConfig,
    pub histogram: HistogramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AutocompleteConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
}

impl AutocompleteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistogramConfig {
    pub bucket_count: usize,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::with_defaults()?
            // Shared settings checked into the repo
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides, defaulting to 'development'
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer-local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `SKYSEARCH_BACKEND__BASE_URL=http://api:8000`
            .add_source(Self::environment())
            .build()?;

        s.try_deserialize()
    }

    /// `SKYSEARCH_` prefix, `__` between nested keys
    fn environment() -> config::Environment {
        config::Environment::with_prefix("SKYSEARCH")
            .prefix_separator("_")
            .separator("__")
    }

    /// Builder pre-seeded with the built-in defaults
    pub fn with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("backend.base_url", "http://127.0.0.1:8000")?
            .set_default("backend.request_timeout_ms", 10_000_i64)?
            .set_default("autocomplete.debounce_ms", 300_i64)?
            .set_default("autocomplete.min_query_len", 2_i64)?
            .set_default("histogram.bucket_count", 5_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_defaults() {
        let config: Config = Config::with_defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.autocomplete.debounce(), Duration::from_millis(300));
        assert_eq!(config.autocomplete.min_query_len, 2);
        assert_eq!(config.histogram.bucket_count, 5);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            [backend]
            base_url = "https://flights.example.com"

            [autocomplete]
            debounce_ms = 150
        "#;

        let config: Config = Config::with_defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.backend.base_url, "https://flights.example.com");
        assert_eq!(config.backend.request_timeout_ms, 10_000);
        assert_eq!(config.autocomplete.debounce_ms, 150);
        assert_eq!(config.autocomplete.min_query_len, 2);
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        let vars = config::Map::from([
            ("SKYSEARCH_BACKEND__BASE_URL".to_string(), "http://api:8000".to_string()),
            ("SKYSEARCH_HISTOGRAM__BUCKET_COUNT".to_string(), "8".to_string()),
        ]);

        let config: Config = Config::with_defaults()
            .unwrap()
            .add_source(Config::environment().try_parsing(true).source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.backend.base_url, "http://api:8000");
        assert_eq!(config.histogram.bucket_count, 8);
        assert_eq!(config.autocomplete.debounce_ms, 300);
    }
}
