use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Which fetcher configuration a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Live when any real API key is configured, synthetic otherwise
    #[default]
    Auto,
    Live,
    Synthetic,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(SourceMode::Auto),
            "live" => Ok(SourceMode::Live),
            "synthetic" | "offline" => Ok(SourceMode::Synthetic),
            other => Err(format!(
                "unknown source mode '{}'; expected auto, live or synthetic",
                other
            )),
        }
    }
}

/// API credentials, loaded from the environment only (never from the TOML file)
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub producthunt_token: Option<String>,
    pub serpapi_key: Option<String>,
    pub crunchbase_key: Option<String>,
    pub newsapi_key: Option<String>,
    pub proxycurl_key: Option<String>,
    pub opencorporates_token: Option<String>,
}

impl ApiKeys {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let key = |name: &str| lookup(name).filter(|v| !is_placeholder(v));
        Self {
            producthunt_token: key("PRODUCTHUNT_TOKEN"),
            serpapi_key: key("SERPAPI_KEY"),
            crunchbase_key: key("CRUNCHBASE_KEY"),
            newsapi_key: key("NEWSAPI_KEY"),
            proxycurl_key: key("PROXYCURL_API_KEY"),
            opencorporates_token: key("OPENCORPORATES_APP_TOKEN"),
        }
    }

    /// Number of source credentials present
    pub fn configured_count(&self) -> usize {
        [
            &self.producthunt_token,
            &self.serpapi_key,
            &self.crunchbase_key,
            &self.newsapi_key,
            &self.proxycurl_key,
            &self.opencorporates_token,
        ]
        .iter()
        .filter(|k| k.is_some())
        .count()
    }
}

/// Treat empty, templated, or sample values as unset
pub fn is_placeholder(value: &str) -> bool {
    let t = value.trim();
    t.is_empty()
        || t.contains("${")
        || t.eq_ignore_ascii_case("your-api-key-here")
        || t.eq_ignore_ascii_case("changeme")
}

/// Runtime configuration for the collector
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub api_keys: ApiKeys,
    pub request_timeout_secs: f64,
    pub source_timeout_secs: f64,
    pub max_concurrency: usize,
    pub source_mode: SourceMode,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            cache_dir: PathBuf::from(".cache"),
            api_keys: ApiKeys::default(),
            request_timeout_secs: 20.0,
            source_timeout_secs: 60.0,
            max_concurrency: 5,
            source_mode: SourceMode::Auto,
            log_level: "startup_signals=info".to_string(),
        }
    }
}

/// `[runtime]` table of the optional TOML file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    runtime: FileRuntime,
}

#[derive(Debug, Default, Deserialize)]
struct FileRuntime {
    output_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    request_timeout: Option<f64>,
    source_timeout: Option<f64>,
    max_concurrency: Option<usize>,
    source_mode: Option<SourceMode>,
}

impl RuntimeConfig {
    /// Load configuration from .env, the optional TOML file and environment variables.
    /// Uses SIGNALS_CONFIG or defaults to "startup_signals.toml"; env always wins.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("SIGNALS_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = std::env::var("SIGNALS_CONFIG")
            .unwrap_or_else(|_| "startup_signals.toml".to_string());

        let mut config = Self::default();
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            let file: FileConfig = toml::from_str(&content)?;
            config.apply_file(file);
            tracing::debug!("Loaded runtime config from {}", config_path);
        } else {
            tracing::debug!("Config file {} not found, using defaults", config_path);
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults (no env overrides)
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let mut config = Self::default();
        config.apply_file(file);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        let rt = file.runtime;
        if let Some(dir) = rt.output_dir {
            self.output_dir = dir;
        }
        if let Some(dir) = rt.cache_dir {
            self.cache_dir = dir;
        }
        if let Some(t) = rt.request_timeout {
            self.request_timeout_secs = t;
        }
        if let Some(t) = rt.source_timeout {
            self.source_timeout_secs = t;
        }
        if let Some(n) = rt.max_concurrency {
            self.max_concurrency = n;
        }
        if let Some(mode) = rt.source_mode {
            self.source_mode = mode;
        }
    }

    /// Apply environment overrides through an injectable lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        self.api_keys = ApiKeys::from_lookup(&lookup);

        if let Some(dir) = lookup("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT") {
            self.request_timeout_secs = v
                .parse()
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT must be a number, got '{}'", v))?;
        }
        if let Some(v) = lookup("SOURCE_TIMEOUT") {
            self.source_timeout_secs = v
                .parse()
                .map_err(|_| anyhow::anyhow!("SOURCE_TIMEOUT must be a number, got '{}'", v))?;
        }
        if let Some(v) = lookup("MAX_CONCURRENCY") {
            self.max_concurrency = v
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_CONCURRENCY must be an integer, got '{}'", v))?;
        }
        if let Some(v) = lookup("SIGNALS_SOURCE_MODE") {
            self.source_mode = v.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Validate and clamp configuration values
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if !(self.request_timeout_secs.is_finite() && self.request_timeout_secs > 0.0) {
            anyhow::bail!("REQUEST_TIMEOUT must be > 0");
        }
        if !(self.source_timeout_secs.is_finite() && self.source_timeout_secs > 0.0) {
            anyhow::bail!("SOURCE_TIMEOUT must be > 0");
        }
        if self.source_timeout_secs < self.request_timeout_secs {
            tracing::warn!(
                "SOURCE_TIMEOUT {}s is shorter than REQUEST_TIMEOUT {}s; sources may be cut off mid-request",
                self.source_timeout_secs,
                self.request_timeout_secs
            );
        }
        if self.max_concurrency == 0 {
            tracing::warn!("MAX_CONCURRENCY 0 is invalid, clamping to 1");
            self.max_concurrency = 1;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.source_timeout_secs)
    }

    /// Resolve `Auto` against the configured credentials
    pub fn effective_source_mode(&self) -> SourceMode {
        match self.source_mode {
            SourceMode::Auto if self.api_keys.configured_count() > 0 => SourceMode::Live,
            SourceMode::Auto => SourceMode::Synthetic,
            other => other,
        }
    }

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
}
