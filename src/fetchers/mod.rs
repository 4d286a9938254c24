//! Fetchers: one per external source, each returning a partial payload.

pub mod crunchbase;
pub mod heuristics;
pub mod news;
pub mod opencorporates;
pub mod producthunt;
pub mod proxycurl;
pub mod serp;
pub mod synthetic;

use crate::config::{RuntimeConfig, SourceMode};
use crate::error::SignalError;
use crate::http::CachedClient;
use crate::payload::Payload;
use crate::query::Query;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use crunchbase::CrunchbaseFetcher;
pub use news::NewsFetcher;
pub use opencorporates::OpenCorporatesFetcher;
pub use producthunt::ProductHuntFetcher;
pub use proxycurl::ProxycurlEnricher;
pub use serp::{SerpJobsFetcher, SerpOverviewFetcher};
pub use synthetic::SyntheticFetcher;

/// Why a source produced nothing. Always recovered by the collector.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("{source_name} timed out after {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Partial payload for one query. "Nothing found" is `Ok` with an empty payload.
    /// A query with neither name nor domain is rejected with `InvalidQuery`
    /// before any request is made.
    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError>;

    /// Batch form; results line up with `queries`.
    async fn fetch_many(&self, queries: &[Query]) -> Vec<Result<Payload, SourceError>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.fetch(query).await);
        }
        results
    }
}

/// Gate every fetch goes through first
pub fn check_query(query: &Query) -> Result<(), SourceError> {
    query.validate().map_err(|e| match e {
        SignalError::InvalidQuery { message } => SourceError::InvalidQuery { message },
        other => SourceError::InvalidQuery {
            message: other.to_string(),
        },
    })
}

/// Post-merge pass that replaces founder records with enriched ones.
#[async_trait]
pub trait FounderEnricher: Send + Sync {
    fn name(&self) -> &'static str;

    /// One output record per input, in input order. Never fails as a whole.
    async fn enrich(&self, founders: Vec<Value>, domain: Option<&str>) -> Vec<Value>;
}

/// Fetchers plus the optional enricher for one configuration
pub struct SourceSet {
    pub fetchers: Vec<Arc<dyn Fetcher>>,
    pub enricher: Option<Arc<dyn FounderEnricher>>,
}

/// Build sources from configuration. Declaration order is merge order.
pub fn create_sources(config: &RuntimeConfig) -> anyhow::Result<SourceSet> {
    match config.effective_source_mode() {
        SourceMode::Synthetic | SourceMode::Auto => {
            info!("Using synthetic source (no network access)");
            Ok(SourceSet {
                fetchers: vec![Arc::new(SyntheticFetcher::new())],
                enricher: None,
            })
        }
        SourceMode::Live => {
            let client = Arc::new(CachedClient::new(
                &config.cache_dir,
                config.request_timeout(),
            )?);
            let keys = &config.api_keys;
            let fetchers: Vec<Arc<dyn Fetcher>> = vec![
                Arc::new(SerpOverviewFetcher::new(
                    client.clone(),
                    keys.serpapi_key.clone(),
                )),
                Arc::new(SerpJobsFetcher::new(client.clone(), keys.serpapi_key.clone())),
                Arc::new(NewsFetcher::new(client.clone(), keys.newsapi_key.clone())),
                Arc::new(CrunchbaseFetcher::new(
                    client.clone(),
                    keys.crunchbase_key.clone(),
                )),
                Arc::new(ProductHuntFetcher::new(
                    client.clone(),
                    keys.producthunt_token.clone(),
                )),
                Arc::new(OpenCorporatesFetcher::new(
                    client.clone(),
                    keys.opencorporates_token.clone(),
                )),
            ];
            let enricher = keys.proxycurl_key.clone().map(|key| {
                Arc::new(ProxycurlEnricher::new(client.clone(), key, config.max_concurrency))
                    as Arc<dyn FounderEnricher>
            });
            info!(
                "Using live sources ({} credentials configured, founder enrichment {})",
                keys.configured_count(),
                if enricher.is_some() { "on" } else { "off" }
            );
            Ok(SourceSet { fetchers, enricher })
        }
    }
}

/// Fetchers only, for callers that do not enrich
pub fn create_fetchers(config: &RuntimeConfig) -> anyhow::Result<Vec<Arc<dyn Fetcher>>> {
    Ok(create_sources(config)?.fetchers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeys;

    fn names(fetchers: &[Arc<dyn Fetcher>]) -> Vec<&'static str> {
        fetchers.iter().map(|f| f.name()).collect()
    }

    #[test]
    fn auto_without_keys_is_synthetic() {
        let config = RuntimeConfig::default();
        let set = create_sources(&config).unwrap();
        assert_eq!(names(&set.fetchers), ["synthetic"]);
        assert!(set.enricher.is_none());
    }

    #[test]
    fn live_mode_declares_sources_in_merge_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            cache_dir: dir.path().join("cache"),
            source_mode: SourceMode::Live,
            api_keys: ApiKeys {
                proxycurl_key: Some("pc-key".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let set = create_sources(&config).unwrap();
        assert_eq!(
            names(&set.fetchers),
            [
                "serp_overview",
                "serp_jobs",
                "news",
                "crunchbase",
                "producthunt",
                "opencorporates"
            ]
        );
        assert_eq!(set.enricher.map(|e| e.name()), Some("proxycurl"));
        assert!(dir.path().join("cache").is_dir());
    }

    struct Echo;

    #[async_trait]
    impl Fetcher for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
            check_query(query)?;
            match query.name() {
                Some(name) => {
                    let mut out = Payload::new();
                    out.insert("name".into(), Value::String(name.to_string()));
                    Ok(out)
                }
                None => Err(SourceError::Malformed("no name".into())),
            }
        }
    }

    #[tokio::test]
    async fn default_fetch_many_preserves_order() {
        let queries = [Query::for_name("a"), Query::for_domain("b.io"), Query::for_name("c")];
        let results = Echo.fetch_many(&queries).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap()["name"], "a");
        assert!(matches!(results[1], Err(SourceError::Malformed(_))));
        assert_eq!(results[2].as_ref().unwrap()["name"], "c");
    }

    #[tokio::test]
    async fn default_fetch_many_rejects_blank_queries_in_place() {
        let queries = [Query::for_name("a"), Query::default(), Query::for_name("  ")];
        let results = Echo.fetch_many(&queries).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SourceError::InvalidQuery { .. })));
        assert!(matches!(results[2], Err(SourceError::InvalidQuery { .. })));
    }

    #[tokio::test]
    async fn live_fetchers_reject_queries_without_identity() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            cache_dir: dir.path().join("cache"),
            source_mode: SourceMode::Live,
            api_keys: ApiKeys {
                serpapi_key: Some("serp-key".into()),
                newsapi_key: Some("news-key".into()),
                crunchbase_key: Some("cb-key".into()),
                producthunt_token: Some("ph-token".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let set = create_sources(&config).unwrap();
        for fetcher in &set.fetchers {
            let err = fetcher.fetch(&Query::default()).await.unwrap_err();
            assert!(
                matches!(err, SourceError::InvalidQuery { .. }),
                "{} returned {err}",
                fetcher.name()
            );
        }
        let batch = set.fetchers[5].fetch_many(&[Query::default()]).await;
        assert!(matches!(batch[0], Err(SourceError::InvalidQuery { .. })));
    }
}
