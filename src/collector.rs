//! Orchestrates one collection run: fetch concurrently, merge, enrich, build features.

use crate::config::RuntimeConfig;
use crate::error::{Result, SignalError};
use crate::features::FeatureSet;
use crate::fetchers::{self, Fetcher, FounderEnricher, SourceError};
use crate::merge;
use crate::payload::{self, FOUNDERS, PROFILE, Payload};
use crate::persist;
use crate::query::Query;
use crate::utils::join_bounded;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

const DEFAULT_MAX_CONCURRENCY: usize = 5;
const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Collector {
    fetchers: Vec<Arc<dyn Fetcher>>,
    enricher: Option<Arc<dyn FounderEnricher>>,
    max_concurrency: usize,
    source_timeout: Duration,
}

impl Collector {
    /// Collector over `fetchers`, merged in the given order
    pub fn new(fetchers: Vec<Arc<dyn Fetcher>>) -> Self {
        Self {
            fetchers,
            enricher: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> anyhow::Result<Self> {
        let sources = fetchers::create_sources(config)?;
        let mut collector = Self::new(sources.fetchers)
            .with_max_concurrency(config.max_concurrency)
            .with_source_timeout(config.source_timeout());
        collector.enricher = sources.enricher;
        Ok(collector)
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn FounderEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn fetcher_names(&self) -> Vec<&'static str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    pub async fn collect(&self, query: &Query) -> Result<FeatureSet> {
        let merged = self.collect_payload(query).await?;
        Ok(self.build_features(&merged))
    }

    /// Validate, load the seed, fetch, merge and enrich. Source failures never surface.
    pub async fn collect_payload(&self, query: &Query) -> Result<Payload> {
        query.validate()?;
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "collect",
            %run_id,
            keyword = query.keyword().unwrap_or_default()
        );
        async move {
            let seed = match &query.profile_path {
                Some(path) => merge::load_seed(path).await?,
                None => Payload::new(),
            };
            let started = Instant::now();
            let partials = self.fetch_all(query).await;
            let mut merged = merge::merge_payloads(seed, partials);
            merge::resolve_identity(&mut merged, query);
            if let Some(enricher) = &self.enricher {
                self.enrich_founders(enricher.as_ref(), &mut merged).await;
            }
            info!(
                "Collected {} sections from {} sources in {:?}",
                merged.len(),
                self.fetchers.len(),
                started.elapsed()
            );
            Ok::<_, SignalError>(merged)
        }
        .instrument(span)
        .await
    }

    /// Pure feature derivation over an already merged payload
    pub fn build_features(&self, merged: &Payload) -> FeatureSet {
        FeatureSet::build(merged)
    }

    /// Drive `collect` on a caller-supplied runtime
    pub fn collect_blocking(&self, runtime: &Runtime, query: &Query) -> Result<FeatureSet> {
        runtime.block_on(self.collect(query))
    }

    async fn fetch_all(&self, query: &Query) -> Vec<Payload> {
        let timeout = self.source_timeout;
        let tasks = self.fetchers.iter().map(|fetcher| async move {
            let name = fetcher.name();
            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, fetcher.fetch(query)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    source_name: name.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };
            match outcome {
                Ok(partial) => {
                    debug!(
                        "Source {} returned {} sections in {:?}",
                        name,
                        partial.len(),
                        started.elapsed()
                    );
                    partial
                }
                Err(e) => {
                    warn!("Source {} unavailable, continuing without it: {}", name, e);
                    Payload::new()
                }
            }
        });
        join_bounded(self.max_concurrency, tasks).await
    }

    async fn enrich_founders(&self, enricher: &dyn FounderEnricher, merged: &mut Payload) {
        let founders = payload::records(merged, FOUNDERS).to_vec();
        if founders.is_empty() {
            return;
        }
        let domain = payload::section(merged, PROFILE)
            .get("domain")
            .and_then(Value::as_str)
            .map(str::to_string);
        let count = founders.len();
        let enriched = enricher.enrich(founders, domain.as_deref()).await;
        debug!(
            "{} enriched {} of {} founders",
            enricher.name(),
            enriched.len(),
            count
        );
        if !enriched.is_empty() {
            merged.insert(FOUNDERS.into(), Value::Array(enriched));
        }
    }
}

/// Build a runtime and collector from configuration, run once, optionally save
pub fn run_from_config(
    config: &RuntimeConfig,
    query: &Query,
    save: bool,
) -> anyhow::Result<FeatureSet> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let collector = Collector::from_config(config)?;
    debug!("Sources: {:?}", collector.fetcher_names());
    let features = collector.collect_blocking(&runtime, query)?;
    if save {
        persist::save(&features, &config.output_dir)?;
        info!("Saved features to {}", config.output_dir.display());
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn arc(fetcher: impl Fetcher + 'static) -> Arc<dyn Fetcher> {
        Arc::new(fetcher)
    }

    struct Fixed(&'static str, Value);

    #[async_trait]
    impl Fetcher for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn fetch(&self, _query: &Query) -> std::result::Result<Payload, SourceError> {
            Ok(self.1.as_object().cloned().unwrap_or_default())
        }
    }

    struct Hang;

    #[async_trait]
    impl Fetcher for Hang {
        fn name(&self) -> &'static str {
            "hang"
        }

        async fn fetch(&self, _query: &Query) -> std::result::Result<Payload, SourceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Payload::new())
        }
    }

    struct Upper;

    #[async_trait]
    impl FounderEnricher for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        async fn enrich(&self, founders: Vec<Value>, domain: Option<&str>) -> Vec<Value> {
            founders
                .into_iter()
                .map(|f| {
                    let name = f["name"].as_str().unwrap_or("?").to_uppercase();
                    json!({"name": name, "domain": domain})
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn invalid_query_fails_before_fetching() {
        let collector = Collector::new(vec![arc(Fixed("a", json!({})))]);
        let err = collector.collect(&Query::default()).await.unwrap_err();
        assert!(matches!(err, SignalError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn slow_source_times_out_to_empty() {
        let collector = Collector::new(vec![
            arc(Hang),
            arc(Fixed("market", json!({"market": {"cagr": 0.3}}))),
        ])
        .with_source_timeout(Duration::from_millis(50));
        let merged = collector.collect_payload(&Query::for_name("Acme")).await.unwrap();
        assert_eq!(merged["market"]["cagr"], 0.3);
        assert_eq!(merged["profile"]["name"], "Acme");
    }

    #[tokio::test]
    async fn enricher_replaces_founders_with_profile_domain() {
        let collector = Collector::new(vec![arc(Fixed(
            "cb",
            json!({"founders": [{"name": "ada"}], "profile": {"domain": "acme.io"}}),
        ))])
        .with_enricher(Arc::new(Upper));
        let merged = collector.collect_payload(&Query::for_name("Acme")).await.unwrap();
        assert_eq!(merged["founders"], json!([{"name": "ADA", "domain": "acme.io"}]));
    }

    #[tokio::test]
    async fn enricher_is_skipped_without_founders() {
        let collector = Collector::new(vec![]).with_enricher(Arc::new(Upper));
        let merged = collector.collect_payload(&Query::for_domain("acme.io")).await.unwrap();
        assert!(!merged.contains_key("founders"));
        assert_eq!(merged["profile"]["domain"], "acme.io");
    }

    #[test]
    fn blocking_entry_point_uses_supplied_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let collector = Collector::new(vec![arc(Fixed(
            "profile",
            json!({"profile": {"market_size": "Large"}}),
        ))]);
        let set = collector
            .collect_blocking(&runtime, &Query::for_name("Acme"))
            .unwrap();
        assert_eq!(set.features_ssff["market_size"], "Large");
    }

    #[test]
    fn run_from_config_synthetic_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            output_dir: dir.path().join("out"),
            cache_dir: dir.path().join("cache"),
            source_mode: crate::config::SourceMode::Synthetic,
            ..Default::default()
        };
        let set = run_from_config(&config, &Query::for_name("Acme"), true).unwrap();
        assert_eq!(set.features_ssff["market_size"], "Large");
        assert!(dir.path().join("out/features_ssff.csv").exists());
        assert!(dir.path().join("out/features_external.json").exists());
    }
}
