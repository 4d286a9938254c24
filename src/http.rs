//! Cached async JSON client shared by the live fetchers.
//!
//! Raw responses are cached on disk (one JSON file per request) with a small
//! in-memory LRU in front. Keys are a blake3 hash of the canonical
//! method+URL+parameters document; credential parameters and headers never
//! take part in the key.

use crate::fetchers::SourceError;
use anyhow::Context;
use lru::LruCache;
use reqwest::RequestBuilder;
use serde_json::{Map, Value, json};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const MEMORY_ENTRIES: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => panic!("memory cache size must be non-zero"),
};

/// Query parameters that carry credentials
const SECRET_PARAMS: &[&str] = &["api_key", "apiKey", "api_token"];

const ERROR_BODY_CAP: usize = 512;

pub struct CachedClient {
    client: reqwest::Client,
    cache_dir: PathBuf,
    timeout: Duration,
    memory: Mutex<LruCache<String, Value>>,
}

impl CachedClient {
    pub fn new(cache_dir: impl Into<PathBuf>, timeout: Duration) -> anyhow::Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir {}", cache_dir.display()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("startup-signals/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build reqwest client with timeout")?;
        Ok(Self {
            client,
            cache_dir,
            timeout,
            memory: Mutex::new(LruCache::new(MEMORY_ENTRIES)),
        })
    }

    pub async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> Result<Value, SourceError> {
        let key = cache_key("GET", url, &params_document(params));
        if let Some(hit) = self.lookup(&key).await {
            debug!("Cache hit for GET {} ({})", url, &key[..12]);
            return Ok(hit);
        }
        let mut request = self.client.get(url).query(params);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        let value = self.send(url, request).await?;
        self.store(&key, &value).await;
        Ok(value)
    }

    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, String)],
    ) -> Result<Value, SourceError> {
        let key = cache_key("POST", url, body);
        if let Some(hit) = self.lookup(&key).await {
            debug!("Cache hit for POST {} ({})", url, &key[..12]);
            return Ok(hit);
        }
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        let value = self.send(url, request).await?;
        self.store(&key, &value).await;
        Ok(value)
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Value, SourceError> {
        let response = request.send().await.map_err(|e| self.transport_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_CAP {
                let cut = (0..=ERROR_BODY_CAP)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| SourceError::Malformed(format!("{}: {}", url, e.without_url())))
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                source_name: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            SourceError::Http(format!("{}: {}", url, err.without_url()))
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    fn remembered(&self, key: &str) -> Option<Value> {
        let mut memory = self.memory.lock().ok()?;
        memory.get(key).cloned()
    }

    fn remember(&self, key: &str, value: &Value) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.put(key.to_string(), value.clone());
        }
    }

    async fn lookup(&self, key: &str) -> Option<Value> {
        if let Some(hit) = self.remembered(key) {
            return Some(hit);
        }
        let bytes = tokio::fs::read(self.entry_path(key)).await.ok()?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                self.remember(key, &value);
                Some(value)
            }
            Err(e) => {
                warn!("Ignoring corrupt cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: &str, value: &Value) {
        self.remember(key, value);
        let bytes = match serde_json::to_vec_pretty(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = tokio::fs::write(self.entry_path(key), bytes).await {
            warn!("Failed to write cache entry {}: {}", key, e);
        }
    }
}

fn params_document(params: &[(&str, String)]) -> Value {
    let map: Map<String, Value> = params
        .iter()
        .filter(|(name, _)| !SECRET_PARAMS.contains(name))
        .map(|(name, value)| (name.to_string(), Value::String(value.clone())))
        .collect();
    Value::Object(map)
}

/// Deterministic cache key: blake3 over sorted-key JSON of method, url and params
pub fn cache_key(method: &str, url: &str, params: &Value) -> String {
    let canonical = json!({"method": method, "url": url, "params": params});
    blake3::hash(canonical.to_string().as_bytes())
        .to_hex()
        .to_string()
}
