//! NewsAPI headlines scored with a small polarity lexicon.

use super::heuristics::{sentiment_label, sentiment_score};
use super::{Fetcher, SourceError, check_query};
use crate::features::summarise_sentiment;
use crate::http::CachedClient;
use crate::payload::{Payload, SENTIMENT};
use crate::query::Query;
use crate::utils::round_to;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

const NEWS_URL: &str = "https://newsapi.org/v2/everything";
const MAX_SOURCES: usize = 10;

pub struct NewsFetcher {
    client: Arc<CachedClient>,
    api_key: Option<String>,
}

impl NewsFetcher {
    pub fn new(client: Arc<CachedClient>, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl Fetcher for NewsFetcher {
    fn name(&self) -> &'static str {
        "news"
    }

    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
        check_query(query)?;
        let (Some(keyword), Some(key)) = (query.keyword(), self.api_key.as_deref()) else {
            return Ok(Payload::new());
        };
        let params = [
            ("q", keyword.to_string()),
            ("language", "en".to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", "20".to_string()),
            ("apiKey", key.to_string()),
        ];
        let data = self.client.get_json(NEWS_URL, &params, &[]).await?;
        Ok(parse_articles(&data))
    }
}

pub fn parse_articles(data: &Value) -> Payload {
    let articles = data
        .get("articles")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut scores = BTreeMap::new();
    let mut sources = Vec::new();
    for article in articles {
        let text = ["title", "description", "content"]
            .iter()
            .filter_map(|k| article.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }
        scores.insert(format!("{:04}", scores.len()), sentiment_score(&text));
        if let Some(url) = article.get("url").and_then(Value::as_str) {
            sources.push(url.to_string());
        }
    }
    sources.truncate(MAX_SOURCES);

    let summary = summarise_sentiment(&scores);
    let mut out = Payload::new();
    out.insert(
        SENTIMENT.into(),
        json!({
            "overall": sentiment_label(summary.average),
            "average": round_to(summary.average, 3),
            "std": round_to(summary.std, 3),
            "article_count": summary.count,
            "sources": sources,
        }),
    );
    out
}
