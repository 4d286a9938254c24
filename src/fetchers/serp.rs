//! SerpAPI: company overview from the knowledge graph and a job-postings search.

use super::heuristics::{self, SENIORITY};
use super::{Fetcher, SourceError, check_query};
use crate::http::CachedClient;
use crate::payload::{HIRING, PROFILE, Payload, as_number, truthy};
use crate::query::Query;
use crate::utils::{ratio, round_to};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;

const SERP_URL: &str = "https://serpapi.com/search.json";

pub struct SerpOverviewFetcher {
    client: Arc<CachedClient>,
    api_key: Option<String>,
}

impl SerpOverviewFetcher {
    pub fn new(client: Arc<CachedClient>, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl Fetcher for SerpOverviewFetcher {
    fn name(&self) -> &'static str {
        "serp_overview"
    }

    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
        check_query(query)?;
        let (Some(name), Some(key)) = (query.name(), self.api_key.as_deref()) else {
            return Ok(echo_profile(query));
        };
        let params = [
            ("engine", "google".to_string()),
            ("q", name.to_string()),
            ("num", "5".to_string()),
            ("api_key", key.to_string()),
        ];
        let data = self.client.get_json(SERP_URL, &params, &[]).await?;
        Ok(parse_overview(&data, name, query.domain()))
    }
}

/// The query's own identity, used when the search cannot run
fn echo_profile(query: &Query) -> Payload {
    let mut profile = Map::new();
    if let Some(name) = query.name() {
        profile.insert("name".into(), json!(name));
    }
    if let Some(domain) = query.domain() {
        profile.insert("domain".into(), json!(domain));
    }
    let mut out = Payload::new();
    if !profile.is_empty() {
        out.insert(PROFILE.into(), Value::Object(profile));
    }
    out
}

pub fn parse_overview(data: &Value, name: &str, domain: Option<&str>) -> Payload {
    let mut profile = Map::new();
    profile.insert("name".into(), json!(name));

    if let Some(kg) = data.get("knowledge_graph").and_then(Value::as_object)
        && !kg.is_empty()
    {
        let description = kg
            .get("description")
            .filter(|v| truthy(v))
            .or_else(|| kg.get("title"));
        profile.insert(
            "description".into(),
            description.cloned().unwrap_or(Value::Null),
        );
        if let Some(site) = kg.get("website").and_then(Value::as_str) {
            profile.insert("domain".into(), json!(heuristics::extract_domain(site)));
        }
        if let Some(founded) = kg.get("founding_date") {
            profile.insert("founded_year".into(), json!(heuristics::parse_year(founded)));
        }
        if let Some(hq) = kg.get("headquarters_location").filter(|v| truthy(v)) {
            profile.insert("headquarters".into(), hq.clone());
        }
        if let Some(categories) = kg
            .get("categories")
            .filter(|v| v.as_array().is_some_and(|a| !a.is_empty()))
        {
            let names = heuristics::category_names(categories);
            profile.insert("categories".into(), categories.clone());
            profile.insert("market_size".into(), json!(heuristics::market_bucket(&names)));
        }
    }

    if let Some(top) = data.pointer("/organic_results/0") {
        if let Some(snippet) = top.get("snippet").and_then(Value::as_str)
            && !profile.contains_key("description")
        {
            profile.insert("description".into(), json!(snippet));
        }
        if let Some(link) = top.get("link").and_then(Value::as_str)
            && !profile.contains_key("domain")
        {
            profile.insert("domain".into(), json!(heuristics::extract_domain(link)));
        }
    }

    if let Some(domain) = domain
        && !profile.contains_key("domain")
    {
        profile.insert("domain".into(), json!(domain));
    }

    let mut out = Payload::new();
    out.insert(PROFILE.into(), Value::Object(profile));
    out
}

pub struct SerpJobsFetcher {
    client: Arc<CachedClient>,
    api_key: Option<String>,
}

impl SerpJobsFetcher {
    pub fn new(client: Arc<CachedClient>, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl Fetcher for SerpJobsFetcher {
    fn name(&self) -> &'static str {
        "serp_jobs"
    }

    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
        check_query(query)?;
        let (Some(name), Some(key)) = (query.name(), self.api_key.as_deref()) else {
            return Ok(Payload::new());
        };
        let params = [
            ("engine", "google".to_string()),
            ("q", format!("\"{}\" jobs", name)),
            ("num", "10".to_string()),
            ("api_key", key.to_string()),
        ];
        let data = self.client.get_json(SERP_URL, &params, &[]).await?;
        Ok(parse_jobs(&data))
    }
}

pub fn parse_jobs(data: &Value) -> Payload {
    let total_results = data
        .pointer("/search_information/total_results")
        .and_then(as_number)
        .unwrap_or(0.0);
    let hit_texts: Vec<String> = data
        .get("organic_results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|item| {
            let field = |k: &str| item.get(k).and_then(Value::as_str).unwrap_or_default();
            format!("{}{}", field("title"), field("snippet"))
        })
        .filter(|text| text.to_lowercase().contains("job"))
        .collect();
    let senior = hit_texts.iter().filter(|t| SENIORITY.is_match(t)).count();

    let mut out = Payload::new();
    out.insert(
        HIRING.into(),
        json!({
            "job_postings": total_results as i64,
            "net_new_roles_last_quarter": (hit_texts.len() * 3).min(40),
            "senior_ratio": round_to(ratio(senior, hit_texts.len()), 2),
        }),
    );
    out
}
