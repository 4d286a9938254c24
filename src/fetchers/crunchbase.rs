//! Crunchbase organization search: profile, funding, founders, market and competition.

use super::heuristics;
use super::{Fetcher, SourceError, check_query};
use crate::http::CachedClient;
use crate::payload::{COMPETITION, FOUNDERS, FUNDING, MARKET, PROFILE, Payload, truthy};
use crate::query::Query;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;

const SEARCH_URL: &str = "https://api.crunchbase.com/api/v4/searches/organizations";

const FIELD_IDS: &[&str] = &[
    "name",
    "short_description",
    "description",
    "website_url",
    "founded_on",
    "location_identifiers",
    "rank_org",
    "categories",
    "last_funding_type",
    "last_funding_on",
    "valuation_at_last_funding",
    "num_funding_rounds",
    "num_employees_enum",
    "stock_exchange",
];

pub struct CrunchbaseFetcher {
    client: Arc<CachedClient>,
    api_key: Option<String>,
}

impl CrunchbaseFetcher {
    pub fn new(client: Arc<CachedClient>, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl Fetcher for CrunchbaseFetcher {
    fn name(&self) -> &'static str {
        "crunchbase"
    }

    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
        check_query(query)?;
        let (Some(name), Some(key)) = (query.name(), self.api_key.as_deref()) else {
            return Ok(Payload::new());
        };
        let body = json!({
            "field_ids": FIELD_IDS,
            "limit": 1,
            "query": [{"field_id": "name", "operator": "eq", "value": name}],
        });
        let headers = [("X-cb-user-key", key.to_string())];
        let data = self.client.post_json(SEARCH_URL, &body, &headers).await?;
        Ok(parse_organization(&data, name))
    }
}

fn list<'a>(value: Option<&'a Value>) -> &'a [Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn parse_organization(data: &Value, name: &str) -> Payload {
    let Some(entity) = data.pointer("/entities/0") else {
        return Payload::new();
    };
    let empty = Map::new();
    let props = entity
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let relationships = entity.get("relationships");
    let investors = list(relationships.and_then(|r| r.get("investors")));
    let competitors = list(relationships.and_then(|r| r.get("competitors")));
    let founders = list(relationships.and_then(|r| r.get("founders")));

    let prop = |key: &str| props.get(key).filter(|v| truthy(v));
    let categories = prop("categories");
    let category_names = categories
        .map(heuristics::category_names)
        .unwrap_or_default();

    let mut profile = Map::new();
    profile.insert(
        "name".into(),
        props.get("name").cloned().unwrap_or_else(|| json!(name)),
    );
    profile.insert(
        "description".into(),
        prop("short_description")
            .or_else(|| props.get("description"))
            .cloned()
            .unwrap_or(Value::Null),
    );
    if let Some(site) = prop("website_url").and_then(Value::as_str) {
        profile.insert("domain".into(), json!(heuristics::extract_domain(site)));
    }
    if let Some(founded) = prop("founded_on") {
        profile.insert("founded_year".into(), json!(heuristics::parse_year(founded)));
    }
    if let Some(categories) = categories {
        profile.insert("categories".into(), categories.clone());
        profile.insert(
            "market_size".into(),
            json!(heuristics::market_bucket(&category_names)),
        );
    }
    if let Some(team) = prop("num_employees_enum") {
        profile.insert("team_size".into(), team.clone());
    }

    let stage = prop("last_funding_type")
        .and_then(Value::as_str)
        .map(heuristics::title_case)
        .unwrap_or_else(|| "Unknown".to_string());
    let valuation_known = props
        .get("valuation_at_last_funding")
        .and_then(|v| v.get("value_usd"))
        .is_some_and(truthy);
    let funding = json!({
        "stage": stage,
        "valuation_trend": if valuation_known { "Increased" } else { "Unknown" },
        "investor_quality": heuristics::investor_quality(investors),
        "round_count": props.get("num_funding_rounds"),
        "last_funding_on": props.get("last_funding_on"),
    });

    let founders: Vec<Value> = founders.iter().filter_map(map_founder).collect();

    let mut out = Payload::new();
    out.insert(PROFILE.into(), Value::Object(profile));
    out.insert(FUNDING.into(), funding);
    out.insert(FOUNDERS.into(), Value::Array(founders));
    out.insert(
        MARKET.into(),
        json!({
            "size_usd": heuristics::market_size_estimate(&category_names),
            "cagr": heuristics::market_cagr(&category_names),
        }),
    );
    out.insert(
        COMPETITION.into(),
        json!({
            "competitor_count": competitors.len(),
            "investor_diversity": heuristics::investor_diversity(investors),
        }),
    );
    out
}

/// Founder record from a Crunchbase person; `None` when it has no name
fn map_founder(item: &Value) -> Option<Value> {
    let props = item.get("properties")?;
    let name = props
        .pointer("/identifier/value")
        .or_else(|| props.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    let linkedin_url = match (
        props.get("linkedin_url").and_then(Value::as_str),
        props.get("permalink").and_then(Value::as_str),
    ) {
        (Some(url), _) if !url.is_empty() => Some(url.to_string()),
        (_, Some(permalink)) if !permalink.is_empty() => Some(format!(
            "https://www.linkedin.com/in/{}",
            permalink.rsplit('/').next().unwrap_or(permalink)
        )),
        _ => None,
    };
    let title = props.get("title").filter(|v| truthy(v));
    Some(json!({
        "name": name,
        "title": title,
        "linkedin_url": linkedin_url,
        "education_level": "Unknown",
        "school_tier": "Unknown",
        "leadership_experience": title.is_some(),
        "top_company_experience": false,
        "previous_exits": 0,
        "role_alignment": 0.0,
    }))
}
