//! OpenCorporates company search. Works without a token at a lower rate limit.

use super::{Fetcher, SourceError, check_query};
use crate::http::CachedClient;
use crate::payload::{COMPLIANCE, PROFILE, Payload};
use crate::query::Query;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const SEARCH_URL: &str = "https://api.opencorporates.com/v0.4/companies/search";

pub struct OpenCorporatesFetcher {
    client: Arc<CachedClient>,
    token: Option<String>,
}

impl OpenCorporatesFetcher {
    pub fn new(client: Arc<CachedClient>, token: Option<String>) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl Fetcher for OpenCorporatesFetcher {
    fn name(&self) -> &'static str {
        "opencorporates"
    }

    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
        check_query(query)?;
        let Some(name) = query.name() else {
            return Ok(Payload::new());
        };
        let mut params = vec![("q", name.to_string())];
        if let Some(token) = &self.token {
            params.push(("api_token", token.clone()));
        }
        let data = self.client.get_json(SEARCH_URL, &params, &[]).await?;
        Ok(parse_companies(&data))
    }
}

pub fn parse_companies(data: &Value) -> Payload {
    let Some(company) = data.pointer("/results/companies/0/company") else {
        return Payload::new();
    };
    let field = |key: &str| company.get(key).cloned().unwrap_or(Value::Null);
    let mut out = Payload::new();
    out.insert(
        COMPLIANCE.into(),
        json!({
            "jurisdiction": field("jurisdiction_code"),
            "incorporation_date": field("incorporation_date"),
            "company_number": field("company_number"),
        }),
    );
    out.insert(PROFILE.into(), json!({"legal_name": field("name")}));
    out
}
