//! Product Hunt GraphQL: launch traction as product-market-fit signals.

use super::heuristics::{pmf_from_votes, release_frequency};
use super::{Fetcher, SourceError, check_query};
use crate::http::CachedClient;
use crate::payload::{PRODUCT, Payload, as_number};
use crate::query::Query;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const GRAPHQL_URL: &str = "https://api.producthunt.com/v2/api/graphql";

const POST_QUERY: &str = r#"
query ProductSignal($term: String!) {
  posts(order: RANKING, first: 1, query: $term) {
    edges {
      node {
        name
        tagline
        votesCount
        commentsCount
        featuredAt
        reviewsRating
      }
    }
  }
}
"#;

pub struct ProductHuntFetcher {
    client: Arc<CachedClient>,
    token: Option<String>,
}

impl ProductHuntFetcher {
    pub fn new(client: Arc<CachedClient>, token: Option<String>) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl Fetcher for ProductHuntFetcher {
    fn name(&self) -> &'static str {
        "producthunt"
    }

    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
        check_query(query)?;
        let (Some(name), Some(token)) = (query.name(), self.token.as_deref()) else {
            return Ok(Payload::new());
        };
        let body = json!({"query": POST_QUERY, "variables": {"term": name}});
        let headers = [("Authorization", format!("Bearer {}", token))];
        let data = self.client.post_json(GRAPHQL_URL, &body, &headers).await?;
        Ok(parse_post(&data))
    }
}

pub fn parse_post(data: &Value) -> Payload {
    let Some(node) = data.pointer("/data/posts/edges/0/node") else {
        return Payload::new();
    };
    let number = |key: &str| node.get(key).and_then(as_number).unwrap_or(0.0);
    let votes = number("votesCount");
    let comments = number("commentsCount");
    let rating = number("reviewsRating");
    let well_rated = rating >= 3.5;

    let mut out = Payload::new();
    out.insert(
        PRODUCT.into(),
        json!({
            "tagline": node.get("tagline"),
            "pmf": pmf_from_votes(votes, rating),
            "innovation_mentions": if well_rated { "Often" } else { "Sometimes" },
            "frontier_tech_usage": if votes > 200.0 { "Emphasized" } else { "Mentioned" },
            "reviews": if well_rated { "Positive" } else { "Mixed" },
            "pivot_history": if comments > 10.0 { "Sometimes" } else { "Rarely" },
            "release_frequency_per_quarter": release_frequency(node.get("featuredAt")),
        }),
    );
    out
}
