//! External knowledge block: quantitative market, competition and compliance
//! signals, optionally enriched with scalar knowledge fields.

use super::{FeatureBlock, FeatureMap};
use crate::payload::{
    self, COMPETITION, COMPLIANCE, KNOWLEDGE, MARKET, Payload, SENTIMENT, integer_or_zero,
    number_or_zero,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub struct ExternalKnowledgeBlock;

impl FeatureBlock for ExternalKnowledgeBlock {
    fn name(&self) -> &'static str {
        "external_block"
    }

    fn build(&self, payload: &Payload) -> FeatureMap {
        let market = payload::section(payload, MARKET);
        let competition = payload::section(payload, COMPETITION);
        let sentiment = payload::section(payload, SENTIMENT);
        let compliance = payload::section(payload, COMPLIANCE);

        let mut out = FeatureMap::new();
        out.insert("market_size_usd".into(), json!(number_or_zero(market, "size_usd")));
        out.insert("cagr".into(), json!(number_or_zero(market, "cagr")));
        out.insert(
            "competitor_count".into(),
            json!(integer_or_zero(competition, "competitor_count")),
        );
        out.insert(
            "average_sentiment".into(),
            json!(number_or_zero(sentiment, "average")),
        );
        out.insert(
            "patent_count".into(),
            json!(integer_or_zero(compliance, "patent_count")),
        );
        out.insert(
            "regulation_mentions".into(),
            json!(integer_or_zero(compliance, "regulation_mentions")),
        );
        out.insert(
            "investor_diversity".into(),
            json!(number_or_zero(competition, "investor_diversity")),
        );

        // Nested knowledge would break flatness; only scalars are carried
        for (key, value) in payload::section(payload, KNOWLEDGE) {
            if matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
                out.insert(format!("knowledge_{}", key), value.clone());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub average: f64,
    pub std: f64,
    pub count: usize,
}

/// Mean, population standard deviation and count of named sentiment scores
pub fn summarise_sentiment(scores: &BTreeMap<String, f64>) -> SentimentSummary {
    if scores.is_empty() {
        return SentimentSummary {
            average: 0.0,
            std: 0.0,
            count: 0,
        };
    }
    let n = scores.len() as f64;
    let mean = scores.values().sum::<f64>() / n;
    let variance = scores.values().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    SentimentSummary {
        average: mean,
        std: variance.sqrt(),
        count: scores.len(),
    }
}
