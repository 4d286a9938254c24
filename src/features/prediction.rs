//! Prediction block: categorical startup fundamentals.

use super::{FeatureBlock, FeatureMap};
use crate::payload::{
    self, FUNDING, HIRING, PRODUCT, PROFILE, Payload, SENTIMENT, as_number, present, truthy,
};
use chrono::Datelike;
use serde_json::{Map, Value, json};

pub const CATEGORICAL_DEFAULT: &str = "Unknown";

pub struct PredictionFeatureBlock;

impl FeatureBlock for PredictionFeatureBlock {
    fn name(&self) -> &'static str {
        "prediction_block"
    }

    fn build(&self, payload: &Payload) -> FeatureMap {
        let profile = payload::section(payload, PROFILE);
        let funding = payload::section(payload, FUNDING);
        let sentiment = payload::section(payload, SENTIMENT);
        let product = payload::section(payload, PRODUCT);
        let hiring = payload::section(payload, HIRING);

        let fields: [(&str, String); 14] = [
            ("industry_growth", industry_growth(profile)),
            ("market_size", passthrough(profile, "market_size")),
            ("growth_speed", growth_speed(profile, hiring)),
            ("market_adaptability", passthrough(product, "pivot_history")),
            ("execution_capability", execution_capability(product, hiring)),
            ("funding_amount", passthrough(funding, "stage")),
            ("valuation_trend", passthrough(funding, "valuation_trend")),
            ("investor_quality", passthrough(funding, "investor_quality")),
            ("pmf_strength", passthrough(product, "pmf")),
            ("innovation_mentions", passthrough(product, "innovation_mentions")),
            ("frontier_tech_usage", passthrough(product, "frontier_tech_usage")),
            ("timing", passthrough(profile, "timing")),
            ("sentiment", passthrough(sentiment, "overall")),
            ("reviews", passthrough(product, "reviews")),
        ];
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v)))
            .collect()
    }
}

fn passthrough(section: &Map<String, Value>, key: &str) -> String {
    present(section, key)
        .map(payload::label)
        .unwrap_or_else(|| CATEGORICAL_DEFAULT.to_string())
}

fn industry_growth(profile: &Map<String, Value>) -> String {
    if let Some(explicit) = profile.get("industry_growth").filter(|v| truthy(v)) {
        return payload::label(explicit);
    }
    let Some(rate) = present(profile, "market_growth_rate").and_then(as_number) else {
        return CATEGORICAL_DEFAULT.to_string();
    };
    if rate >= 0.15 {
        "Yes".to_string()
    } else if rate <= 0.0 {
        "No".to_string()
    } else {
        "N/A".to_string()
    }
}

fn growth_speed(profile: &Map<String, Value>, hiring: &Map<String, Value>) -> String {
    let updates = present(profile, "update_frequency_per_month");
    let hires = present(hiring, "net_new_roles_last_quarter");
    if updates.is_none() && hires.is_none() {
        return CATEGORICAL_DEFAULT.to_string();
    }
    let coerce = |v: Option<&Value>| v.and_then(as_number).unwrap_or(0.0);
    let score = coerce(updates) * 0.6 + coerce(hires) * 0.4;
    let speed = if score > 8.0 {
        "Faster"
    } else if score < 3.0 {
        "Slower"
    } else {
        "Same"
    };
    speed.to_string()
}

fn execution_capability(product: &Map<String, Value>, hiring: &Map<String, Value>) -> String {
    let release_freq = present(product, "release_frequency_per_quarter");
    let senior_ratio = present(hiring, "senior_ratio");
    if release_freq.is_none() && senior_ratio.is_none() {
        return CATEGORICAL_DEFAULT.to_string();
    }
    let mut score = 0.0;
    if let Some(v) = release_freq {
        score += as_number(v).unwrap_or(0.0) / 4.0;
    }
    if let Some(v) = senior_ratio {
        score += as_number(v).unwrap_or(0.0) * 2.0;
    }
    let capability = if score > 1.6 {
        "Excellent"
    } else if score < 0.8 {
        "Poor"
    } else {
        "Average"
    };
    capability.to_string()
}

/// Build a sample `profile` section, used by fixtures and the synthetic source
pub fn annotate_profile(
    domain: &str,
    founded_year: Option<i32>,
    market_growth_rate: Option<f64>,
    market_size: Option<&str>,
    latest_funding_stage: Option<&str>,
) -> Map<String, Value> {
    let age = founded_year.map(|year| chrono::Utc::now().year() - year);
    let profile = json!({
        "domain": domain,
        "founded_year": founded_year,
        "age": age,
        "market_growth_rate": market_growth_rate,
        "market_size": market_size.unwrap_or(CATEGORICAL_DEFAULT),
        "industry_growth": null,
        "update_frequency_per_month": 4,
        "timing": "JustRight",
        "latest_funding_stage": latest_funding_stage,
    });
    match profile {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
