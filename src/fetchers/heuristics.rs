//! Static lookup tables and text heuristics shared by the live sources.

use crate::utils::round_to;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeSet;

const POSITIVE_WORDS: &[&str] = &[
    "growth",
    "record",
    "expansion",
    "partnership",
    "award",
    "funding",
    "increase",
    "positive",
    "leader",
];

const NEGATIVE_WORDS: &[&str] = &[
    "scam", "fraud", "lawsuit", "decline", "layoff", "negative", "loss", "risk", "slowdown",
];

const AI_CATEGORIES: &[&str] = &["artificial intelligence", "machine learning", "ai"];
const FINANCE_CATEGORIES: &[&str] = &["fintech", "financial services"];
const TRUST_CATEGORIES: &[&str] = &["security", "privacy", "compliance"];
const RISK_CATEGORIES: &[&str] = &["fraud detection", "security", "compliance"];
const WORKPLACE_CATEGORIES: &[&str] = &["productivity", "collaboration"];

const TOP_TIER_INVESTORS: &[&str] = &["sequoia", "a16z", "benchmark", "accel", "yc"];

const TIER_1_SCHOOLS: &[&str] = &[
    "stanford",
    "mit",
    "harvard",
    "oxford",
    "cambridge",
    "berkeley",
    "princeton",
];
const TIER_2_SCHOOLS: &[&str] = &["waterloo", "imperial", "cornell", "columbia", "ucla", "tsinghua"];

pub const TOP_COMPANIES: &[&str] = &[
    "google",
    "meta",
    "microsoft",
    "amazon",
    "apple",
    "openai",
    "mckinsey",
];

pub static SENIORITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)senior|lead|principal").expect("valid seniority regex"));

pub static LEADERSHIP_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ceo|cto|head)\b|founder").expect("valid leadership regex"));

pub static ALIGNED_ROLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ai|ml|product|research|engineering)\b").expect("valid role regex")
});

/// Host part of a URL or bare domain; the input itself when it cannot be parsed
pub fn extract_domain(url: &str) -> String {
    let trimmed = url.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    Url::parse(&candidate)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| trimmed.to_string())
}

/// Leading four-digit year of a date string, or an integer year
pub fn parse_year(value: &Value) -> Option<i32> {
    match value {
        Value::String(s) => s.get(..4)?.parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        _ => None,
    }
}

/// Lowercased category names from strings or `{value|name: ...}` objects
pub fn category_names(categories: &Value) -> BTreeSet<String> {
    let Value::Array(items) = categories else {
        return BTreeSet::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.to_lowercase()),
            Value::Object(obj) => obj
                .get("value")
                .or_else(|| obj.get("name"))
                .and_then(Value::as_str)
                .map(str::to_lowercase),
            _ => None,
        })
        .collect()
}

fn any_of(names: &BTreeSet<String>, table: &[&str]) -> bool {
    table.iter().any(|t| names.contains(*t))
}

pub fn market_bucket(categories: &BTreeSet<String>) -> &'static str {
    if categories.is_empty() {
        "Unknown"
    } else if any_of(categories, AI_CATEGORIES) || any_of(categories, FINANCE_CATEGORIES) {
        "Large"
    } else if any_of(categories, TRUST_CATEGORIES) {
        "Medium"
    } else {
        "Small"
    }
}

/// Rough total addressable market in USD
pub fn market_size_estimate(categories: &BTreeSet<String>) -> Option<f64> {
    if categories.is_empty() {
        None
    } else if any_of(categories, AI_CATEGORIES) {
        Some(80e9)
    } else if any_of(categories, RISK_CATEGORIES) {
        Some(25e9)
    } else if any_of(categories, WORKPLACE_CATEGORIES) {
        Some(15e9)
    } else {
        Some(10e9)
    }
}

pub fn market_cagr(categories: &BTreeSet<String>) -> f64 {
    if categories.is_empty() {
        0.12
    } else if any_of(categories, AI_CATEGORIES) {
        0.27
    } else if any_of(categories, RISK_CATEGORIES) {
        0.22
    } else {
        0.15
    }
}

fn investor_name(investor: &Value) -> String {
    investor
        .get("name")
        .or_else(|| investor.pointer("/properties/identifier/value"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

pub fn investor_quality(investors: &[Value]) -> &'static str {
    if investors.is_empty() {
        return "Unknown";
    }
    let top_tier = investors.iter().any(|investor| {
        let name = investor_name(investor);
        TOP_TIER_INVESTORS.iter().any(|k| name.contains(k))
    });
    if top_tier {
        "Top-tier"
    } else if investors.len() >= 3 {
        "Recognized"
    } else {
        "Unknown"
    }
}

/// Distinct investor locations over five, capped at 1.0
pub fn investor_diversity(investors: &[Value]) -> f64 {
    let locations: BTreeSet<&str> = investors
        .iter()
        .filter_map(|investor| {
            investor
                .pointer("/properties/location")
                .or_else(|| investor.pointer("/location_identifiers/0/value"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .collect();
    round_to((locations.len() as f64 / 5.0).min(1.0), 2)
}

/// Lexicon polarity in [-1, 1]; 0.0 when no lexicon word occurs
pub fn sentiment_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let count = |words: &[&str]| -> usize { words.iter().map(|w| lower.matches(w).count()).sum() };
    let positive = count(POSITIVE_WORDS);
    let negative = count(NEGATIVE_WORDS);
    let total = positive + negative;
    if total == 0 {
        return 0.0;
    }
    (positive as f64 - negative as f64) / total as f64
}

pub fn sentiment_label(average: f64) -> &'static str {
    if average > 0.2 {
        "Positive"
    } else if average < -0.2 {
        "Negative"
    } else {
        "Neutral"
    }
}

pub fn infer_school_tier(school: &str) -> &'static str {
    let name = school.to_lowercase();
    if TIER_1_SCHOOLS.iter().any(|k| name.contains(k)) {
        "Tier-1"
    } else if TIER_2_SCHOOLS.iter().any(|k| name.contains(k)) {
        "Tier-2"
    } else {
        "Tier-3"
    }
}

/// Canonical education level for a free-text degree name
pub fn normalize_degree(degree: &str) -> String {
    let d = degree.trim().to_lowercase();
    if d.contains("phd") || d.contains("doctor") {
        "PhD".to_string()
    } else if d.contains("master") || d.contains("msc") {
        "Masters".to_string()
    } else if d.contains("bachelor") || d.contains("bsc") {
        "Bachelors".to_string()
    } else if d.is_empty() {
        "Unknown".to_string()
    } else {
        title_case(&d)
    }
}

pub fn pmf_from_votes(votes: f64, rating: f64) -> &'static str {
    let score = votes + rating * 20.0;
    if score > 500.0 {
        "Strong"
    } else if score > 150.0 {
        "Moderate"
    } else {
        "Weak"
    }
}

/// Featured products are assumed to ship on a faster cadence
pub fn release_frequency(featured_at: Option<&Value>) -> i64 {
    match featured_at {
        Some(v) if crate::payload::truthy(v) => 6,
        _ => 2,
    }
}

/// "series_a" → "Series A"
pub fn title_case(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn domains_from_urls_and_bare_hosts() {
        assert_eq!(extract_domain("https://www.acme.io/about"), "www.acme.io");
        assert_eq!(extract_domain("acme.io"), "acme.io");
        assert_eq!(extract_domain("http://acme.io:8080"), "acme.io");
    }

    #[test]
    fn years_from_dates_and_numbers() {
        assert_eq!(parse_year(&json!("2019-04-01")), Some(2019));
        assert_eq!(parse_year(&json!(2021)), Some(2021));
        assert_eq!(parse_year(&json!("soon")), None);
        assert_eq!(parse_year(&json!("19")), None);
        assert_eq!(parse_year(&json!(null)), None);
    }

    #[test]
    fn categories_accept_strings_and_identifiers() {
        let names = category_names(&json!(["AI", {"value": "Fintech"}, {"name": "Security"}, 3]));
        assert_eq!(names.len(), 3);
        assert!(names.contains("fintech"));
        assert!(category_names(&json!("ai")).is_empty());
    }

    #[test]
    fn market_tables() {
        let ai = category_names(&json!(["Machine Learning"]));
        assert_eq!(market_bucket(&ai), "Large");
        assert_eq!(market_size_estimate(&ai), Some(80e9));
        assert_eq!(market_cagr(&ai), 0.27);

        let security = category_names(&json!(["Security"]));
        assert_eq!(market_bucket(&security), "Medium");
        assert_eq!(market_size_estimate(&security), Some(25e9));
        assert_eq!(market_cagr(&security), 0.22);

        let other = category_names(&json!(["Gardening"]));
        assert_eq!(market_bucket(&other), "Small");
        assert_eq!(market_size_estimate(&other), Some(10e9));
        assert_eq!(market_cagr(&other), 0.15);

        let none = BTreeSet::new();
        assert_eq!(market_bucket(&none), "Unknown");
        assert_eq!(market_size_estimate(&none), None);
        assert_eq!(market_cagr(&none), 0.12);
    }

    #[test]
    fn investor_quality_tiers() {
        assert_eq!(investor_quality(&[json!({"name": "Sequoia Capital"})]), "Top-tier");
        assert_eq!(
            investor_quality(&[json!({"name": "A"}), json!({"name": "B"}), json!({"name": "C"})]),
            "Recognized"
        );
        assert_eq!(investor_quality(&[json!({"name": "Angel"})]), "Unknown");
        assert_eq!(investor_quality(&[]), "Unknown");
    }

    #[test]
    fn investor_diversity_counts_distinct_locations() {
        let investors = [
            json!({"properties": {"location": "SF"}}),
            json!({"properties": {"location": "SF"}}),
            json!({"location_identifiers": [{"value": "London"}]}),
            json!({"name": "no location"}),
        ];
        assert_eq!(investor_diversity(&investors), 0.4);
        assert_eq!(investor_diversity(&[]), 0.0);
    }

    #[test]
    fn sentiment_lexicon() {
        assert_eq!(sentiment_score("Record growth after new funding"), 1.0);
        assert_eq!(sentiment_score("Lawsuit alleges fraud"), -1.0);
        assert_eq!(sentiment_score("Growth despite lawsuit"), 0.0);
        assert_eq!(sentiment_score("nothing to see"), 0.0);
        assert_eq!(sentiment_label(0.5), "Positive");
        assert_eq!(sentiment_label(-0.21), "Negative");
        assert_eq!(sentiment_label(0.2), "Neutral");
    }

    #[test]
    fn education_heuristics() {
        assert_eq!(normalize_degree("Doctor of Philosophy"), "PhD");
        assert_eq!(normalize_degree("MSc Computer Science"), "Masters");
        assert_eq!(normalize_degree("BSc"), "Bachelors");
        assert_eq!(normalize_degree("associate degree"), "Associate Degree");
        assert_eq!(normalize_degree(""), "Unknown");
        assert_eq!(infer_school_tier("Stanford University"), "Tier-1");
        assert_eq!(infer_school_tier("University of Waterloo"), "Tier-2");
        assert_eq!(infer_school_tier("State College"), "Tier-3");
    }

    #[test]
    fn product_heuristics() {
        assert_eq!(pmf_from_votes(450.0, 4.0), "Strong");
        assert_eq!(pmf_from_votes(100.0, 3.0), "Moderate");
        assert_eq!(pmf_from_votes(10.0, 0.0), "Weak");
        assert_eq!(release_frequency(Some(&json!("2024-01-01"))), 6);
        assert_eq!(release_frequency(Some(&json!(null))), 2);
        assert_eq!(release_frequency(None), 2);
    }

    #[test]
    fn title_case_funding_types() {
        assert_eq!(title_case("series_a"), "Series A");
        assert_eq!(title_case("PRE_SEED"), "Pre Seed");
    }

    #[test]
    fn title_patterns() {
        assert!(SENIORITY.is_match("Senior Engineer"));
        assert!(LEADERSHIP_TITLE.is_match("Co-Founder & CEO"));
        assert!(!LEADERSHIP_TITLE.is_match("Engineer"));
        assert!(ALIGNED_ROLE.is_match("Head of AI"));
        assert!(!ALIGNED_ROLE.is_match("Maintainer"));
    }
}
