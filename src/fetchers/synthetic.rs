//! Offline source: plausible, deterministic signals from static lookup tables.
//!
//! Industry, stage and region select a baseline; a blake3 hash of the startup's
//! identity adds stable per-startup jitter so different startups differ while
//! the same startup always yields the same payload.

use super::heuristics::{pmf_from_votes, sentiment_label};
use super::{Fetcher, SourceError, check_query};
use crate::features::annotate_profile;
use crate::payload::{
    COMPETITION, COMPLIANCE, FUNDING, HIRING, KNOWLEDGE, MARKET, PRODUCT, PROFILE, Payload,
    SENTIMENT,
};
use crate::query::Query;
use crate::utils::round_to;
use async_trait::async_trait;
use chrono::Datelike;
use serde_json::{Value, json};

struct IndustryBaseline {
    size_usd: f64,
    cagr: f64,
    market_size: &'static str,
    category: &'static str,
}

struct StageBaseline {
    label: &'static str,
    investor_quality: &'static str,
    valuation_trend: &'static str,
    age_years: i32,
}

fn industry_baseline(industry: &str) -> IndustryBaseline {
    let (size_usd, cagr, market_size, category) = match industry.trim().to_lowercase().as_str() {
        "ai" | "artificial intelligence" | "machine learning" | "ml" => {
            (80e9, 0.27, "Large", "Artificial Intelligence")
        }
        "fintech" | "financial services" => (60e9, 0.20, "Large", "FinTech"),
        "security" | "cybersecurity" | "compliance" => (25e9, 0.22, "Medium", "Security"),
        "health" | "healthtech" | "biotech" => (40e9, 0.18, "Large", "Health Care"),
        "climate" | "cleantech" | "energy" => (30e9, 0.24, "Medium", "Clean Energy"),
        "productivity" | "saas" | "collaboration" => (15e9, 0.15, "Medium", "Productivity"),
        _ => (10e9, 0.12, "Small", "Other"),
    };
    IndustryBaseline {
        size_usd,
        cagr,
        market_size,
        category,
    }
}

fn stage_baseline(stage: &str) -> StageBaseline {
    let normalized = stage.trim().to_lowercase().replace(['_', '-'], " ");
    let (label, investor_quality, valuation_trend, age_years) = match normalized.as_str() {
        "pre seed" | "preseed" | "idea" => ("Pre Seed", "Unknown", "Unknown", 1),
        "seed" | "angel" => ("Seed", "Recognized", "Unknown", 2),
        "series a" => ("Series A", "Recognized", "Increased", 4),
        "series b" | "series c" | "growth" => ("Series B", "Top-tier", "Increased", 6),
        _ => ("Unknown", "Unknown", "Unknown", 3),
    };
    StageBaseline {
        label,
        investor_quality,
        valuation_trend,
        age_years,
    }
}

/// Regulatory attention by region
fn regulation_mentions(region: &str) -> i64 {
    match region.trim().to_uppercase().as_str() {
        "EU" | "EUROPE" => 4,
        "UK" | "GB" => 3,
        "US" | "USA" => 2,
        _ => 1,
    }
}

/// Stable pseudo-random values in [0, 1) derived from the startup identity
struct Jitter {
    bytes: [u8; 32],
    cursor: usize,
}

impl Jitter {
    fn for_identity(identity: &str) -> Self {
        Self {
            bytes: *blake3::hash(identity.trim().to_lowercase().as_bytes()).as_bytes(),
            cursor: 0,
        }
    }

    fn sample(&mut self) -> f64 {
        let start = self.cursor % 32;
        self.cursor += 2;
        let raw = u16::from_le_bytes([self.bytes[start], self.bytes[(start + 1) % 32]]);
        f64::from(raw) / 65536.0
    }

    /// Uniform in [lo, hi)
    fn between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.sample()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticFetcher;

impl SyntheticFetcher {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, query: &Query) -> Payload {
        let Some(identity) = query.keyword() else {
            return Payload::new();
        };
        let industry = industry_baseline(&query.industry);
        let stage = stage_baseline(&query.stage);
        let mut jitter = Jitter::for_identity(identity);

        let growth_rate = round_to(industry.cagr + jitter.between(-0.03, 0.03), 3);
        let current_year = chrono::Utc::now().year();
        let mut profile = annotate_profile(
            query.domain().unwrap_or_default(),
            Some(current_year - stage.age_years),
            Some(growth_rate),
            Some(industry.market_size),
            Some(stage.label),
        );
        if query.domain().is_none() {
            profile.remove("domain");
        }
        if let Some(name) = query.name() {
            profile.insert("name".into(), json!(name));
        }
        profile.insert("categories".into(), json!([industry.category]));
        profile.insert(
            "update_frequency_per_month".into(),
            json!(jitter.between(2.0, 12.0).round() as i64),
        );

        let senior_ratio = round_to(jitter.between(0.1, 0.6), 2);
        let net_new_roles = jitter.between(0.0, 20.0).round() as i64;
        let votes = jitter.between(20.0, 800.0).round();
        let sentiment = round_to(jitter.between(-0.2, 0.6), 3);

        let mut out = Payload::new();
        out.insert(PROFILE.into(), Value::Object(profile));
        out.insert(
            FUNDING.into(),
            json!({
                "stage": stage.label,
                "valuation_trend": stage.valuation_trend,
                "investor_quality": stage.investor_quality,
            }),
        );
        out.insert(
            PRODUCT.into(),
            json!({
                "pmf": pmf_from_votes(votes, 0.0),
                "reviews": if sentiment > 0.2 { "Positive" } else { "Mixed" },
                "innovation_mentions": if industry.cagr >= 0.2 { "Often" } else { "Sometimes" },
                "frontier_tech_usage": if votes > 200.0 { "Emphasized" } else { "Mentioned" },
                "pivot_history": "Rarely",
                "release_frequency_per_quarter": jitter.between(1.0, 8.0).round() as i64,
            }),
        );
        out.insert(
            HIRING.into(),
            json!({
                "net_new_roles_last_quarter": net_new_roles,
                "senior_ratio": senior_ratio,
            }),
        );
        out.insert(
            SENTIMENT.into(),
            json!({
                "overall": sentiment_label(sentiment),
                "average": sentiment,
                "article_count": 0,
            }),
        );
        out.insert(
            MARKET.into(),
            json!({
                "size_usd": (industry.size_usd * jitter.between(0.8, 1.2)).round(),
                "cagr": industry.cagr,
            }),
        );
        out.insert(
            COMPETITION.into(),
            json!({
                "competitor_count": jitter.between(3.0, 30.0).round() as i64,
                "investor_diversity": round_to(jitter.between(0.0, 1.0), 2),
            }),
        );
        out.insert(
            COMPLIANCE.into(),
            json!({
                "patent_count": jitter.between(0.0, 8.0).round() as i64,
                "regulation_mentions": regulation_mentions(&query.region),
            }),
        );
        out.insert(
            KNOWLEDGE.into(),
            json!({
                "industry": query.industry,
                "stage": stage.label,
                "region": query.region,
                "source": "synthetic",
            }),
        );
        out
    }
}

#[async_trait]
impl Fetcher for SyntheticFetcher {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch(&self, query: &Query) -> Result<Payload, SourceError> {
        check_query(query)?;
        Ok(self.generate(query))
    }

    async fn fetch_many(&self, queries: &[Query]) -> Vec<Result<Payload, SourceError>> {
        queries
            .iter()
            .map(|q| check_query(q).map(|()| self.generate(q)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSet;

    #[test]
    fn same_startup_same_payload() {
        let q = Query::for_name("Acme").with_domain("acme.io");
        assert_eq!(SyntheticFetcher.generate(&q), SyntheticFetcher.generate(&q));
    }

    #[test]
    fn different_startups_differ() {
        let a = SyntheticFetcher.generate(&Query::for_name("Acme"));
        let b = SyntheticFetcher.generate(&Query::for_name("Globex"));
        assert_ne!(a, b);
    }

    #[test]
    fn tables_drive_the_baseline() {
        let q = Query::for_name("Acme")
            .with_industry("FinTech")
            .with_stage("series_a")
            .with_region("EU");
        let out = SyntheticFetcher.generate(&q);
        assert_eq!(out["profile"]["market_size"], "Large");
        assert_eq!(out["funding"]["stage"], "Series A");
        assert_eq!(out["funding"]["valuation_trend"], "Increased");
        assert_eq!(out["market"]["cagr"], 0.2);
        assert_eq!(out["compliance"]["regulation_mentions"], 4);
        assert_eq!(out["knowledge"]["region"], "EU");
    }

    #[test]
    fn jittered_values_stay_in_range() {
        for name in ["a", "b", "c", "d", "e", "f"] {
            let out = SyntheticFetcher.generate(&Query::for_name(name));
            let ratio = out["hiring"]["senior_ratio"].as_f64().unwrap();
            assert!((0.1..=0.6).contains(&ratio));
            let diversity = out["competition"]["investor_diversity"].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&diversity));
            let growth = out["profile"]["market_growth_rate"].as_f64().unwrap();
            assert!((0.24..=0.30).contains(&growth));
        }
    }

    #[test]
    fn domain_only_query_keeps_domain_and_omits_name() {
        let out = SyntheticFetcher.generate(&Query::for_domain("acme.io"));
        assert_eq!(out["profile"]["domain"], "acme.io");
        assert!(out["profile"].get("name").is_none());
    }

    #[test]
    fn empty_query_yields_nothing() {
        assert!(SyntheticFetcher.generate(&Query::default()).is_empty());
    }

    #[test]
    fn feeds_every_feature_block() {
        let set = FeatureSet::build(&SyntheticFetcher.generate(&Query::for_name("Acme")));
        assert_eq!(set.features_ssff["market_size"], "Large");
        assert_eq!(set.features_ssff["industry_growth"], "Yes");
        assert_ne!(set.features_ssff["growth_speed"], "Unknown");
        assert_ne!(set.features_ssff["execution_capability"], "Unknown");
        assert!(set.features_external["market_size_usd"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn batch_matches_single_fetches() {
        let queries = [Query::for_name("Acme"), Query::default()];
        let batch = SyntheticFetcher.fetch_many(&queries).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch[0].as_ref().unwrap(),
            &SyntheticFetcher.fetch(&queries[0]).await.unwrap()
        );
        assert!(matches!(batch[1], Err(SourceError::InvalidQuery { .. })));
        assert!(matches!(
            SyntheticFetcher.fetch(&Query::default()).await,
            Err(SourceError::InvalidQuery { .. })
        ));
    }
}
