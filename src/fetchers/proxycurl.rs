//! Proxycurl founder enrichment from LinkedIn profiles.

use super::heuristics::{
    ALIGNED_ROLE, LEADERSHIP_TITLE, TOP_COMPANIES, infer_school_tier, normalize_degree,
};
use super::{FounderEnricher, SourceError};
use crate::features::FounderProfile;
use crate::http::CachedClient;
use crate::utils::join_bounded;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

const EMPLOYEE_SEARCH_URL: &str =
    "https://nubela.co/proxycurl/api/linkedin/company/employees/search/";
const PROFILE_URL: &str = "https://nubela.co/proxycurl/api/v2/linkedin";

pub struct ProxycurlEnricher {
    client: Arc<CachedClient>,
    api_key: String,
    max_concurrency: usize,
}

impl ProxycurlEnricher {
    pub fn new(client: Arc<CachedClient>, api_key: String, max_concurrency: usize) -> Self {
        Self {
            client,
            api_key,
            max_concurrency,
        }
    }

    fn headers(&self) -> [(&'static str, String); 1] {
        [("Authorization", format!("Bearer {}", self.api_key))]
    }

    async fn find_linkedin_url(
        &self,
        name: &str,
        domain: &str,
    ) -> Result<Option<String>, SourceError> {
        let params = [
            ("employment_role", "founder".to_string()),
            ("company_domain", domain.to_string()),
            ("page_size", "1".to_string()),
            ("search_term", name.to_string()),
        ];
        let search = self
            .client
            .get_json(EMPLOYEE_SEARCH_URL, &params, &self.headers())
            .await?;
        Ok(search
            .pointer("/employees/0/linkedin_profile_url")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn enrich_one(&self, founder: Value, domain: Option<&str>) -> Value {
        let Some(record) = founder.as_object() else {
            return founder;
        };
        let name = record.get("name").and_then(Value::as_str);
        let mut linkedin_url = record
            .get("linkedin_url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if linkedin_url.is_none()
            && let (Some(name), Some(domain)) = (name, domain)
        {
            linkedin_url = match self.find_linkedin_url(name, domain).await {
                Ok(url) => url,
                Err(e) => {
                    debug!("Founder search failed for {}: {}", name, e);
                    None
                }
            };
        }

        let Some(url) = linkedin_url else {
            return FounderProfile::from_record(record).to_record();
        };
        match self
            .client
            .get_json(PROFILE_URL, &[("url", url)], &self.headers())
            .await
        {
            Ok(profile) => map_profile(name, &profile),
            Err(e) => {
                warn!("Profile lookup failed for {}: {}", name.unwrap_or("founder"), e);
                FounderProfile::from_record(record).to_record()
            }
        }
    }
}

#[async_trait]
impl FounderEnricher for ProxycurlEnricher {
    fn name(&self) -> &'static str {
        "proxycurl"
    }

    async fn enrich(&self, founders: Vec<Value>, domain: Option<&str>) -> Vec<Value> {
        let tasks = founders
            .into_iter()
            .map(|founder| self.enrich_one(founder, domain));
        join_bounded(self.max_concurrency, tasks).await
    }
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Founder record from a Proxycurl person profile
pub fn map_profile(fallback_name: Option<&str>, profile: &Value) -> Value {
    let (education_level, school_tier) = match profile.pointer("/education/0") {
        Some(top) => {
            let school = text(top, "school");
            let tier = if school.is_empty() {
                "Unknown"
            } else {
                infer_school_tier(&school)
            };
            (normalize_degree(&text(top, "degree_name")), tier)
        }
        None => ("Unknown".to_string(), "Unknown"),
    };

    let experience = profile
        .get("experience")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let leadership = experience
        .iter()
        .any(|exp| LEADERSHIP_TITLE.is_match(&text(exp, "title")));
    let top_company = experience.iter().any(|exp| {
        let company = text(exp, "company").to_lowercase();
        TOP_COMPANIES.iter().any(|k| company.contains(k))
    });
    let exits = experience
        .iter()
        .filter(|exp| text(exp, "description").to_lowercase().contains("acquired"))
        .count();
    let current: Vec<&Value> = experience
        .iter()
        .filter(|exp| exp.get("current").and_then(Value::as_bool).unwrap_or(false))
        .collect();
    let role_alignment = if current.is_empty() {
        0.0
    } else {
        let aligned = current
            .iter()
            .filter(|exp| ALIGNED_ROLE.is_match(&text(exp, "title")))
            .count();
        (aligned as f64 / current.len() as f64).min(1.0)
    };

    let name = profile
        .get("full_name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or(fallback_name)
        .unwrap_or("Unknown");
    json!({
        "name": name,
        "education_level": education_level,
        "school_tier": school_tier,
        "leadership_experience": leadership,
        "top_company_experience": top_company,
        "previous_exits": exits,
        "role_alignment": role_alignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_profile_signals() {
        let profile = json!({
            "full_name": "Ada Lovelace",
            "education": [{"degree_name": "PhD, Mathematics", "school": "University of Cambridge"}],
            "experience": [
                {"title": "Co-Founder & CEO", "company": "Acme", "current": true},
                {"title": "Research Engineer", "company": "Google", "current": true},
                {"title": "Engineer", "company": "Startup", "description": "Company was acquired by BigCo"}
            ]
        });
        let record = map_profile(Some("Ada"), &profile);
        assert_eq!(record["name"], "Ada Lovelace");
        assert_eq!(record["education_level"], "PhD");
        assert_eq!(record["school_tier"], "Tier-1");
        assert_eq!(record["leadership_experience"], true);
        assert_eq!(record["top_company_experience"], true);
        assert_eq!(record["previous_exits"], 1);
        assert_eq!(record["role_alignment"], 0.5);
    }

    #[test]
    fn empty_profile_uses_fallbacks() {
        let record = map_profile(Some("Grace"), &json!({}));
        assert_eq!(record["name"], "Grace");
        assert_eq!(record["education_level"], "Unknown");
        assert_eq!(record["school_tier"], "Unknown");
        assert_eq!(record["role_alignment"], 0.0);
        assert_eq!(map_profile(None, &json!({}))["name"], "Unknown");
    }

    #[tokio::test]
    async fn founders_without_profiles_keep_defaults_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(CachedClient::new(dir.path(), Duration::from_millis(200)).unwrap());
        let enricher = ProxycurlEnricher::new(client, "key".into(), 2);
        let founders = vec![
            json!({"name": "Ada", "previous_exits": 1}),
            json!("not a record"),
            json!({"name": "Grace", "education_level": "Masters"}),
        ];
        // No linkedin url and no domain: nothing is requested
        let out = enricher.enrich(founders, None).await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["name"], "Ada");
        assert_eq!(out[0]["previous_exits"], 1);
        assert_eq!(out[0]["school_tier"], "Unknown");
        assert_eq!(out[1], json!("not a record"));
        assert_eq!(out[2]["education_level"], "Masters");
    }
}
