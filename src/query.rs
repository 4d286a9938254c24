//! Input descriptor for one collection run.

use crate::error::{Result, SignalError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_industry() -> String {
    "AI".to_string()
}

fn default_stage() -> String {
    "seed".to_string()
}

fn default_region() -> String {
    "US".to_string()
}

/// Identifies the startup to collect signals for.
///
/// At least one of `name` or `domain` must be present; [`Query::validate`]
/// enforces this before any source is contacted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    /// Pre-annotated JSON seed payload, merged before any fetched data
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
    #[serde(default = "default_industry")]
    pub industry: String,
    #[serde(default = "default_stage")]
    pub stage: String,
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            name: None,
            domain: None,
            profile_path: None,
            industry: default_industry(),
            stage: default_stage(),
            region: default_region(),
        }
    }
}

impl Query {
    pub fn for_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_profile_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.profile_path = Some(path.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = industry.into();
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Name, if present and not blank
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Domain, if present and not blank
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Best keyword for free-text searches: the name, else the domain
    pub fn keyword(&self) -> Option<&str> {
        self.name().or_else(|| self.domain())
    }

    pub fn validate(&self) -> Result<()> {
        if self.keyword().is_none() {
            return Err(SignalError::InvalidQuery {
                message: "`name` or `domain` must be provided to fetch startup data".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let q = Query::for_name("Acme");
        assert_eq!(q.industry, "AI");
        assert_eq!(q.stage, "seed");
        assert_eq!(q.region, "US");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn blank_name_and_domain_is_invalid() {
        let q = Query {
            name: Some("   ".into()),
            domain: Some(String::new()),
            ..Default::default()
        };
        let err = q.validate().unwrap_err();
        assert!(matches!(err, SignalError::InvalidQuery { .. }));
    }

    #[test]
    fn domain_alone_is_enough() {
        let q = Query::for_domain("acme.io");
        assert!(q.validate().is_ok());
        assert_eq!(q.keyword(), Some("acme.io"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let q: Query = serde_json::from_str(r#"{"name": "Acme", "region": "EU"}"#).unwrap();
        assert_eq!(q.region, "EU");
        assert_eq!(q.stage, "seed");
        assert!(q.profile_path.is_none());
    }
}
