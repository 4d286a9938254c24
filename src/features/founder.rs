//! Founder segmentation block.

use super::{FeatureBlock, FeatureMap};
use crate::payload::{self, FOUNDERS, Payload, as_integer, as_number, present, truthy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

/// Ordinal founding-team tier, L1 lowest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FounderLevel {
    L1,
    L2,
    L3,
    L4,
    L5,
}

impl FounderLevel {
    pub const ALL: [FounderLevel; 5] = [
        FounderLevel::L1,
        FounderLevel::L2,
        FounderLevel::L3,
        FounderLevel::L4,
        FounderLevel::L5,
    ];

    pub fn from_score(avg: f64) -> Self {
        if avg >= 5.0 {
            FounderLevel::L5
        } else if avg >= 4.0 {
            FounderLevel::L4
        } else if avg >= 3.0 {
            FounderLevel::L3
        } else if avg >= 1.5 {
            FounderLevel::L2
        } else {
            FounderLevel::L1
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FounderLevel::L1 => "L1",
            FounderLevel::L2 => "L2",
            FounderLevel::L3 => "L3",
            FounderLevel::L4 => "L4",
            FounderLevel::L5 => "L5",
        }
    }
}

impl fmt::Display for FounderLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FounderProfile {
    pub name: String,
    pub education_level: String,
    pub school_tier: String,
    pub leadership_experience: bool,
    pub top_company_experience: bool,
    pub previous_exits: u32,
    /// Clamped to [-1, 1]
    pub role_alignment: f64,
}

impl Default for FounderProfile {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            education_level: "Unknown".to_string(),
            school_tier: "Unknown".to_string(),
            leadership_experience: false,
            top_company_experience: false,
            previous_exits: 0,
            role_alignment: 0.0,
        }
    }
}

impl FounderProfile {
    /// Parse a loosely typed founder record, defaulting every missing field
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            present(record, key)
                .map(payload::label)
                .unwrap_or_else(|| "Unknown".to_string())
        };
        let flag = |key: &str| record.get(key).is_some_and(truthy);
        Self {
            name: text("name"),
            education_level: text("education_level"),
            school_tier: text("school_tier"),
            leadership_experience: flag("leadership_experience"),
            top_company_experience: flag("top_company_experience"),
            previous_exits: present(record, "previous_exits")
                .and_then(as_integer)
                .unwrap_or(0)
                .clamp(0, i64::from(u32::MAX)) as u32,
            role_alignment: present(record, "role_alignment")
                .and_then(as_number)
                .unwrap_or(0.0)
                .clamp(-1.0, 1.0),
        }
    }

    /// Back to the record shape other sources and the merge engine understand
    pub fn to_record(&self) -> Value {
        json!({
            "name": self.name,
            "education_level": self.education_level,
            "school_tier": self.school_tier,
            "leadership_experience": self.leadership_experience,
            "top_company_experience": self.top_company_experience,
            "previous_exits": self.previous_exits,
            "role_alignment": self.role_alignment,
        })
    }

    pub fn score(&self) -> f64 {
        let mut score = education_score(&self.education_level, &self.school_tier);
        if self.leadership_experience {
            score += 1.0;
        }
        if self.top_company_experience {
            score += 1.5;
        }
        score + f64::from(self.previous_exits.min(2)) * 1.5
    }
}

pub fn education_score(level: &str, tier: &str) -> f64 {
    let base = match level.trim().to_lowercase().as_str() {
        "phd" => 2.5,
        "masters" => 2.0,
        "bachelors" => 1.5,
        "associate" => 1.0,
        _ => 0.5,
    };
    let tier_bonus = match tier.trim().to_lowercase().as_str() {
        "tier-1" => 1.5,
        "tier-2" => 1.0,
        "tier-3" => 0.5,
        _ => 0.0,
    };
    base + tier_bonus
}

pub struct FounderFeatureBlock;

impl FounderFeatureBlock {
    /// Mapping-typed entries of `founders`; anything else is not a founder record
    pub fn profiles(payload: &Payload) -> Vec<FounderProfile> {
        payload::records(payload, FOUNDERS)
            .iter()
            .filter_map(Value::as_object)
            .map(FounderProfile::from_record)
            .collect()
    }
}

impl FeatureBlock for FounderFeatureBlock {
    fn name(&self) -> &'static str {
        "founder_block"
    }

    fn build(&self, payload: &Payload) -> FeatureMap {
        let founders = Self::profiles(payload);
        let mut out = FeatureMap::new();
        if founders.is_empty() {
            out.insert("founder_level".into(), json!(FounderLevel::L1.as_str()));
            out.insert("fifs_score".into(), json!(0.0));
            out.insert("founder_count".into(), json!(0));
            return out;
        }

        let count = founders.len() as f64;
        let avg_score = founders.iter().map(FounderProfile::score).sum::<f64>() / count;
        let fifs = (founders.iter().map(|f| f.role_alignment).sum::<f64>() / count).clamp(-1.0, 1.0);

        out.insert(
            "founder_level".into(),
            json!(FounderLevel::from_score(avg_score).as_str()),
        );
        out.insert("fifs_score".into(), json!(fifs));
        out.insert("founder_count".into(), json!(founders.len()));
        out
    }
}
