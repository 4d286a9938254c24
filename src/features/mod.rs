//! Feature blocks: stateless, deterministic transforms from a merged payload
//! to flat feature mappings.

pub mod external;
pub mod founder;
pub mod prediction;

use crate::payload::Payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use external::{ExternalKnowledgeBlock, SentimentSummary, summarise_sentiment};
pub use founder::{FounderFeatureBlock, FounderLevel, FounderProfile};
pub use prediction::{CATEGORICAL_DEFAULT, PredictionFeatureBlock, annotate_profile};

/// Flat feature mapping; values are always scalars
pub type FeatureMap = Map<String, Value>;

pub trait FeatureBlock: Send + Sync {
    fn name(&self) -> &'static str;
    fn build(&self, payload: &Payload) -> FeatureMap;
}

/// Output of one collection run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub features_ssff: FeatureMap,
    pub features_founder: FeatureMap,
    pub features_external: FeatureMap,
}

impl FeatureSet {
    pub const SSFF: &'static str = "features_ssff";
    pub const FOUNDER: &'static str = "features_founder";
    pub const EXTERNAL: &'static str = "features_external";

    /// Run all three blocks against the same payload
    pub fn build(payload: &Payload) -> Self {
        Self {
            features_ssff: run_block(&PredictionFeatureBlock, payload),
            features_founder: run_block(&FounderFeatureBlock, payload),
            features_external: run_block(&ExternalKnowledgeBlock, payload),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureMap> {
        match name {
            Self::SSFF => Some(&self.features_ssff),
            Self::FOUNDER => Some(&self.features_founder),
            Self::EXTERNAL => Some(&self.features_external),
            _ => None,
        }
    }

    /// The three mappings keyed by name, in a fixed order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureMap)> {
        [
            (Self::SSFF, &self.features_ssff),
            (Self::FOUNDER, &self.features_founder),
            (Self::EXTERNAL, &self.features_external),
        ]
        .into_iter()
    }
}

fn run_block(block: &dyn FeatureBlock, payload: &Payload) -> FeatureMap {
    let features = block.build(payload);
    tracing::trace!("{} produced {} features", block.name(), features.len());
    features
}
