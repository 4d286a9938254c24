//! Startup signal collection: concurrent fetchers, a deterministic merge engine
//! and three feature blocks producing flat feature mappings.

pub mod collector;
pub mod config;
pub mod error;
pub mod features;
pub mod fetchers;
pub mod http;
pub mod merge;
pub mod payload;
pub mod persist;
pub mod query;
pub mod utils;

pub use collector::{Collector, run_from_config};
pub use config::{RuntimeConfig, SourceMode};
pub use error::{Result, SignalError};
pub use features::{FeatureBlock, FeatureSet, FounderLevel};
pub use fetchers::{Fetcher, FounderEnricher, SourceError};
pub use payload::Payload;
pub use query::Query;
