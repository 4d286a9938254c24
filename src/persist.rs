//! Writes a feature set to disk: one-row CSV tables plus a JSON record list.

use crate::error::Result;
use crate::features::{FeatureMap, FeatureSet};
use crate::payload::label;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SSFF_FILE: &str = "features_ssff.csv";
pub const FOUNDER_FILE: &str = "features_founder.csv";
pub const EXTERNAL_FILE: &str = "features_external.json";

/// Save all three mappings under `base_path`, creating it if needed
pub fn save(features: &FeatureSet, base_path: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(base_path)?;

    let ssff = base_path.join(SSFF_FILE);
    write_table(&ssff, &features.features_ssff)?;
    let founder = base_path.join(FOUNDER_FILE);
    write_table(&founder, &features.features_founder)?;

    let external = base_path.join(EXTERNAL_FILE);
    write_records(
        BufWriter::new(File::create(&external)?),
        &features.features_external,
    )?;

    debug!("Wrote {}, {} and {}", ssff.display(), founder.display(), external.display());
    Ok(vec![ssff, founder, external])
}

/// Header row of feature names, one row of values
fn write_table(path: &Path, features: &FeatureMap) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(features.keys())?;
    writer.write_record(features.values().map(label))?;
    writer.flush()?;
    Ok(())
}

/// JSON array holding one record
fn write_records<W: Write>(mut writer: W, features: &FeatureMap) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &[features])?;
    writer.flush()?;
    Ok(())
}
