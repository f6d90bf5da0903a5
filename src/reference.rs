use anyhow::{Context, Result};
use std::path::Path;

use stargazer_geo_core::ReferenceData;

use crate::config::ReferenceConfig;

/// Read both reference datasets from disk and build the lookup tables.
pub fn load_reference(config: &ReferenceConfig) -> Result<ReferenceData> {
    let countries = read_dataset(&config.countries)?;
    let cities = read_dataset(&config.cities)?;
    let data = ReferenceData::from_json(&countries, &cities)?;
    tracing::debug!(
        countries = data.countries().len(),
        aliases = data.aliases().len(),
        "loaded reference data"
    );
    Ok(data)
}

fn read_dataset(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference dataset: {}", path.display()))
}
