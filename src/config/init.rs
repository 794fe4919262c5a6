use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{ensure_config_dir, Config};
use crate::scoring::{DepartmentRating, ScoringConfig};

/// The starter config: every scoring parameter spelled out at its default.
pub fn default_config_yaml() -> Result<String> {
    let config = Config {
        department_rating: Some(DepartmentRating::default()),
        dataset: None,
        scoring: Some(ScoringConfig::default()),
    };
    serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
}

/// Write the starter config to `config_path`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_default_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    let yaml = default_config_yaml()?;
    ensure_config_dir(config_path)?;
    std::fs::write(config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    tracing::info!(path = %config_path.display(), "wrote default config");
    Ok(())
}
