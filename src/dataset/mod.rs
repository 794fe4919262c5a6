mod types;
pub mod validation;

pub use types::{
    Dataset, Dimension, DimensionScore, Employee, EvaluationRecord, RecordStatus, Task,
};
pub use validation::{score_in_range, validate_dataset};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    /// Pick the format from the file extension. Anything that is not
    /// `.yaml`/`.yml` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DataFormat::Yaml
            }
            _ => DataFormat::Json,
        }
    }
}

/// Load a dataset snapshot from a JSON or YAML file
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - The content cannot be parsed
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        anyhow::bail!("Dataset file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset at {}", path.display()))?;

    let dataset: Dataset = match DataFormat::from_path(path) {
        DataFormat::Json => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset: invalid JSON in {}", path.display()))?,
        DataFormat::Yaml => serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse dataset: invalid YAML in {}", path.display()))?,
    };

    tracing::debug!(
        path = %path.display(),
        tasks = dataset.tasks.len(),
        employees = dataset.employees.len(),
        records = dataset.records.len(),
        "loaded dataset"
    );

    Ok(dataset)
}

/// Save a dataset snapshot atomically, in the format implied by the path.
///
/// The file is never left half-written: content goes to a temporary file
/// that replaces the target on commit.
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    match DataFormat::from_path(path) {
        DataFormat::Json => {
            serde_json::to_writer_pretty(&mut file, dataset)
                .context("Failed to serialize dataset")?;
            file.write_all(b"\n").context("Failed to write dataset")?;
        }
        DataFormat::Yaml => {
            let yaml = serde_saphyr::to_string(dataset)
                .map_err(|e| anyhow::anyhow!("Failed to serialize dataset: {}", e))?;
            file.write_all(yaml.as_bytes())
                .context("Failed to write dataset")?;
        }
    }

    file.commit()
        .with_context(|| format!("Failed to save dataset to {}", path.display()))?;

    Ok(())
}
