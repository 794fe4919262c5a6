pub mod formatter;

pub use formatter::{
    format_results_json, format_results_table, format_results_tsv, format_score,
    format_summary_json, format_summary_table, format_summary_tsv, should_use_colors,
};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

/// Write rendered output to a file, replacing it atomically.
/// A trailing newline is added if missing.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(contents.as_bytes())
        .context("Failed to write output")?;
    if !contents.ends_with('\n') {
        file.write_all(b"\n").context("Failed to write output")?;
    }

    file.commit()
        .with_context(|| format!("Failed to write output to {}", path.display()))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_write_output_adds_newline() {
        let path = env::temp_dir().join("perf360_test_output.tsv");
        let _ = fs::remove_file(&path);

        write_output(&path, "a\tb").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\tb\n");

        write_output(&path, "replaced\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "replaced\n");

        let _ = fs::remove_file(&path);
    }
}
