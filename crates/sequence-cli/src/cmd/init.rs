use anyhow::{Context, Result};
use sequence_core::config::Config;
use std::path::Path;

/// Write a config file with every default spelled out. An existing file is
/// left alone.
pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        println!("{} already exists, leaving it unchanged", path.display());
        return Ok(());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
