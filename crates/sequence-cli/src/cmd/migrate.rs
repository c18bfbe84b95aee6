use anyhow::{Context, Result};
use sequence_core::Db;
use std::path::Path;

pub fn run(path: &Path) -> Result<()> {
    let db = Db::open(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    let version = db.schema_version()?;
    println!("migrated {} (schema version {version})", path.display());
    Ok(())
}
