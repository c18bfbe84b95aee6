use anyhow::{Context, Result};
use sequence_core::config::Config;
use sequence_core::Db;

pub fn run(config: &Config) -> Result<()> {
    let db = Db::open(&config.database.path).with_context(|| {
        format!(
            "failed to open database {}",
            config.database.path.display()
        )
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    let addr = config.bind_addr();
    rt.block_on(sequence_server::serve(db, &addr))
}
