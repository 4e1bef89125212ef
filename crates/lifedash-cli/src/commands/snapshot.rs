//! Snapshot command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lifedash::DashboardConfig;

use super::FilterArgs;

pub async fn run(
    input: PathBuf,
    config: DashboardConfig,
    filters: FilterArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut session = super::open_session(&input, config).await?;
    filters.apply(&mut session)?;

    let json = serde_json::to_string_pretty(session.snapshot())?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote snapshot {} to {}", session.snapshot().token, path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
