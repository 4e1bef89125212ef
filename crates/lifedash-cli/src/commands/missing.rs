//! Missing-data command.

use std::path::PathBuf;

use anyhow::Result;
use lifedash::{DashboardConfig, YearKey};

pub async fn run(input: PathBuf, config: DashboardConfig, year: Option<i32>) -> Result<()> {
    let session = super::open_session(&input, config).await?;
    let key = year.map_or(YearKey::All, YearKey::Year);

    println!("Missing data, {key}");
    println!("{:-<60}", "");
    println!("{:<20} {:>10} {:>10} {:>10}", "Field", "Missing", "Total", "Ratio");

    let Some(rows) = session.missingness().lookup(key) else {
        println!("No rows for {key}");
        return Ok(());
    };
    for row in rows {
        println!(
            "{:<20} {:>10} {:>10} {:>9.1}%",
            row.field.name(),
            row.missing_count,
            row.total_count,
            row.ratio * 100.0
        );
    }
    Ok(())
}
