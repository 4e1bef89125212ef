//! Summary command.

use std::path::PathBuf;

use anyhow::Result;
use lifedash::stats::Summary;
use lifedash::{DashboardConfig, narrate};

pub async fn run(input: PathBuf, config: DashboardConfig) -> Result<()> {
    let session = super::open_session(&input, config).await?;
    let dataset = session.dataset();

    println!("Dataset: {}", input.display());
    println!("{:-<60}", "");
    println!("Rows:      {}", dataset.len());
    println!("Countries: {}", dataset.country_count());
    println!("Regions:   {}", dataset.regions().len());
    let years = dataset.year_domain();
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => {
            println!("Years:     {first}-{last} ({} distinct)", years.years().len());
        }
        _ => println!("Years:     none"),
    }

    let life: Vec<f64> = dataset.records().iter().filter_map(|r| r.life_expectancy).collect();
    if let Some(summary) = Summary::compute(&life) {
        println!("Life expectancy:");
        println!("  Mean: {:.2}, Median: {:.2}", summary.mean, summary.median);
        println!("  Min: {:.2}, Max: {:.2}", summary.min, summary.max);
        println!("  StdDev: {:.2}", summary.std_dev);
    }

    let co2: Vec<f64> = dataset.records().iter().filter_map(|r| r.co2).collect();
    if let Some(summary) = Summary::compute(&co2) {
        println!("CO₂:");
        println!("  Mean: {:.1}, Median: {:.1}", summary.mean, summary.median);
        println!("  Min: {:.1}, Max: {:.1}", summary.min, summary.max);
    }

    println!();
    println!("Insights:");
    println!("{:-<60}", "");
    let insights = narrate(session.snapshot(), dataset);
    for (view, line) in insights.lines() {
        println!("[{view}] {line}");
    }

    Ok(())
}
