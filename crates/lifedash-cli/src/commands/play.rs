//! Playback command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use lifedash::{DashboardConfig, DashboardSnapshot, PlaybackDriver, PlayerCommand};

pub async fn run(
    input: PathBuf,
    mut config: DashboardConfig,
    period_ms: Option<u64>,
) -> Result<()> {
    if let Some(ms) = period_ms {
        config.playback_period = Duration::from_millis(ms);
        config.validate()?;
    }
    let session = super::open_session(&input, config).await?;

    let session = PlaybackDriver::run_script(session, vec![PlayerCommand::Play], print_frame).await;
    println!("Stopped at {}", session.snapshot().selection);
    Ok(())
}

fn print_frame(snapshot: &DashboardSnapshot) {
    let views = &snapshot.views;
    let countries = views.map.ready().map_or(0, |m| m.points.len());
    let fitted = views
        .scatter
        .ready()
        .map_or(0, |s| s.regressions.iter().filter(|r| r.line().is_some()).count());
    let top_auc = views
        .auc
        .ready()
        .and_then(|bars| bars.first())
        .map_or_else(|| "-".to_string(), |b| format!("{} {:.1}", b.group, b.auc_normalized));

    println!(
        "{:>10}  token {:<6} countries {:<4} fitted lines {:<2} top AUC {}",
        snapshot.selection.to_string(),
        snapshot.token.to_string(),
        countries,
        fitted,
        top_auc
    );
}
