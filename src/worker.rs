use std::fs;
use std::thread;
use std::time::Duration;
use anyhow::Result;
use log::info;
use crate::config::Config;
use crate::dashboard::{page, Dashboard, ViewState};
use crate::snapshot::now_jst;

/// Renders the page once from the current snapshot
///
/// # Arguments
///
/// * 'config' - configuration
pub fn render_once(config: &Config) -> Result<()> {
    let mut dashboard = Dashboard::new(&config.files.data_path(&config.files.snapshot_file));
    dashboard.refresh();
    publish(config, &dashboard)
}

/// Keeps the page up to date. The snapshot is re-read every refresh interval, while in
/// errored state a retry is made after the (shorter) retry interval instead.
///
/// # Arguments
///
/// * 'config' - configuration
pub fn run(config: &Config) -> Result<()> {
    let refresh = Duration::from_secs(config.dashboard.refresh_minutes * 60);
    let retry = Duration::from_secs(config.dashboard.retry_seconds);

    let mut dashboard = Dashboard::new(&config.files.data_path(&config.files.snapshot_file));
    dashboard.refresh();

    loop {
        publish(config, &dashboard)?;

        if let ViewState::Errored(_) = dashboard.state() {
            thread::sleep(retry);
            dashboard.retry();
        } else {
            thread::sleep(refresh);
            dashboard.refresh();
        }
    }
}

/// Writes the rendered page to the configured page file
fn publish(config: &Config, dashboard: &Dashboard) -> Result<()> {
    let html = page::render(dashboard, config.dashboard.refresh_minutes, now_jst());
    fs::write(&config.files.page_file, html)?;
    info!("page written to {}", config.files.page_file);

    Ok(())
}
