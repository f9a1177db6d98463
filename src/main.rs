//! Quake Chart - Deadliest earthquakes timeline
//!
//! Reads `data/raw/earthquakes.csv` and writes the chart as an embeddable HTML
//! fragment and a PNG image under `reports/`.

mod app;
mod charts;
mod config;
mod data;

use charts::HttpFlagSource;
use config::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::default();
    let mut flags = HttpFlagSource::new();
    app::run(&config, &mut flags)
}
