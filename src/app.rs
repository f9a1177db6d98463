//! Quake Chart application flow.
//! Load the dataset, build the chart, write the HTML fragment and the PNG.

use anyhow::Context;
use tracing::info;

use crate::charts::{ChartPlotter, FlagSource, HtmlExporter, StaticChartRenderer};
use crate::config::AppConfig;
use crate::data::DataLoader;

/// Run the whole pipeline once. Any failure aborts; there is no partial-output cleanup.
pub fn run(config: &AppConfig, flags: &mut dyn FlagSource) -> anyhow::Result<()> {
    let paths = &config.paths;

    let records = DataLoader::read_records(&paths.input).map_err(|e| {
        let what = if e.is_format_error() {
            "Malformed earthquake data in"
        } else {
            "Loading earthquake data from"
        };
        anyhow::Error::new(e).context(format!("{what} {}", paths.input.display()))
    })?;
    info!(
        path = %paths.input.display(),
        records = records.len(),
        "loaded earthquake records"
    );

    let chart = ChartPlotter::build_figure(&records, &config.chart);

    HtmlExporter::write_fragment(&chart, &paths.html).context("Writing HTML chart")?;
    StaticChartRenderer::save_png(&chart.scene, flags, &paths.png).context("Writing PNG chart")?;

    Ok(())
}
