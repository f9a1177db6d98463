//! Charts module - chart building and rendering

mod colors;
mod flags;
mod html;
mod plotter;
mod renderer;
mod scene;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use flags::{FlagSource, HttpFlagSource};
pub use html::HtmlExporter;
pub use plotter::{Chart, ChartPlotter};
pub use renderer::StaticChartRenderer;

#[cfg(test)]
pub use flags::testing;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize figure: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to draw chart: {0}")]
    Drawing(String),
    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}
