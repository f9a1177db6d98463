//! Chart Scene
//! Backend-neutral chart geometry in data and paper coordinates. The plotter
//! builds it next to the plotly figure; the raster renderer draws from it.

use super::colors::{Colorscale, Rgb};

/// Which coordinate system a position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coords {
    /// Axis values: years horizontally, kilometres of depth vertically.
    Data,
    /// 0..1 across the plot area, 1 at the top.
    Paper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAnchor {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: Rgb,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f64, color: Rgb) -> Self {
        Self {
            size,
            color,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A plain-text label, vertically centered on `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub coords: Coords,
    pub h: HAnchor,
    pub style: TextStyle,
}

/// Vertical line from the surface down to the quake's depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stem {
    pub x: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bubble {
    pub x: f64,
    pub y: f64,
    /// Diameter in pixels before the minimum size is applied.
    pub size: f64,
    pub color: Rgb,
}

/// Flag box in data units, anchored at its left edge and vertical middle.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagBox {
    pub url: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Horizontal color legend. `x` is the left edge, `y` the bottom edge, both in paper units.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLegend {
    pub x: f64,
    pub y: f64,
    /// Fraction of the plot width.
    pub len: f64,
    pub thickness: f64,
    pub scale: Colorscale,
    pub domain: (f64, f64),
    pub tickvals: Vec<f64>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    /// Left, right, top, bottom.
    pub margin: (u32, u32, u32, u32),
    /// `x_range[0]` is at the left edge.
    pub x_range: [f64; 2],
    /// `y_range[0]` is at the bottom edge, so a descending range flips the axis.
    pub y_range: [f64; 2],
    pub year_ticks: Vec<f64>,
    pub tick_style: TextStyle,
    /// Drawn vertically, centered in the left margin.
    pub y_title: String,
    pub y_title_style: TextStyle,
    pub depth_grid: Vec<f64>,
    pub grid_color: Rgb,
    pub zero_line_width: f64,
    pub stem_color: Rgb,
    pub stem_width: f64,
    pub stems: Vec<Stem>,
    pub bubbles: Vec<Bubble>,
    /// Smaller bubbles are drawn at this diameter.
    pub bubble_min_size: f64,
    pub legend: ColorLegend,
    pub labels: Vec<TextLabel>,
    pub flags: Vec<FlagBox>,
}
