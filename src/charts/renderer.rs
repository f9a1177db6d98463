//! Static Chart Renderer
//! Rasterizes a chart [`Scene`] to PNG, following plotly's paint order:
//!
//! 1. Background, gridlines and zero line
//! 2. Depth stems
//! 3. Bubbles, then the color legend
//! 4. Tick labels, axis title and text labels
//! 5. Flags, composited last
//!
//! Lines, markers and text are drawn by plotters into an RGB buffer; images are
//! scaled and blended with the `image` crate.

use image::{imageops, DynamicImage, GenericImageView, ImageFormat, RgbImage, RgbaImage};
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, Circle, Color, DrawingArea, FontStyle, FontTransform, IntoDrawingArea,
    IntoFont, PathElement, RGBColor, Rectangle, Text,
};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use super::colors::{self, Rgb};
use super::flags::FlagSource;
use super::scene::{Coords, FlagBox, HAnchor, Scene, TextLabel, TextStyle};
use super::RenderError;

const FONT_FAMILY: &str = "sans-serif";
/// Gap between the top of the plot and the year labels.
const TICK_LABEL_GAP: f64 = 6.0;

/// Maps data and paper coordinates to pixels inside the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    x_range: [f64; 2],
    y_range: [f64; 2],
}

impl PlotFrame {
    pub fn from_scene(scene: &Scene) -> Self {
        let (l, r, t, b) = scene.margin;
        Self {
            left: f64::from(l),
            top: f64::from(t),
            width: f64::from(scene.width.saturating_sub(l + r)),
            height: f64::from(scene.height.saturating_sub(t + b)),
            x_range: scene.x_range,
            y_range: scene.y_range,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// `range[0]` sits at the left edge.
    pub fn x_px(&self, v: f64) -> f64 {
        self.left + fraction(v, self.x_range) * self.width
    }

    /// `range[0]` sits at the bottom edge, so a descending range grows downwards.
    pub fn y_px(&self, v: f64) -> f64 {
        self.bottom() - fraction(v, self.y_range) * self.height
    }

    pub fn paper_x(&self, p: f64) -> f64 {
        self.left + p * self.width
    }

    pub fn paper_y(&self, p: f64) -> f64 {
        self.bottom() - p * self.height
    }

    pub fn to_px(&self, x: f64, y: f64, coords: Coords) -> (f64, f64) {
        match coords {
            Coords::Data => (self.x_px(x), self.y_px(y)),
            Coords::Paper => (self.paper_x(x), self.paper_y(y)),
        }
    }
}

fn fraction(v: f64, [start, end]: [f64; 2]) -> f64 {
    if end == start {
        0.0
    } else {
        (v - start) / (end - start)
    }
}

fn px(v: f64) -> i32 {
    v.round() as i32
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn format_tick(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Size of an `image_size` image scaled to fit inside `bounds`, aspect kept.
pub fn contain(image_size: (u32, u32), bounds: (f64, f64)) -> (u32, u32) {
    let (iw, ih) = (image_size.0 as f64, image_size.1 as f64);
    if iw <= 0.0 || ih <= 0.0 {
        return (0, 0);
    }
    let scale = (bounds.0 / iw).min(bounds.1 / ih);
    (
        (iw * scale).round().max(1.0) as u32,
        (ih * scale).round().max(1.0) as u32,
    )
}

/// Drawing state for one raster pass.
struct Painter<'a> {
    root: DrawingArea<BitMapBackend<'a>, Shift>,
    frame: PlotFrame,
    skipped_text: usize,
}

impl<'a> Painter<'a> {
    fn line(&self, from: (f64, f64), to: (f64, f64), color: Rgb, width: f64) -> Result<(), RenderError> {
        let style = rgb(color).stroke_width(width.round().max(1.0) as u32);
        self.root
            .draw(&PathElement::new(
                vec![(px(from.0), px(from.1)), (px(to.0), px(to.1))],
                style,
            ))
            .map_err(|e| RenderError::Drawing(e.to_string()))
    }

    fn rect(&self, top_left: (i32, i32), bottom_right: (i32, i32), color: Rgb) -> Result<(), RenderError> {
        self.root
            .draw(&Rectangle::new([top_left, bottom_right], rgb(color).filled()))
            .map_err(|e| RenderError::Drawing(e.to_string()))
    }

    /// Text is best-effort: without a usable system font it is counted and skipped.
    fn text(&mut self, text: &str, at: (f64, f64), style: &TextStyle, pos: Pos, vertical: bool) {
        if text.trim().is_empty() {
            return;
        }

        let weight = if style.bold {
            FontStyle::Bold
        } else {
            FontStyle::Normal
        };
        let mut font = (FONT_FAMILY, style.size)
            .into_font()
            .style(weight)
            .color(&rgb(style.color))
            .pos(pos);
        if vertical {
            font = font.transform(FontTransform::Rotate270);
        }

        if let Err(e) = self.root.draw(&Text::new(text, (px(at.0), px(at.1)), font)) {
            debug!(text, error = %e, "label not drawn");
            self.skipped_text += 1;
        }
    }

    /// Depth gridlines, then the thicker surface line.
    fn grid(&self, scene: &Scene) -> Result<(), RenderError> {
        let f = self.frame;
        for &v in &scene.depth_grid {
            let py = f.y_px(v);
            self.line((f.left, py), (f.right(), py), scene.grid_color, 1.0)?;
        }

        let lo = scene.y_range[0].min(scene.y_range[1]);
        let hi = scene.y_range[0].max(scene.y_range[1]);
        if lo <= 0.0 && 0.0 <= hi {
            let py = f.y_px(0.0);
            self.line((f.left, py), (f.right(), py), scene.grid_color, scene.zero_line_width)?;
        }
        Ok(())
    }

    fn stems(&self, scene: &Scene) -> Result<(), RenderError> {
        for stem in &scene.stems {
            let from = (self.frame.x_px(stem.x), self.frame.y_px(0.0));
            let to = (self.frame.x_px(stem.x), self.frame.y_px(stem.depth));
            self.line(from, to, scene.stem_color, scene.stem_width)?;
        }
        Ok(())
    }

    fn bubbles(&self, scene: &Scene) -> Result<(), RenderError> {
        for bubble in &scene.bubbles {
            let diameter = bubble.size.max(scene.bubble_min_size);
            let radius = (diameter / 2.0).round().max(1.0) as i32;
            let center = (px(self.frame.x_px(bubble.x)), px(self.frame.y_px(bubble.y)));
            self.root
                .draw(&Circle::new(center, radius, rgb(bubble.color).filled()))
                .map_err(|e| RenderError::Drawing(e.to_string()))?;
        }
        Ok(())
    }

    fn legend(&mut self, scene: &Scene) -> Result<(), RenderError> {
        let legend = &scene.legend;
        let f = self.frame;
        let length = legend.len * f.width;
        let x0 = f.paper_x(legend.x);
        let bottom = f.paper_y(legend.y);
        let top = bottom - legend.thickness;

        let columns = length.round().max(1.0) as i32;
        for col in 0..columns {
            let t = (col as f64 + 0.5) / columns as f64;
            let x = px(x0) + col;
            self.rect((x, px(top)), (x, px(bottom)), legend.scale.color_at(t))?;
        }

        let tick_style = TextStyle::new(12.0, colors::DARK_GRAY);
        for &v in &legend.tickvals {
            let t = colors::normalize(v, legend.domain);
            self.text(
                &format_tick(v),
                (x0 + t * length, bottom + 3.0),
                &tick_style,
                Pos::new(HPos::Center, VPos::Top),
                false,
            );
        }

        self.text(
            &legend.title,
            (x0 + length / 2.0, top - 4.0),
            &TextStyle::new(14.0, colors::DARK_GRAY),
            Pos::new(HPos::Center, VPos::Bottom),
            false,
        );
        Ok(())
    }

    /// Year labels above the plot, read bottom to top, and the depth axis title.
    fn axis_labels(&mut self, scene: &Scene) {
        let f = self.frame;
        for &v in &scene.year_ticks {
            self.text(
                &format_tick(v),
                (f.x_px(v), f.top - TICK_LABEL_GAP),
                &scene.tick_style,
                Pos::new(HPos::Left, VPos::Center),
                true,
            );
        }

        self.text(
            &scene.y_title,
            (f.left / 2.0, f.top + f.height / 2.0),
            &scene.y_title_style,
            Pos::new(HPos::Center, VPos::Center),
            true,
        );
    }

    fn label(&mut self, label: &TextLabel) {
        let at = self.frame.to_px(label.x, label.y, label.coords);
        let h = match label.h {
            HAnchor::Left => HPos::Left,
            HAnchor::Center => HPos::Center,
            HAnchor::Right => HPos::Right,
        };
        self.text(&label.text, at, &label.style, Pos::new(h, VPos::Center), false);
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Rasterize `scene` at its layout size. Flags come from `flags`; a flag
    /// that cannot be fetched is left out.
    pub fn render(scene: &Scene, flags: &mut dyn FlagSource) -> Result<RgbaImage, RenderError> {
        let (width, height) = (scene.width, scene.height);
        let frame = PlotFrame::from_scene(scene);
        let mut buf = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
            root.fill(&rgb(colors::WHITE))
                .map_err(|e| RenderError::Drawing(e.to_string()))?;

            let mut painter = Painter {
                root,
                frame,
                skipped_text: 0,
            };
            painter.grid(scene)?;
            painter.stems(scene)?;
            painter.bubbles(scene)?;
            painter.legend(scene)?;
            painter.axis_labels(scene);
            for label in &scene.labels {
                painter.label(label);
            }

            if painter.skipped_text > 0 {
                warn!(
                    count = painter.skipped_text,
                    "text labels could not be drawn, is a system font installed?"
                );
            }
            painter
                .root
                .present()
                .map_err(|e| RenderError::Drawing(e.to_string()))?;
        }

        let canvas = RgbImage::from_raw(width, height, buf)
            .ok_or_else(|| RenderError::Drawing("pixel buffer size mismatch".to_string()))?;
        let mut canvas = DynamicImage::ImageRgb8(canvas).to_rgba8();

        let placed = scene
            .flags
            .iter()
            .filter(|flag| Self::place_flag(&mut canvas, &frame, flag, flags))
            .count();
        debug!(placed, total = scene.flags.len(), "composited flags");

        Ok(canvas)
    }

    /// Render and write the PNG in one step.
    pub fn save_png(
        scene: &Scene,
        flags: &mut dyn FlagSource,
        path: &Path,
    ) -> Result<(), RenderError> {
        let image = Self::render(scene, flags)?;

        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        fs::write(path, &bytes).map_err(|source| RenderError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), bytes = bytes.len(), "wrote PNG image");
        Ok(())
    }

    /// Scale the flag to fit its box and overlay it, left edge on `x`, centered on `y`.
    fn place_flag(
        canvas: &mut RgbaImage,
        frame: &PlotFrame,
        flag: &FlagBox,
        flags: &mut dyn FlagSource,
    ) -> bool {
        let source = match flags.fetch(&flag.url) {
            Ok(img) => img,
            Err(e) => {
                warn!(url = %flag.url, error = %e, "flag unavailable, leaving it out");
                return false;
            }
        };

        let (x0, y0) = frame.to_px(flag.x, flag.y, Coords::Data);
        let (x1, y1) = frame.to_px(flag.x + flag.width, flag.y + flag.height, Coords::Data);
        let (w, h) = contain(
            (source.width(), source.height()),
            ((x1 - x0).abs(), (y1 - y0).abs()),
        );
        if w == 0 || h == 0 {
            return false;
        }

        let top = y0 - f64::from(h) / 2.0;
        let scaled = source
            .resize_exact(w, h, imageops::FilterType::Triangle)
            .to_rgba8();
        imageops::overlay(canvas, &scaled, x0.round() as i64, top.round() as i64);
        true
    }
}
