//! Chart Plotter Module
//! Builds the earthquake timeline from loaded records: a plotly figure for the
//! interactive output and a matching scene for the raster output.

use plotly::color::Rgba;
use plotly::common::{
    Anchor, AxisSide, ColorBar, Font, Label, Marker, Mode, Orientation, SizeMode, ThicknessMode,
    TickMode, Title,
};
use plotly::layout::{Annotation, Axis, Margin, Shape, ShapeLayer, ShapeLine, ShapeType, TicksDirection};
use plotly::{Configuration, Layout, Plot, Scatter};

use crate::config::ChartSettings;
use crate::data::EarthquakeRecord;

use super::colors::{
    magnitude_band, magnitude_band_colors, Colorscale, Rgb, BLACK, DARK_GRAY, GAINSBORO, WHITE,
};
use super::scene::{
    Bubble, ColorLegend, Coords, FlagBox, HAnchor, Scene, Stem, TextLabel, TextStyle,
};

const STEM_WIDTH: f64 = 2.0;
const ZERO_LINE_WIDTH: f64 = 2.0;
/// Flag boxes sit just right of the stem, near the top of the plot.
const FLAG_X_OFFSET: f64 = 0.1;
const FLAG_Y: f64 = 2.0;
const FLAG_SIZE: (f64, f64) = (1.0, 2.5);
/// Depth labels are drawn just inside the left edge, slightly above their gridline.
const DEPTH_LABEL_X_OFFSET: f64 = 0.75;
const DEPTH_LABEL_Y_OFFSET: f64 = 2.25;
const TITLE_POS: (f64, f64) = (-0.03, 1.16);
const LEGEND_POS: (f64, f64) = (0.5, 0.35);
const LEGEND_LEN: f64 = 0.4;
const LEGEND_THICKNESS: f64 = 10.0;

const HOVER_TEMPLATE: &str = "%{hovertext}<br>\
Depth: %{y} km<br>\
Magnitude: %{marker.color}<extra></extra>";

/// The same chart for both outputs.
pub struct Chart {
    pub plot: Plot,
    pub scene: Scene,
}

/// Creates the earthquake timeline chart.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Marker diameter for a fatality count.
    pub fn marker_size(fatalities: u64, scale: f64) -> f64 {
        scale * (fatalities as f64).sqrt()
    }

    /// Build the complete chart: stems, bubbles, flags, axes and annotations.
    pub fn build_figure(records: &[EarthquakeRecord], settings: &ChartSettings) -> Chart {
        let notes = Self::notes(settings);
        let scene = Self::build_scene(records, settings, &notes);

        let mut plot = Plot::new();
        plot.add_trace(Self::scatter_trace(records, settings, &scene));
        plot.set_layout(Self::layout(settings, &scene, &notes));
        plot.set_configuration(Configuration::new().responsive(true));

        Chart { plot, scene }
    }

    fn build_scene(
        records: &[EarthquakeRecord],
        settings: &ChartSettings,
        notes: &[Note],
    ) -> Scene {
        let (top, bottom) = settings.depth_range;
        let (first, last) = settings.tick_years;
        let band_colors = magnitude_band_colors();
        let label_style = TextStyle::new(12.0, DARK_GRAY).bold();

        Scene {
            width: settings.width,
            height: settings.height,
            margin: settings.margin,
            x_range: [settings.year_range.0, settings.year_range.1],
            // depth grows downwards, so the deepest value sits at the bottom edge
            y_range: [bottom, top],
            year_ticks: (first..=last).map(f64::from).collect(),
            tick_style: label_style,
            y_title: "Depth".to_string(),
            y_title_style: TextStyle::new(14.0, DARK_GRAY).bold(),
            depth_grid: Self::depth_steps(top, bottom, settings.depth_step),
            grid_color: GAINSBORO,
            zero_line_width: ZERO_LINE_WIDTH,
            stem_color: GAINSBORO,
            stem_width: STEM_WIDTH,
            stems: records
                .iter()
                .map(|r| Stem {
                    x: f64::from(r.year),
                    depth: r.depth_km,
                })
                .collect(),
            bubbles: records
                .iter()
                .map(|r| Bubble {
                    x: f64::from(r.year),
                    y: r.depth_km,
                    size: Self::marker_size(r.fatalities, settings.marker_scale),
                    color: band_colors[magnitude_band(
                        r.max_magnitude,
                        settings.magnitude_domain,
                        band_colors.len(),
                    )],
                })
                .collect(),
            bubble_min_size: settings.marker_size_min,
            legend: ColorLegend {
                x: LEGEND_POS.0,
                y: LEGEND_POS.1,
                len: LEGEND_LEN,
                thickness: LEGEND_THICKNESS,
                scale: Colorscale::quantized(&band_colors),
                domain: settings.magnitude_domain,
                tickvals: Self::legend_ticks(settings.magnitude_domain),
                title: "Magnitude".to_string(),
            },
            labels: notes.iter().map(|n| n.label.clone()).collect(),
            flags: records
                .iter()
                .map(|r| FlagBox {
                    url: settings.flag_url(&r.flag_code),
                    x: f64::from(r.year) + FLAG_X_OFFSET,
                    y: FLAG_Y,
                    width: FLAG_SIZE.0,
                    height: FLAG_SIZE.1,
                })
                .collect(),
        }
    }

    fn scatter_trace(
        records: &[EarthquakeRecord],
        settings: &ChartSettings,
        scene: &Scene,
    ) -> Box<Scatter<f64, f64>> {
        let legend = &scene.legend;
        let (cmin, cmax) = legend.domain;
        let plot_width = settings.width.saturating_sub(settings.margin.0 + settings.margin.1);

        let colorbar = ColorBar::new()
            .orientation(Orientation::Horizontal)
            .x(legend.x)
            .y(legend.y)
            .x_anchor(Anchor::Left)
            // the crate takes an integral length, so give it in pixels
            .len_mode(ThicknessMode::Pixels)
            .len((legend.len * f64::from(plot_width)).round() as usize)
            .thickness(legend.thickness as usize)
            .tick_vals(legend.tickvals.clone())
            .tick_font(font(12, DARK_GRAY))
            .title(Title::from(legend.title.as_str()).font(font(14, DARK_GRAY)))
            .outline_width(0);

        let marker = Marker::new()
            .size_array(scene.bubbles.iter().map(|b| b.size.round() as usize).collect())
            .size_mode(SizeMode::Diameter)
            .size_min(scene.bubble_min_size.round() as usize)
            .color_array(records.iter().map(|r| r.max_magnitude).collect())
            .color_scale(legend.scale.to_plotly())
            .cmin(cmin)
            .cmax(cmax)
            .opacity(1.0)
            .show_scale(true)
            .color_bar(colorbar);

        let hover_label = Label::new()
            .background_color(plotly::color::Rgb::from(WHITE))
            .border_color(Rgba::new(0, 0, 0, 0.0))
            .font(font(13, BLACK));

        Scatter::new(
            scene.bubbles.iter().map(|b| b.x).collect(),
            scene.bubbles.iter().map(|b| b.y).collect(),
        )
        .mode(Mode::Markers)
        .marker(marker)
        .hover_text_array(records.iter().map(Self::hover_text).collect())
        .hover_template(HOVER_TEMPLATE)
        .hover_label(hover_label)
        .show_legend(false)
    }

    fn hover_text(record: &EarthquakeRecord) -> String {
        format!(
            "<b>{}</b><br>Fatalities: {}<br>Date: {}",
            record.earthquake_name, record.fatalities, record.date
        )
    }

    fn layout(settings: &ChartSettings, scene: &Scene, notes: &[Note]) -> Layout {
        let (l, r, t, b) = settings.margin;

        let year_axis = Axis::new()
            .range(scene.x_range.to_vec())
            .side(AxisSide::Top)
            .tick_mode(TickMode::Array)
            .tick_values(scene.year_ticks.clone())
            .tick_text(
                scene
                    .year_ticks
                    .iter()
                    .map(|y| format!("<b>{y}</b>"))
                    .collect(),
            )
            .tick_angle(315.0)
            .ticks(TicksDirection::Inside)
            .tick_length(0)
            .tick_font(font(12, DARK_GRAY))
            .show_grid(false)
            .zero_line(false);

        let depth_axis = Axis::new()
            .range(scene.y_range.to_vec())
            .title(Title::from(format!("<b>{}</b>", scene.y_title).as_str()).font(font(14, DARK_GRAY)))
            .dtick(settings.depth_step)
            .show_tick_labels(false)
            .show_grid(true)
            .grid_color(plotly::color::Rgb::from(scene.grid_color))
            .grid_width(1)
            .zero_line(true)
            .zero_line_color(plotly::color::Rgb::from(GAINSBORO))
            .zero_line_width(scene.zero_line_width as usize);

        let stems = scene
            .stems
            .iter()
            .map(|stem| {
                Shape::new()
                    .shape_type(ShapeType::Line)
                    .x_ref("x")
                    .y_ref("y")
                    .x0(stem.x)
                    .y0(0.0)
                    .x1(stem.x)
                    .y1(stem.depth)
                    .line(
                        ShapeLine::new()
                            .color(plotly::color::Rgb::from(scene.stem_color))
                            .width(scene.stem_width),
                    )
                    .layer(ShapeLayer::Below)
            })
            .collect();

        let annotations = notes.iter().map(Note::to_annotation).collect();

        Layout::new()
            .width(settings.width as usize)
            .height(settings.height as usize)
            .plot_background_color(plotly::color::Rgb::from(WHITE))
            .show_legend(false)
            .margin(
                Margin::new()
                    .left(l as usize)
                    .right(r as usize)
                    .top(t as usize)
                    .bottom(b as usize),
            )
            .x_axis(year_axis)
            .y_axis(depth_axis)
            .shapes(stems)
            .annotations(annotations)
    }

    /// Depth labels, the title and the source line.
    fn notes(settings: &ChartSettings) -> Vec<Note> {
        let (top, bottom) = settings.depth_range;
        let label_style = TextStyle::new(12.0, DARK_GRAY).bold();

        let mut notes: Vec<Note> = Self::depth_steps(top, bottom, settings.depth_step)
            .into_iter()
            .filter(|&depth| depth > top)
            .map(|depth| {
                let text = format!("{depth} km");
                Note {
                    html: text.clone(),
                    label: TextLabel {
                        text,
                        x: settings.year_range.0 + DEPTH_LABEL_X_OFFSET,
                        y: depth - DEPTH_LABEL_Y_OFFSET,
                        coords: Coords::Data,
                        h: HAnchor::Center,
                        style: label_style,
                    },
                }
            })
            .collect();

        notes.push(Note {
            html: format!("<b>{}</b>", settings.title),
            label: TextLabel {
                text: settings.title.clone(),
                x: TITLE_POS.0,
                y: TITLE_POS.1,
                coords: Coords::Paper,
                h: HAnchor::Left,
                style: TextStyle::new(20.0, DARK_GRAY).bold(),
            },
        });

        notes.push(Note {
            html: format!(
                "<b>Source(s):</b> <a href='{}'>{}</a>",
                settings.source_url, settings.source_label
            ),
            label: TextLabel {
                text: format!("Source(s): {}", settings.source_label),
                x: settings.year_range.1,
                y: bottom - DEPTH_LABEL_Y_OFFSET,
                coords: Coords::Data,
                h: HAnchor::Right,
                style: TextStyle::new(11.0, DARK_GRAY).bold(),
            },
        });

        notes
    }

    /// Whole-number depths from the surface down: 0, 10, ... 90.
    fn depth_steps(top: f64, bottom: f64, step: f64) -> Vec<f64> {
        if step <= 0.0 {
            return Vec::new();
        }
        let count = ((bottom - top) / step).floor() as u32;
        (0..=count)
            .map(|i| (top + f64::from(i) * step).round())
            .collect()
    }

    fn legend_ticks((min, max): (f64, f64)) -> Vec<f64> {
        (min.ceil() as i64..=max.floor() as i64)
            .map(|v| v as f64)
            .collect()
    }
}

fn font(size: usize, color: Rgb) -> Font {
    Font::new().size(size).color(plotly::color::Rgb::from(color))
}

/// A text label plus the inline HTML plotly shows for it.
struct Note {
    label: TextLabel,
    html: String,
}

impl Note {
    fn to_annotation(&self) -> Annotation {
        let label = &self.label;
        let (x_ref, y_ref) = match label.coords {
            Coords::Data => ("x", "y"),
            Coords::Paper => ("paper", "paper"),
        };
        let h = match label.h {
            HAnchor::Left => Anchor::Left,
            HAnchor::Center => Anchor::Center,
            HAnchor::Right => Anchor::Right,
        };

        Annotation::new()
            .text(self.html.as_str())
            .x(label.x)
            .y(label.y)
            .x_ref(x_ref)
            .y_ref(y_ref)
            .x_anchor(h)
            .y_anchor(Anchor::Middle)
            .show_arrow(false)
            .font(font(label.style.size as usize, label.style.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::Value;

    fn record(year: i32, fatalities: u64, magnitude: f64, depth: f64, flag: &str) -> EarthquakeRecord {
        EarthquakeRecord {
            year,
            earthquake_name: format!("Quake {year}"),
            fatalities,
            max_magnitude: magnitude,
            location: "Somewhere".to_string(),
            date: "January 1".to_string(),
            depth_km: depth,
            flag_code: flag.to_string(),
            full_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
        }
    }

    fn plot_json(chart: &Chart) -> Value {
        serde_json::from_str(&chart.plot.to_json()).unwrap()
    }

    #[test]
    fn single_record_chart() {
        let settings = ChartSettings::default();
        let chart = ChartPlotter::build_figure(&[record(2023, 100, 7.5, 30.0, "us")], &settings);
        let scene = &chart.scene;

        assert_eq!(scene.stems, vec![Stem { x: 2023.0, depth: 30.0 }]);
        assert_eq!((scene.bubbles[0].x, scene.bubbles[0].y), (2023.0, 30.0));
        assert!((scene.bubbles[0].size - 0.15 * 10.0).abs() < 1e-12);
        assert_eq!(scene.bubble_min_size, 4.0);

        let flag = &scene.flags[0];
        assert_eq!(flag.url, "https://flagcdn.com/w320/us.png");
        assert!((flag.x - 2023.1).abs() < 1e-9);
        assert_eq!((flag.y, flag.width, flag.height), (2.0, 1.0, 2.5));

        let json = plot_json(&chart);
        let stem = &json["layout"]["shapes"][0];
        assert_eq!(stem["type"], "line");
        assert_eq!(stem["layer"], "below");
        assert_eq!((stem["x0"].as_f64(), stem["x1"].as_f64()), (Some(2023.0), Some(2023.0)));
        assert_eq!((stem["y0"].as_f64(), stem["y1"].as_f64()), (Some(0.0), Some(30.0)));

        let trace = &json["data"][0];
        assert_eq!(trace["mode"], "markers");
        assert_eq!(trace["x"], serde_json::json!([2023.0]));
        assert_eq!(trace["marker"]["sizemode"], "diameter");
        assert_eq!(trace["marker"]["color"], serde_json::json!([7.5]));
        assert_eq!(
            trace["hovertext"][0],
            "<b>Quake 2023</b><br>Fatalities: 100<br>Date: January 1"
        );
    }

    #[test]
    fn hover_label_is_white_without_border() {
        let chart = ChartPlotter::build_figure(
            &[record(2023, 100, 7.5, 30.0, "us")],
            &ChartSettings::default(),
        );
        let label = &plot_json(&chart)["data"][0]["hoverlabel"];
        assert_eq!(label["bgcolor"], "rgb(255, 255, 255)");
        assert_eq!(label["bordercolor"], "rgba(0, 0, 0, 0)");
        assert_eq!(label["font"]["color"], "rgb(0, 0, 0)");
    }

    #[test]
    fn marker_size_is_scaled_square_root_and_monotonic() {
        assert_eq!(ChartPlotter::marker_size(0, 0.15), 0.0);
        assert!((ChartPlotter::marker_size(10_000, 0.15) - 15.0).abs() < 1e-12);

        let sizes: Vec<f64> = [0u64, 1, 50, 51, 1_000, 227_898]
            .iter()
            .map(|&f| ChartPlotter::marker_size(f, 0.15))
            .collect();
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn same_band_gets_same_color() {
        let settings = ChartSettings::default();
        let records = [
            record(2005, 86_000, 7.6, 26.0, "pk"),
            record(2013, 825, 7.7, 15.0, "pk"),
            record(2011, 19_759, 9.1, 29.0, "jp"),
            record(2004, 227_898, 9.1, 30.0, "id"),
        ];
        let bubbles = ChartPlotter::build_figure(&records, &settings).scene.bubbles;

        assert_eq!(bubbles[0].color, bubbles[1].color);
        assert_eq!(bubbles[2].color, bubbles[3].color);
        assert_ne!(bubbles[0].color, bubbles[2].color);
        assert_eq!(bubbles[0].color, magnitude_band_colors()[1]);
    }

    #[test]
    fn depth_axis_is_reversed_with_text_labels() {
        let chart = ChartPlotter::build_figure(&[], &ChartSettings::default());
        assert_eq!(chart.scene.y_range, [90.0, 0.0]);
        assert_eq!(chart.scene.depth_grid.first(), Some(&0.0));
        assert_eq!(chart.scene.depth_grid.last(), Some(&90.0));

        let json = plot_json(&chart);
        let yaxis = &json["layout"]["yaxis"];
        assert_eq!(yaxis["range"], serde_json::json!([90.0, 0.0]));
        assert_eq!(yaxis["showticklabels"], false);
        assert_eq!(yaxis["zerolinewidth"], 2);

        let labels: Vec<&TextLabel> = chart
            .scene
            .labels
            .iter()
            .filter(|l| l.text.ends_with(" km"))
            .collect();
        assert_eq!(labels.len(), 9);
        assert_eq!(labels[0].text, "10 km");
        assert_eq!(labels[8].text, "90 km");
        assert_eq!((labels[8].x, labels[8].y), (1999.75, 87.75));

        let notes = json["layout"]["annotations"].as_array().unwrap();
        let ninety = notes.iter().find(|a| a["text"] == "90 km").unwrap();
        assert_eq!((ninety["x"].as_f64(), ninety["y"].as_f64()), (Some(1999.75), Some(87.75)));
    }

    #[test]
    fn year_axis_spans_fixed_window() {
        let chart = ChartPlotter::build_figure(&[], &ChartSettings::default());
        let json = plot_json(&chart);
        let xaxis = &json["layout"]["xaxis"];

        assert_eq!(xaxis["range"], serde_json::json!([1999.0, 2026.0]));
        assert_eq!(xaxis["side"], "top");
        assert_eq!(xaxis["tickangle"].as_f64(), Some(315.0));
        assert_eq!(xaxis["showgrid"], false);

        let ticks = xaxis["tickvals"].as_array().unwrap();
        assert_eq!(ticks.len(), 25);
        assert_eq!(ticks[0].as_f64(), Some(2001.0));
        assert_eq!(ticks[24].as_f64(), Some(2025.0));
        assert_eq!(xaxis["ticktext"][0], "<b>2001</b>");
    }

    #[test]
    fn colorbar_is_horizontal_below_the_middle() {
        let chart = ChartPlotter::build_figure(&[], &ChartSettings::default());
        let json = plot_json(&chart);
        let bar = &json["data"][0]["marker"]["colorbar"];

        assert_eq!(bar["orientation"], "h");
        assert_eq!((bar["x"].as_f64(), bar["y"].as_f64()), (Some(0.5), Some(0.35)));
        assert_eq!(bar["xanchor"], "left");
        assert_eq!(bar["len"], 384);
        assert_eq!(bar["tickvals"], serde_json::json!([6.0, 7.0, 8.0, 9.0, 10.0]));
        assert_eq!(chart.scene.legend.tickvals, vec![6.0, 7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn title_and_source_annotations() {
        let chart = ChartPlotter::build_figure(&[], &ChartSettings::default());
        let json = plot_json(&chart);
        let notes = json["layout"]["annotations"].as_array().unwrap();

        let title = notes.iter().find(|a| a["xref"] == "paper").unwrap();
        assert_eq!(title["text"], "<b>Deadliest Earthquakes by Year, 2001 - 2025</b>");
        assert_eq!(title["font"]["size"], 20);

        let source = notes
            .iter()
            .find(|a| a["text"].as_str().is_some_and(|t| t.contains("Source(s)")))
            .unwrap();
        assert!(source["text"]
            .as_str()
            .unwrap()
            .contains("href='https://en.wikipedia.org/wiki/Lists_of_21st-century_earthquakes'"));
        assert_eq!((source["x"].as_f64(), source["y"].as_f64()), (Some(2026.0), Some(87.75)));
        assert_eq!(source["xanchor"], "right");

        let plain = chart.scene.labels.last().unwrap();
        assert_eq!(plain.text, "Source(s): Wikipedia");
        assert_eq!(plain.h, HAnchor::Right);
    }
}
