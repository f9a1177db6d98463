//! Application configuration.
//! Fixed input/output locations and the chart's layout constants.

use std::path::PathBuf;

/// Where the dataset is read from and where the two artifacts go.
#[derive(Debug, Clone)]
pub struct FilePaths {
    pub input: PathBuf,
    pub html: PathBuf,
    pub png: PathBuf,
}

impl Default for FilePaths {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/raw/earthquakes.csv"),
            html: PathBuf::from("reports/html/earthquakes.html"),
            png: PathBuf::from("reports/figures/earthquakes.png"),
        }
    }
}

/// Chart layout and styling constants.
#[derive(Debug, Clone)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    /// Left, right, top, bottom margins in pixels.
    pub margin: (u32, u32, u32, u32),
    /// Visible year window on the horizontal axis.
    pub year_range: (f64, f64),
    /// First and last year with a tick label.
    pub tick_years: (i32, i32),
    /// Depth shown at the top and bottom of the plot.
    pub depth_range: (f64, f64),
    pub depth_step: f64,
    /// Magnitude domain of the color scale.
    pub magnitude_domain: (f64, f64),
    /// Diameter = marker_scale * sqrt(fatalities).
    pub marker_scale: f64,
    pub marker_size_min: f64,
    /// `{code}` is replaced with the record's flag code.
    pub flag_url_template: String,
    pub title: String,
    pub source_label: String,
    pub source_url: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            margin: (20, 20, 85, 10),
            year_range: (1999.0, 2026.0),
            tick_years: (2001, 2025),
            depth_range: (0.0, 90.0),
            depth_step: 10.0,
            magnitude_domain: (6.0, 10.0),
            marker_scale: 0.15,
            marker_size_min: 4.0,
            flag_url_template: "https://flagcdn.com/w320/{code}.png".to_string(),
            title: "Deadliest Earthquakes by Year, 2001 - 2025".to_string(),
            source_label: "Wikipedia".to_string(),
            source_url: "https://en.wikipedia.org/wiki/Lists_of_21st-century_earthquakes"
                .to_string(),
        }
    }
}

impl ChartSettings {
    pub fn flag_url(&self, code: &str) -> String {
        self.flag_url_template.replace("{code}", code)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub paths: FilePaths,
    pub chart: ChartSettings,
}
