//! HTML Exporter
//! Writes the plotly figure as an embeddable fragment that loads plotly.js from a CDN.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use super::scene::FlagBox;
use super::{Chart, RenderError};

const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
/// Fixed so identical charts give identical files.
const DIV_ID: &str = "earthquakes-chart";

/// One entry of plotly.js `layout.images`.
#[derive(Serialize)]
struct LayoutImage<'a> {
    source: &'a str,
    x: f64,
    y: f64,
    sizex: f64,
    sizey: f64,
    xref: &'static str,
    yref: &'static str,
    xanchor: &'static str,
    yanchor: &'static str,
    layer: &'static str,
}

impl<'a> From<&'a FlagBox> for LayoutImage<'a> {
    fn from(flag: &'a FlagBox) -> Self {
        Self {
            source: &flag.url,
            x: flag.x,
            y: flag.y,
            sizex: flag.width,
            sizey: flag.height,
            xref: "x",
            yref: "y",
            xanchor: "left",
            yanchor: "middle",
            layer: "above",
        }
    }
}

pub struct HtmlExporter;

impl HtmlExporter {
    /// Render the fragment markup. No `<html>` or `<body>` wrapper.
    pub fn to_fragment(chart: &Chart) -> Result<String, RenderError> {
        let mut figure: Value = serde_json::from_str(&chart.plot.to_json())?;

        // plotly's Layout has no image list, so the flags go straight into the JSON
        let images: Vec<LayoutImage> = chart.scene.flags.iter().map(LayoutImage::from).collect();
        figure
            .get_mut("layout")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| RenderError::Drawing("plotly figure has no layout".to_string()))?
            .insert("images".to_string(), serde_json::to_value(images)?);

        let data = script_json(&figure["data"])?;
        let layout = script_json(&figure["layout"])?;
        let config = script_json(&figure["config"])?;
        let (width, height) = (chart.scene.width, chart.scene.height);

        Ok(format!(
            r#"<div>
    <script type="text/javascript">window.PlotlyConfig = {{MathJaxConfig: 'local'}};</script>
    <script charset="utf-8" src="{PLOTLY_CDN_URL}"></script>
    <div id="{DIV_ID}" class="plotly-graph-div" style="height:{height}px; width:{width}px;"></div>
    <script type="text/javascript">
        window.PLOTLYENV = window.PLOTLYENV || {{}};
        if (document.getElementById("{DIV_ID}")) {{
            Plotly.newPlot("{DIV_ID}", {data}, {layout}, {config});
        }}
    </script>
</div>
"#
        ))
    }

    pub fn write_fragment(chart: &Chart, path: &Path) -> Result<(), RenderError> {
        let html = Self::to_fragment(chart)?;
        fs::write(path, html.as_bytes()).map_err(|source| RenderError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = html.len(), "wrote HTML fragment");
        Ok(())
    }
}

/// Serialize `value` for an inline `<script>`. `<`, `>` and `/` only occur
/// inside JSON strings, where their unicode escapes read back the same, so
/// no text can close the element.
fn script_json(value: &Value) -> Result<String, RenderError> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '/' => out.push_str("\\u002f"),
            _ => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartPlotter;
    use crate::config::ChartSettings;
    use crate::data::EarthquakeRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(name: &str) -> EarthquakeRecord {
        EarthquakeRecord {
            year: 2023,
            earthquake_name: name.to_string(),
            fatalities: 100,
            max_magnitude: 7.5,
            location: "Nowhere".to_string(),
            date: "January 1".to_string(),
            depth_km: 30.0,
            flag_code: "us".to_string(),
            full_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        }
    }

    fn chart(name: &str) -> Chart {
        ChartPlotter::build_figure(&[record(name)], &ChartSettings::default())
    }

    /// The `data` and `layout` arguments of the `Plotly.newPlot` call.
    fn embedded(html: &str) -> (Value, Value) {
        let call = format!("Plotly.newPlot(\"{DIV_ID}\", ");
        let start = html.find(&call).unwrap() + call.len();
        let mut values = serde_json::Deserializer::from_str(&html[start..]).into_iter::<Value>();
        let data = values.next().unwrap().unwrap();

        let offset = start + values.byte_offset() + ", ".len();
        let mut values = serde_json::Deserializer::from_str(&html[offset..]).into_iter::<Value>();
        let layout = values.next().unwrap().unwrap();
        (data, layout)
    }

    #[test]
    fn fragment_references_cdn_and_embeds_figure() {
        let html = HtmlExporter::to_fragment(&chart("Test")).unwrap();

        assert!(html.starts_with("<div>"));
        assert!(!html.contains("<html"));
        assert!(!html.contains("<body"));
        assert!(html.contains(r#"src="https://cdn.plot.ly/plotly-2.35.2.min.js""#));
        assert!(html.contains(r#"Plotly.newPlot("earthquakes-chart", "#));
        assert!(html.contains(r#"{"responsive":true});"#));
        assert!(html.contains("style=\"height:500px; width:1000px;\""));

        let (data, layout) = embedded(&html);
        assert_eq!(data[0]["x"], serde_json::json!([2023.0]));
        assert_eq!(layout["yaxis"]["range"], serde_json::json!([90.0, 0.0]));

        let flag = &layout["images"][0];
        assert_eq!(flag["source"], "https://flagcdn.com/w320/us.png");
        assert_eq!((flag["xanchor"].as_str(), flag["yanchor"].as_str()), (Some("left"), Some("middle")));
        assert_eq!((flag["sizex"].as_f64(), flag["sizey"].as_f64()), (Some(1.0), Some(2.5)));
    }

    #[test]
    fn names_cannot_close_the_script_element() {
        let name = "A</script><script>alert(1)</script>";
        let html = HtmlExporter::to_fragment(&chart(name)).unwrap();

        assert!(!html.contains("</script><script>alert(1)"));
        assert_eq!(html.matches("</script>").count(), 3);

        let (data, _) = embedded(&html);
        let hover = data[0]["hovertext"][0].as_str().unwrap();
        assert!(hover.contains(name));
    }

    #[test]
    fn fragment_is_deterministic() {
        assert_eq!(
            HtmlExporter::to_fragment(&chart("Test")).unwrap(),
            HtmlExporter::to_fragment(&chart("Test")).unwrap()
        );
    }

    #[test]
    fn missing_directory_is_a_file_access_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("chart.html");
        let err = HtmlExporter::write_fragment(&chart("Test"), &path).unwrap_err();
        assert!(matches!(err, RenderError::FileAccess { .. }));
        assert!(!path.exists());
    }
}
