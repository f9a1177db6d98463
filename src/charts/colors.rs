//! Colors and color scales shared by the HTML and PNG outputs.

use plotly::common::{ColorScale, ColorScaleElement};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const DARK_GRAY: Rgb = Rgb(64, 64, 64); // #404040
pub const GAINSBORO: Rgb = Rgb(220, 220, 220);

/// plotly's sequential "Reds" scale, evenly spaced stops from 0 to 1.
const REDS: [Rgb; 9] = [
    Rgb(255, 245, 240),
    Rgb(254, 224, 210),
    Rgb(252, 187, 161),
    Rgb(252, 146, 114),
    Rgb(251, 106, 74),
    Rgb(239, 59, 44),
    Rgb(203, 24, 29),
    Rgb(165, 15, 21),
    Rgb(103, 0, 13),
];

/// Points on the Reds scale used for the four magnitude bands.
const BAND_SAMPLES: [f64; 4] = [0.2, 0.45, 0.7, 0.95];

impl Rgb {
    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }

    /// Linear interpolation towards `other`, `t` in [0, 1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl From<Rgb> for plotly::color::Rgb {
    fn from(c: Rgb) -> Self {
        plotly::color::Rgb::new(c.0, c.1, c.2)
    }
}

/// Sample the Reds scale at `t` in [0, 1].
pub fn sample_reds(t: f64) -> Rgb {
    let scaled = t.clamp(0.0, 1.0) * (REDS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(REDS.len() - 2);
    REDS[lower].lerp(REDS[lower + 1], scaled - lower as f64)
}

/// The four band colors, lightest first.
pub fn magnitude_band_colors() -> [Rgb; 4] {
    BAND_SAMPLES.map(sample_reds)
}

/// Index of the quantized band `value` falls into within `domain`.
///
/// A value exactly on a cut point belongs to the upper band; values outside the
/// domain are clamped to the first or last band.
pub fn magnitude_band(value: f64, domain: (f64, f64), bands: usize) -> usize {
    let t = normalize(value, domain);
    ((t * bands as f64).floor() as usize).min(bands.saturating_sub(1))
}

/// Position of `value` within `domain`, clamped to [0, 1].
pub fn normalize(value: f64, (min, max): (f64, f64)) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// A colorscale: `(position, color)` stops with non-decreasing positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Colorscale(pub Vec<(f64, Rgb)>);

impl Colorscale {
    /// Piecewise-constant scale with one equal-width band per color.
    pub fn quantized(colors: &[Rgb]) -> Self {
        let n = colors.len() as f64;
        let stops = colors
            .iter()
            .enumerate()
            .flat_map(|(i, &color)| [(i as f64 / n, color), ((i + 1) as f64 / n, color)])
            .collect();
        Self(stops)
    }

    pub fn to_plotly(&self) -> ColorScale {
        ColorScale::Vector(
            self.0
                .iter()
                .map(|&(pos, color)| ColorScaleElement(pos, color.to_css()))
                .collect(),
        )
    }

    /// Color at normalized position `t`.
    ///
    /// When two stops share a position the later one wins, which keeps band
    /// boundaries consistent with [`magnitude_band`].
    pub fn color_at(&self, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let segment = self
            .0
            .windows(2)
            .rposition(|w| w[0].0 < w[1].0 && w[0].0 <= t && t <= w[1].0);

        match segment {
            Some(i) => {
                let (start, from) = self.0[i];
                let (end, to) = self.0[i + 1];
                from.lerp(to, (t - start) / (end - start))
            }
            None => self.0.last().map(|&(_, color)| color).unwrap_or(BLACK),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reds_samples_match_plotly_interpolation() {
        assert_eq!(sample_reds(0.0), Rgb(255, 245, 240));
        assert_eq!(sample_reds(1.0), Rgb(103, 0, 13));
        assert_eq!(
            magnitude_band_colors(),
            [
                Rgb(253, 202, 181),
                Rgb(251, 122, 90),
                Rgb(217, 38, 35),
                Rgb(128, 6, 16),
            ]
        );
    }

    #[test]
    fn plotly_scale_uses_css_colors() {
        let json = serde_json::to_value(Colorscale::quantized(&magnitude_band_colors()).to_plotly())
            .unwrap();
        assert_eq!(json[0], serde_json::json!([0.0, "rgb(253, 202, 181)"]));
        assert_eq!(json[7], serde_json::json!([1.0, "rgb(128, 6, 16)"]));
        assert_eq!(DARK_GRAY.to_css(), "rgb(64, 64, 64)");
    }

    #[test]
    fn quantized_scale_has_duplicate_cut_points() {
        let colors = magnitude_band_colors();
        let scale = Colorscale::quantized(&colors);
        let positions: Vec<f64> = scale.0.iter().map(|&(p, _)| p).collect();
        assert_eq!(positions, vec![0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0]);
        assert_eq!(scale.0[2].1, colors[1]);
    }

    #[test]
    fn bands_are_piecewise_constant() {
        let domain = (6.0, 10.0);
        let colors = magnitude_band_colors();
        let scale = Colorscale::quantized(&colors);

        let same_band = [(6.1, 6.9), (7.0, 7.9), (8.0, 8.9), (9.0, 9.5)];
        for (a, b) in same_band {
            assert_eq!(magnitude_band(a, domain, 4), magnitude_band(b, domain, 4));
            assert_eq!(
                scale.color_at(normalize(a, domain)),
                scale.color_at(normalize(b, domain))
            );
        }

        for (mag, band) in [(5.6, 0), (6.0, 0), (7.0, 1), (7.5, 1), (8.0, 2), (9.1, 3), (10.0, 3), (11.0, 3)] {
            assert_eq!(magnitude_band(mag, domain, 4), band, "magnitude {mag}");
            assert_eq!(scale.color_at(normalize(mag, domain)), colors[band], "magnitude {mag}");
        }
    }

    #[test]
    fn degenerate_domain_maps_to_first_band() {
        assert_eq!(magnitude_band(7.0, (6.0, 6.0), 4), 0);
    }
}
