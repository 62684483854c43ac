//! Static configuration for the AGP page: layout proportions, chart policy, colors, font sizes
//! and the fixed report strings.
//!
//! Every value has a default matching the printed AGP layout. The structures deserialize with
//! `#[serde(default)]`, so a JSON file only needs to name the constants it overrides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::SectionText;

/// An sRGB color stored as three 8-bit channels and serialized as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a `#RRGGBB` (or `RRGGBB`) hexadecimal color.
    pub fn from_hex(value: &str) -> Result<Self, String> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color `{value}`; expected #RRGGBB"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|err| err.to_string())
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl From<Rgb> for genpdf::style::Color {
    fn from(color: Rgb) -> Self {
        genpdf::style::Color::Rgb(color.r, color.g, color.b)
    }
}

/// Page proportions. Fields suffixed `_units` are multiples of [`LayoutConstants::dpi`], the
/// rest are plain points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstants {
    /// Points per layout unit (one inch on a 72 dpi coordinate system).
    pub dpi: f64,
    /// Top of the chart render area.
    pub chart_area_top_units: f64,
    /// Vertical gap between the report info and glucose metrics sections.
    pub section_gap_units: f64,
    /// Height of the shaded title band of bordered sections.
    pub header_height_units: f64,
    /// Outer corner radius of bordered sections.
    pub border_radius: f64,
    /// Inset of the white card body from the shaded outline.
    pub border_inset: f64,
    pub time_in_ranges_width_units: f64,
    pub time_in_ranges_height_units: f64,
    pub report_info_width_units: f64,
    pub report_info_height_units: f64,
    pub glucose_metrics_height_units: f64,
    pub profile_top_units: f64,
    pub profile_height_units: f64,
    pub daily_thumbnails_height_units: f64,
    pub title_padding_x: f64,
    pub subtitle_gap_units: f64,
    pub description_padding_x_units: f64,
    pub description_padding_y_units: f64,
    /// Gap between an info row's label and its value, and between text and rule.
    pub info_row_gap_units: f64,
    /// Vertical offset of the smaller info-row label relative to the row origin.
    pub info_label_offset_y: f64,
    pub info_rule_width: f64,
    pub report_info_padding_top_units: f64,
    pub patient_name_max_chars: usize,
    pub column_gutter: f64,
    pub column_widths: Vec<f64>,
    /// Footer baseline distance above the bottom edge, in footer line heights.
    pub footer_line_factor: f64,
    pub logo_width: f64,
    /// Logo top offset above the bottom edge, as a fraction of the logo width.
    pub logo_offset_factor: f64,
    /// Pixels per point of the rasterized section cards.
    pub card_render_scale: f64,
}

impl LayoutConstants {
    /// Converts a number of layout units into points.
    pub fn units(&self, count: f64) -> f64 {
        self.dpi * count
    }
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            dpi: 72.0,
            chart_area_top_units: 0.75,
            section_gap_units: 0.25,
            header_height_units: 0.25,
            border_radius: 8.0,
            border_inset: 1.0,
            time_in_ranges_width_units: 3.875,
            time_in_ranges_height_units: 3.0,
            report_info_width_units: 3.375,
            report_info_height_units: 0.875,
            glucose_metrics_height_units: 1.875,
            profile_top_units: 4.0,
            profile_height_units: 3.75,
            daily_thumbnails_height_units: 2.25,
            title_padding_x: 8.0,
            subtitle_gap_units: 0.4,
            description_padding_x_units: 0.5,
            description_padding_y_units: 0.2,
            info_row_gap_units: 0.025,
            info_label_offset_y: 1.0,
            info_rule_width: 0.25,
            report_info_padding_top_units: 0.05,
            patient_name_max_chars: 32,
            column_gutter: 15.0,
            column_widths: vec![25.5, 49.0, 25.5],
            footer_line_factor: 1.25,
            logo_width: 70.0,
            logo_offset_factor: 0.175,
            card_render_scale: 4.0,
        }
    }
}

/// Policy constants of the time-in-range chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartPolicy {
    /// Smallest bar height (fraction of the stack) a category is drawn with.
    pub min_height_fraction: f64,
    /// Categories at or below this raw percentage are painted with the empty color.
    pub empty_color_threshold_percent: f64,
    /// Resolution multiplier applied to every pixel dimension of the chart layout.
    pub render_scale: f64,
    /// Width of the stacked bar as a fraction of the x domain.
    pub bar_width: f64,
    /// Plot margins on every side, in layout units.
    pub plot_margin_units: f64,
    /// Width of the divider line between stacked segments, before scaling.
    pub divider_width: f64,
    /// Number of tick marks on the y axis.
    pub tick_count: usize,
    /// Gap between the plot area and the tick and segment labels, in chart pixels.
    pub tick_length: f64,
}

impl Default for ChartPolicy {
    fn default() -> Self {
        Self {
            min_height_fraction: 0.0275,
            empty_color_threshold_percent: 6.0,
            render_scale: 8.0,
            bar_width: 0.25,
            plot_margin_units: 0.375,
            divider_width: 1.5,
            tick_count: 4,
            tick_length: 8.0,
        }
    }
}

/// Colors of the glucose range categories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeColors {
    pub very_low: Rgb,
    pub low: Rgb,
    pub target: Rgb,
    pub high: Rgb,
    pub very_high: Rgb,
    /// Neutral color substituted for negligible categories and unknown ids.
    pub empty: Rgb,
}

impl Default for RangeColors {
    fn default() -> Self {
        Self {
            very_low: Rgb::new(0xA6, 0x1F, 0x1F),
            low: Rgb::new(0xE1, 0x36, 0x2C),
            target: Rgb::new(0x3A, 0x9E, 0x50),
            high: Rgb::new(0xF5, 0xB9, 0x2C),
            very_high: Rgb::new(0xF0, 0x7F, 0x24),
            empty: Rgb::new(0xD1, 0xD1, 0xD1),
        }
    }
}

/// Colors used across the page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub black: Rgb,
    pub white: Rgb,
    pub background_shaded: Rgb,
    pub line_default: Rgb,
    pub range_divider: Rgb,
    pub report_header: Rgb,
    pub report_footer: Rgb,
    pub section_title: Rgb,
    pub section_subtitle: Rgb,
    pub section_description: Rgb,
    pub report_info: Rgb,
    pub ranges: RangeColors,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            black: Rgb::new(0, 0, 0),
            white: Rgb::new(0xFF, 0xFF, 0xFF),
            background_shaded: Rgb::new(0xD8, 0xD8, 0xD8),
            line_default: Rgb::new(0xA3, 0xA3, 0xA3),
            range_divider: Rgb::new(0xFF, 0xFF, 0xFF),
            report_header: Rgb::new(0x00, 0x00, 0x00),
            report_footer: Rgb::new(0x75, 0x75, 0x75),
            section_title: Rgb::new(0x00, 0x00, 0x00),
            section_subtitle: Rgb::new(0x40, 0x40, 0x40),
            section_description: Rgb::new(0x40, 0x40, 0x40),
            report_info: Rgb::new(0x00, 0x00, 0x00),
            ranges: RangeColors::default(),
        }
    }
}

/// Font sizes in points. PDF text sizes are whole points because `genpdf` styles store them
/// as `u8`; chart sizes are scaled by the render scale before rasterization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub report_header: u8,
    pub report_footer: u8,
    pub section_title: u8,
    pub section_subtitle: u8,
    pub section_description: u8,
    pub report_info_default: u8,
    pub report_info_label: u8,
    pub chart_default: f64,
    pub chart_ticks: f64,
    pub chart_values: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            report_header: 14,
            report_footer: 7,
            section_title: 10,
            section_subtitle: 9,
            section_description: 7,
            report_info_default: 10,
            report_info_label: 8,
            chart_default: 7.0,
            chart_ticks: 7.0,
            chart_values: 7.0,
        }
    }
}

/// Fixed strings printed on the page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportText {
    pub report_header: String,
    pub report_sub_header: String,
    pub report_footer: String,
    pub dob_label: String,
    pub cgm_active_label: String,
    pub time_in_ranges: SectionText,
    pub report_info: SectionText,
    pub glucose_metrics: SectionText,
    pub ambulatory_glucose_profile: SectionText,
    pub daily_thumbnails: SectionText,
}

impl Default for ReportText {
    fn default() -> Self {
        Self {
            report_header: "AGP Report:".to_owned(),
            report_sub_header: "Continuous Glucose Monitoring".to_owned(),
            report_footer: "Ambulatory Glucose Profile (AGP) report".to_owned(),
            dob_label: "DOB:".to_owned(),
            cgm_active_label: "Time CGM Active".to_owned(),
            time_in_ranges: SectionText::titled("Time in Ranges")
                .with_subtitle("Goals for Type 1 and Type 2 Diabetes"),
            report_info: SectionText::default(),
            glucose_metrics: SectionText::titled("Glucose Metrics"),
            ambulatory_glucose_profile: SectionText::titled("Ambulatory Glucose Profile (AGP)")
                .with_description(
                    "AGP is a summary of glucose values from the report period, with median \
                     (50%) and other percentiles shown as if they occurred in a single day.",
                ),
            daily_thumbnails: SectionText::titled("Daily Glucose Profiles").with_description(
                "Each daily profile represents a midnight-to-midnight period.",
            ),
        }
    }
}

/// Complete configuration of one report render.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub layout: LayoutConstants,
    pub chart: ChartPolicy,
    pub palette: Palette,
    pub fonts: FontSizes,
    pub text: ReportText,
    /// Fixed offset applied to datum times before formatting dates, in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl ReportConfig {
    /// Parses a (possibly partial) JSON configuration.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_parses_and_prints_hex() {
        let color = Rgb::from_hex("#3a9E50").expect("valid color");
        assert_eq!(color, Rgb::new(0x3A, 0x9E, 0x50));
        assert_eq!(color.to_string(), "#3A9E50");
        assert!(Rgb::from_hex("#12FG34").is_err());
        assert!(Rgb::from_hex("#123").is_err());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = ReportConfig::from_json(
            r##"{ "chart": { "render_scale": 4.0 }, "palette": { "ranges": { "empty": "#000000" } } }"##,
        )
        .expect("partial config parses");
        assert_eq!(config.chart.render_scale, 4.0);
        assert_eq!(config.chart.min_height_fraction, 0.0275);
        assert_eq!(config.palette.ranges.empty, Rgb::new(0, 0, 0));
        assert_eq!(config.palette.ranges.target, RangeColors::default().target);
        assert_eq!(config.layout, LayoutConstants::default());
    }

    #[test]
    fn units_scale_with_dpi() {
        let layout = LayoutConstants::default();
        assert_eq!(layout.units(3.375), 243.0);
        assert_eq!(layout.units(0.25), 18.0);
    }
}
