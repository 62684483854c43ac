//! Time-in-range chart synthesis.
//!
//! Turns the time-in-range statistic into a declarative stacked-bar [`ChartSpec`]: every
//! category gets a bar segment clamped to a minimum visible height, the y ticks sit at the
//! cumulative segment boundaries and carry the glucose thresholds as their text. The result is
//! handed to a [`ChartRasterizer`](crate::raster::ChartRasterizer); nothing here paints.

use log::debug;
use serde::Serialize;

use crate::config::{ChartPolicy, LayoutConstants, Palette, RangeColors, ReportConfig, Rgb};
use crate::geometry::{Rect, Section};
use crate::model::{BoundsConfig, CategoryId, StatisticRecord};

/// Where a segment label is placed relative to its bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelPosition {
    /// Beside the bar, outside the stacked column.
    Outside,
}

/// One stacked-bar segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarTrace {
    pub category: CategoryId,
    /// Segment height as a fraction of the y domain, after clamping.
    pub height: f64,
    /// Unclamped `value / total`.
    pub raw_share: f64,
    pub color: Rgb,
    pub label: String,
    pub label_position: LabelPosition,
    pub label_color: Rgb,
    pub divider_color: Rgb,
    /// Divider line width in pixels.
    pub divider_width: f64,
}

/// Plot margins in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChartMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl ChartMargins {
    fn uniform(value: f64) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }
}

/// Canvas and axis configuration of the chart, in rasterization pixels.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub width_px: u32,
    pub height_px: u32,
    /// Size the image is embedded at, in page points.
    pub display_width: f64,
    pub display_height: f64,
    pub margins: ChartMargins,
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    /// Width of the stacked column as a fraction of the x domain.
    pub bar_width: f64,
    pub show_x_axis: bool,
    pub show_legend: bool,
    pub tick_values: Vec<f64>,
    pub tick_text: Vec<String>,
    /// Gap between the plot area and the tick labels.
    pub tick_length: f64,
    pub font_color: Rgb,
    pub background: Rgb,
    /// Text size used wherever a more specific size is not positive.
    pub font_size: f64,
    pub tick_font_size: f64,
    pub value_font_size: f64,
}

impl ChartLayout {
    /// `size` when it is a usable text size, the default chart font size otherwise.
    pub fn text_size(&self, size: f64) -> f64 {
        if size.is_finite() && size > 0.0 {
            size
        } else {
            self.font_size
        }
    }
}

/// A complete stacked-bar chart description.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
    pub traces: Vec<BarTrace>,
    pub layout: ChartLayout,
}

impl ChartSpec {
    /// Sum of the clamped segment heights.
    pub fn stacked_height(&self) -> f64 {
        self.traces.iter().map(|trace| trace.height).sum()
    }
}

/// The chart plot rectangle inside the time-in-range section: inset by the border, the
/// corner radius horizontally and the title band vertically.
pub fn chart_rect(section: &Section, layout: &LayoutConstants) -> Rect {
    let inset = layout.border_inset;
    let radius = layout.border_radius;
    let header = layout.units(layout.header_height_units);
    Rect::new(
        section.x() + inset + radius,
        section.y() + inset + header,
        section.width() - 2.0 * inset - 2.0 * radius,
        section.height() - 2.0 * inset - header,
    )
}

/// Color of a category, or the empty color when the category is negligible or unknown.
pub fn category_color(
    id: &CategoryId,
    raw_percent: f64,
    policy: &ChartPolicy,
    colors: &RangeColors,
) -> Rgb {
    if raw_percent <= policy.empty_color_threshold_percent {
        return colors.empty;
    }
    match id {
        CategoryId::VeryLow => colors.very_low,
        CategoryId::Low => colors.low,
        CategoryId::Target => colors.target,
        CategoryId::High => colors.high,
        CategoryId::VeryHigh => colors.very_high,
        CategoryId::Other(_) => colors.empty,
    }
}

/// Running sums of the segment heights, cut or padded to exactly `count` entries.
///
/// Padding repeats the last sum (zero when there are no segments).
pub fn cumulative_ticks(heights: &[f64], count: usize) -> Vec<f64> {
    let mut ticks: Vec<f64> = heights
        .iter()
        .scan(0.0, |sum, height| {
            *sum += height;
            Some(*sum)
        })
        .take(count)
        .collect();
    let last = ticks.last().copied().unwrap_or(0.0);
    ticks.resize(count, last);
    ticks
}

fn format_threshold(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn scaled_px(points: f64, scale: f64) -> u32 {
    (points * scale).round().max(1.0) as u32
}

/// Builds the time-in-range chart for the given plot rectangle.
///
/// Returns `None` when the record carries no data (`total <= 0` or not a number), in which
/// case the chart region stays empty.
pub fn synthesize_time_in_range(
    stat: &StatisticRecord,
    bounds: &BoundsConfig,
    area: Rect,
    config: &ReportConfig,
) -> Option<ChartSpec> {
    if !stat.has_data() {
        debug!("Time in range total is {}; skipping chart", stat.total.value);
        return None;
    }
    let policy = &config.chart;
    let palette: &Palette = &config.palette;
    let total = stat.total.value;
    let scale = policy.render_scale;

    let traces: Vec<BarTrace> = stat
        .data
        .iter()
        .map(|datum| {
            let raw_share = datum.value / total;
            let raw_percent = raw_share * 100.0;
            BarTrace {
                category: datum.id.clone(),
                height: raw_share.max(policy.min_height_fraction),
                raw_share,
                color: category_color(&datum.id, raw_percent, policy, &palette.ranges),
                label: datum.id.to_string(),
                label_position: LabelPosition::Outside,
                label_color: palette.black,
                divider_color: palette.range_divider,
                divider_width: policy.divider_width * scale,
            }
        })
        .collect();

    let heights: Vec<f64> = traces.iter().map(|trace| trace.height).collect();
    let tick_values = cumulative_ticks(&heights, policy.tick_count);
    let tick_text = bounds
        .ascending()
        .iter()
        .take(policy.tick_count)
        .map(|value| format_threshold(*value))
        .collect();

    let margin = config.layout.units(policy.plot_margin_units) * scale;
    let layout = ChartLayout {
        width_px: scaled_px(area.width, scale),
        height_px: scaled_px(area.height, scale),
        display_width: area.width,
        display_height: area.height,
        margins: ChartMargins::uniform(margin),
        x_range: [0.0, 1.0],
        y_range: [0.0, 1.0],
        bar_width: policy.bar_width,
        show_x_axis: false,
        show_legend: false,
        tick_values,
        tick_text,
        tick_length: policy.tick_length,
        font_color: palette.black,
        background: palette.white,
        font_size: config.fonts.chart_default * scale,
        tick_font_size: config.fonts.chart_ticks * scale,
        value_font_size: config.fonts.chart_values * scale,
    };

    debug!(
        "Synthesized time in range chart: {} segments, stacked height {:.4}, {}x{} px",
        traces.len(),
        heights.iter().sum::<f64>(),
        layout.width_px,
        layout.height_px
    );
    Some(ChartSpec { traces, layout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportText;
    use crate::geometry::{PageGeometry, PageSections, SectionId};
    use crate::model::CategoryDatum;

    fn record(values: &[(&str, f64)], total: f64) -> StatisticRecord {
        StatisticRecord::new(
            total,
            values
                .iter()
                .map(|(id, value)| CategoryDatum::new(*id, *value))
                .collect(),
        )
    }

    #[test]
    fn chart_rect_sits_inside_section_border() {
        let layout = LayoutConstants::default();
        let sections = PageSections::new(&PageGeometry::letter(), &layout, &ReportText::default());
        let rect = chart_rect(sections.get(SectionId::TimeInRanges), &layout);
        assert_eq!(rect, Rect::new(45.0, 73.0, 261.0, 196.0));
    }

    #[test]
    fn ticks_pad_with_last_sum() {
        assert_eq!(cumulative_ticks(&[0.25, 0.5], 4), vec![0.25, 0.75, 0.75, 0.75]);
        assert_eq!(cumulative_ticks(&[], 4), vec![0.0; 4]);
        assert_eq!(cumulative_ticks(&[0.1; 6], 4).len(), 4);
    }

    #[test]
    fn thresholds_format_without_trailing_zeros() {
        assert_eq!(format_threshold(54.0), "54");
        assert_eq!(format_threshold(3.9), "3.9");
    }

    #[test]
    fn pixel_dimensions_follow_render_scale() {
        let config = ReportConfig::default();
        let spec = synthesize_time_in_range(
            &record(&[("target", 1.0)], 1.0),
            &BoundsConfig::default(),
            Rect::new(0.0, 0.0, 261.0, 196.0),
            &config,
        )
        .expect("chart");
        assert_eq!(spec.layout.width_px, 2088);
        assert_eq!(spec.layout.height_px, 1568);
        assert_eq!(spec.layout.margins.left, 27.0 * 8.0);
        assert_eq!(spec.layout.tick_font_size, 56.0);
        assert_eq!(spec.traces[0].divider_width, 12.0);
        assert_eq!(spec.layout.tick_text, vec!["54", "70", "180", "250"]);
    }

    #[test]
    fn unknown_categories_use_empty_color() {
        let config = ReportConfig::default();
        let spec = synthesize_time_in_range(
            &record(&[("custom", 50.0), ("target", 50.0)], 100.0),
            &BoundsConfig::default(),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            &config,
        )
        .expect("chart");
        assert_eq!(spec.traces[0].color, config.palette.ranges.empty);
        assert_eq!(spec.traces[1].color, config.palette.ranges.target);
    }

    #[test]
    fn label_gap_comes_from_policy() {
        let mut config = ReportConfig::default();
        assert_eq!(config.chart.tick_length, 8.0);
        config.chart.tick_length = 12.0;
        let spec = synthesize_time_in_range(
            &record(&[("target", 1.0)], 1.0),
            &BoundsConfig::default(),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            &config,
        )
        .expect("chart");
        assert_eq!(spec.layout.tick_length, 12.0);
    }
}
