//! Page geometry: the section descriptors of the AGP page and the column grid.
//!
//! All values are PDF points measured from the top-left corner of the page. The descriptors
//! carry no behavior; every renderer in the crate reads them.

use serde::{Deserialize, Serialize};

use crate::config::{LayoutConstants, ReportText};

/// A point on the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns whether `point` lies inside the rectangle with its corners rounded by
    /// `radius`. The radius is clamped to half the shorter side.
    pub fn contains_rounded(&self, point: Point, radius: f64) -> bool {
        if point.x < self.x || point.x > self.right() || point.y < self.y || point.y > self.bottom()
        {
            return false;
        }
        let radius = radius.max(0.0).min(self.width / 2.0).min(self.height / 2.0);
        let corner_x = point.x.clamp(self.x + radius, self.right() - radius);
        let corner_y = point.y.clamp(self.y + radius, self.bottom() - radius);
        let (dx, dy) = (point.x - corner_x, point.y - corner_y);
        dx * dx + dy * dy <= radius * radius
    }

    /// Returns whether the two rectangles share any area (touching edges do not count).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Page margins in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PageMargins {
    /// Uses the same margin on every side.
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Physical page dimensions together with the margins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margins: PageMargins,
}

impl PageGeometry {
    /// US Letter at 72 points per inch with half-inch margins.
    pub fn letter() -> Self {
        Self {
            width: 8.5 * 72.0,
            height: 11.0 * 72.0,
            margins: PageMargins::uniform(36.0),
        }
    }

    pub fn left_edge(&self) -> f64 {
        self.margins.left
    }

    pub fn right_edge(&self) -> f64 {
        self.margins.left + self.content_width()
    }

    pub fn top_edge(&self) -> f64 {
        self.margins.top
    }

    pub fn bottom_edge(&self) -> f64 {
        self.margins.top + self.content_height()
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    /// Height between the top and bottom margins.
    pub fn content_height(&self) -> f64 {
        self.height - self.margins.top - self.margins.bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::letter()
    }
}

/// Optional text decorations of a section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionText {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
}

impl SectionText {
    /// Creates text carrying only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Sets the subtitle and returns the updated text.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Sets the description and returns the updated text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Names of the five fixed sections, in definition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionId {
    TimeInRanges,
    ReportInfo,
    GlucoseMetrics,
    AmbulatoryGlucoseProfile,
    DailyThumbnails,
}

impl SectionId {
    /// All sections in the order they are defined and painted.
    pub const ALL: [SectionId; 5] = [
        SectionId::TimeInRanges,
        SectionId::ReportInfo,
        SectionId::GlucoseMetrics,
        SectionId::AmbulatoryGlucoseProfile,
        SectionId::DailyThumbnails,
    ];

    /// The camelCase key of the section, also used as the bookmark identifier.
    pub fn key(self) -> &'static str {
        match self {
            SectionId::TimeInRanges => "timeInRanges",
            SectionId::ReportInfo => "reportInfo",
            SectionId::GlucoseMetrics => "glucoseMetrics",
            SectionId::AmbulatoryGlucoseProfile => "ambulatoryGlucoseProfile",
            SectionId::DailyThumbnails => "dailyThumbnails",
        }
    }
}

/// A rectangular page region with optional border and text.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub rect: Rect,
    pub bordered: bool,
    pub text: SectionText,
}

impl Section {
    pub fn x(&self) -> f64 {
        self.rect.x
    }

    pub fn y(&self) -> f64 {
        self.rect.y
    }

    pub fn width(&self) -> f64 {
        self.rect.width
    }

    pub fn height(&self) -> f64 {
        self.rect.height
    }
}

/// The fixed set of sections of one AGP page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageSections {
    sections: [Section; 5],
}

impl PageSections {
    /// Lays out the five sections from fixed proportions of the page.
    ///
    /// Overlap is not checked; the default constants keep every section disjoint.
    pub fn new(page: &PageGeometry, layout: &LayoutConstants, text: &ReportText) -> Self {
        let u = |count: f64| layout.units(count);
        let chart_area_top = u(layout.chart_area_top_units);
        let chart_area_bottom = page.bottom_edge() - (chart_area_top - page.margins.bottom);
        let info_width = u(layout.report_info_width_units);

        let time_in_ranges = Rect::new(
            page.left_edge(),
            chart_area_top,
            u(layout.time_in_ranges_width_units),
            u(layout.time_in_ranges_height_units),
        );
        let report_info = Rect::new(
            page.right_edge() - info_width,
            chart_area_top,
            info_width,
            u(layout.report_info_height_units),
        );
        let glucose_metrics = Rect::new(
            report_info.x,
            report_info.bottom() + u(layout.section_gap_units),
            info_width,
            u(layout.glucose_metrics_height_units),
        );
        let profile = Rect::new(
            page.left_edge(),
            u(layout.profile_top_units),
            page.content_width(),
            u(layout.profile_height_units),
        );
        let thumbnails_height = u(layout.daily_thumbnails_height_units);
        let thumbnails = Rect::new(
            page.left_edge(),
            chart_area_bottom - thumbnails_height,
            page.content_width(),
            thumbnails_height,
        );

        let section = |id, rect, bordered, text: &SectionText| Section {
            id,
            rect,
            bordered,
            text: text.clone(),
        };

        Self {
            sections: [
                section(
                    SectionId::TimeInRanges,
                    time_in_ranges,
                    true,
                    &text.time_in_ranges,
                ),
                section(SectionId::ReportInfo, report_info, false, &text.report_info),
                section(
                    SectionId::GlucoseMetrics,
                    glucose_metrics,
                    true,
                    &text.glucose_metrics,
                ),
                section(
                    SectionId::AmbulatoryGlucoseProfile,
                    profile,
                    true,
                    &text.ambulatory_glucose_profile,
                ),
                section(
                    SectionId::DailyThumbnails,
                    thumbnails,
                    true,
                    &text.daily_thumbnails,
                ),
            ],
        }
    }

    /// Returns the descriptor of the given section.
    pub fn get(&self, id: SectionId) -> &Section {
        // `sections` is stored in `SectionId::ALL` order.
        &self.sections[id as usize]
    }

    /// Iterates the sections in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}

/// One column of the percentage grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Column {
    pub x: f64,
    pub width: f64,
}

/// Percentage-based column grid for content positioned relative to columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnLayout {
    columns: Vec<Column>,
    gutter: f64,
}

impl ColumnLayout {
    /// Splits `width` (starting at `x`) into columns of the given percentages.
    ///
    /// Gutters are removed from the width first, so the percentages apply to the space that
    /// is actually available for content.
    pub fn percentage(x: f64, width: f64, gutter: f64, widths: &[f64]) -> Self {
        let gutters = gutter * widths.len().saturating_sub(1) as f64;
        let available = width - gutters;
        let mut cursor = x;
        let columns = widths
            .iter()
            .map(|percent| {
                let column = Column {
                    x: cursor,
                    width: available * percent / 100.0,
                };
                cursor += column.width + gutter;
                column
            })
            .collect();
        Self { columns, gutter }
    }

    /// Builds the AGP page grid from the layout constants.
    pub fn for_page(page: &PageGeometry, layout: &LayoutConstants) -> Self {
        Self::percentage(
            page.left_edge(),
            page.content_width(),
            layout.column_gutter,
            &layout.column_widths,
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn gutter(&self) -> f64 {
        self.gutter
    }
}
