//! Report info rows: a bold primary text flowing from the left, an optional bold secondary
//! value right-aligned to the section edge with a smaller label just before it, and a thin
//! rule underneath.

use log::warn;

use crate::canvas::{DrawingContext, FontSpec, TextAlign};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::geometry::{Point, Section};

/// The texts of one info row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InfoRow<'a> {
    pub primary: &'a str,
    pub secondary_label: Option<&'a str>,
    pub secondary: Option<&'a str>,
}

impl<'a> InfoRow<'a> {
    pub fn new(primary: &'a str) -> Self {
        Self {
            primary,
            ..Self::default()
        }
    }

    pub fn with_secondary(mut self, label: Option<&'a str>, value: &'a str) -> Self {
        self.secondary_label = label;
        self.secondary = Some(value);
        self
    }
}

/// A horizontal text box: right-aligned text ends at `x + width`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

/// Measurements the row layout depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowMetrics {
    /// Width of the secondary value in the bold default style, when there is one.
    pub secondary_width: Option<f64>,
    pub has_label: bool,
    /// Line height of the bold default style.
    pub line_height: f64,
}

/// Where every part of an info row goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfoRowLayout {
    pub secondary: Option<TextBox>,
    pub label: Option<TextBox>,
    pub primary: Point,
    pub rule_from: Point,
    pub rule_to: Point,
    /// The label box would have had a negative width and was clamped to zero.
    pub label_clamped: bool,
}

/// Computes an info row placed at `origin` inside `section`.
pub fn layout_info_row(
    origin: Point,
    section: &Section,
    metrics: RowMetrics,
    gap: f64,
    label_offset_y: f64,
) -> InfoRowLayout {
    let secondary = metrics.secondary_width.map(|_| TextBox {
        x: origin.x,
        y: origin.y,
        width: section.width(),
    });
    let mut label_clamped = false;
    let label = match metrics.secondary_width {
        Some(secondary_width) if metrics.has_label => {
            let mut width = section.width() - secondary_width - gap;
            if width < 0.0 {
                warn!(
                    "Info row label box is {:.2}pt wide in a {:.2}pt section; clamping to 0",
                    width,
                    section.width()
                );
                width = 0.0;
                label_clamped = true;
            }
            Some(TextBox {
                x: origin.x,
                y: origin.y + label_offset_y,
                width,
            })
        }
        _ => None,
    };
    let rule_y = origin.y + metrics.line_height + gap;
    InfoRowLayout {
        secondary,
        label,
        primary: origin,
        rule_from: Point::new(section.x(), rule_y),
        rule_to: Point::new(section.x() + section.width(), rule_y),
        label_clamped,
    }
}

/// Draws one info row at the cursor and leaves the cursor x at the row origin.
pub fn render_info_row(
    ctx: &mut DrawingContext<'_>,
    section: &Section,
    row: &InfoRow<'_>,
    config: &ReportConfig,
) -> Result<InfoRowLayout, ReportError> {
    let origin = ctx.cursor();
    let layout = &config.layout;
    let value_font = FontSpec::bold(config.fonts.report_info_default);
    let label_font = FontSpec::regular(config.fonts.report_info_label);

    ctx.font(value_font).fill_color(config.palette.report_info);
    let metrics = RowMetrics {
        secondary_width: row.secondary.map(|text| ctx.width_of_string(text)),
        has_label: row.secondary_label.is_some(),
        line_height: ctx.current_line_height(),
    };
    let plan = layout_info_row(
        origin,
        section,
        metrics,
        layout.units(layout.info_row_gap_units),
        layout.info_label_offset_y,
    );

    if let (Some(text), Some(area)) = (row.secondary, plan.secondary) {
        ctx.text_in_box(text, area.x, area.y, area.width, TextAlign::Right)?;
    }
    if let (Some(text), Some(area)) = (row.secondary_label, plan.label) {
        ctx.font(label_font);
        ctx.text_in_box(text, area.x, area.y, area.width, TextAlign::Right)?;
    }

    ctx.font(value_font);
    ctx.text(row.primary, plan.primary.x, plan.primary.y)?;

    ctx.line_width(layout.info_rule_width)
        .stroke_color(config.palette.line_default);
    ctx.stroke_line(plan.rule_from, plan.rule_to)?;

    ctx.set_x(origin.x);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::RecordingSurface;
    use crate::geometry::{Rect, SectionId, SectionText};

    fn section(width: f64) -> Section {
        Section {
            id: SectionId::ReportInfo,
            rect: Rect::new(10.0, 20.0, width, 40.0),
            bordered: false,
            text: SectionText::default(),
        }
    }

    #[test]
    fn label_box_fills_space_left_of_secondary() {
        let plan = layout_info_row(
            Point::new(10.0, 20.0),
            &section(100.0),
            RowMetrics {
                secondary_width: Some(30.0),
                has_label: true,
                line_height: 12.0,
            },
            1.8,
            1.0,
        );
        let label = plan.label.expect("label box");
        assert!((label.width - 68.2).abs() < 1e-9);
        assert_eq!(label.y, 21.0);
        assert!(!plan.label_clamped);
        assert_eq!(plan.rule_from.x, 10.0);
        assert_eq!(plan.rule_to.x, 110.0);
        assert!((plan.rule_from.y - 33.8).abs() < 1e-9);
        assert_eq!(plan.rule_from.y, plan.rule_to.y);
    }

    #[test]
    fn negative_label_width_is_clamped() {
        let plan = layout_info_row(
            Point::new(10.0, 20.0),
            &section(100.0),
            RowMetrics {
                secondary_width: Some(120.0),
                has_label: true,
                line_height: 12.0,
            },
            1.8,
            1.0,
        );
        assert_eq!(plan.label.map(|label| label.width), Some(0.0));
        assert!(plan.label_clamped);
    }

    #[test]
    fn label_without_secondary_is_not_placed() {
        let plan = layout_info_row(
            Point::new(0.0, 0.0),
            &section(100.0),
            RowMetrics {
                secondary_width: None,
                has_label: true,
                line_height: 12.0,
            },
            1.8,
            1.0,
        );
        assert_eq!(plan.secondary, None);
        assert_eq!(plan.label, None);
    }

    #[test]
    fn row_draws_secondary_first_and_restores_x() {
        let config = ReportConfig::default();
        let section = section(100.0);
        let mut surface = RecordingSurface::default();
        {
            let mut ctx = DrawingContext::new(&mut surface);
            ctx.move_to(10.0, 20.0);
            let row = InfoRow::new("Jane Doe").with_secondary(Some("DOB:"), "Jan 2, 1990");
            render_info_row(&mut ctx, &section, &row, &config).unwrap();
            // text() moved the cursor one line down from the row origin
            assert_eq!(ctx.cursor(), Point::new(10.0, 32.0));
        }
        let texts = surface.texts();
        let names: Vec<&str> = texts.iter().map(|(text, ..)| *text).collect();
        assert_eq!(names, vec!["Jan 2, 1990", "DOB:", "Jane Doe"]);

        // 11 characters at 10pt bold, 5pt each
        let (_, secondary_origin, _) = texts[0];
        assert_eq!(secondary_origin, Point::new(55.0, 20.0));
        // label box is 100 - 55 - 1.8 wide; 4 characters at 8pt
        let (_, label_origin, label_font) = texts[1];
        assert_eq!(label_font, FontSpec::regular(8));
        assert!((label_origin.x - (10.0 + 43.2 - 16.0)).abs() < 1e-9);
        assert_eq!(label_origin.y, 21.0);
        assert_eq!(texts[2].1, Point::new(10.0, 20.0));

        let lines = surface.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].2, 0.25);
        assert!((lines[0].0.y - 33.8).abs() < 1e-9);
    }
}
