//! The AGP page: composes header, footer, section containers, report info and the
//! time-in-range chart onto one page of a `genpdf` document.

use genpdf::error::Error;
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{Context, Element, RenderResult};
use log::{debug, info};

use crate::canvas::{DrawingContext, FontSpec, PdfSurface};
use crate::chart::{chart_rect, synthesize_time_in_range, ChartSpec};
use crate::config::ReportConfig;
use crate::container::render_section_containers;
use crate::error::ReportError;
use crate::geometry::{ColumnLayout, PageGeometry, PageSections, Rect, SectionId};
use crate::model::{AgpStats, BoundsConfig, Patient};
use crate::raster::{ChartRasterizer, PlottersRasterizer, RasterImage};
use crate::report_info::render_report_info;

/// One AGP report page.
///
/// The page paints in page coordinates, so it expects a render area that starts at the
/// top-left corner of the paper (no decorator margins).
pub struct AgpPage {
    config: ReportConfig,
    geometry: PageGeometry,
    sections: PageSections,
    columns: ColumnLayout,
    stats: AgpStats,
    bounds: BoundsConfig,
    patient: Patient,
    logo: Option<RasterImage>,
    rasterizer: Box<dyn ChartRasterizer>,
}

impl AgpPage {
    /// Lays out the page sections and column grid for the given statistics.
    pub fn new(config: ReportConfig, geometry: PageGeometry, stats: AgpStats) -> Self {
        let sections = PageSections::new(&geometry, &config.layout, &config.text);
        let columns = ColumnLayout::for_page(&geometry, &config.layout);
        Self {
            config,
            geometry,
            sections,
            columns,
            stats,
            bounds: BoundsConfig::default(),
            patient: Patient::default(),
            logo: None,
            rasterizer: Box::new(PlottersRasterizer::new()),
        }
    }

    pub fn with_bounds(mut self, bounds: BoundsConfig) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.patient = patient;
        self
    }

    /// Sets the image printed at the right end of the footer.
    pub fn with_logo(mut self, logo: RasterImage) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Replaces the chart rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: impl ChartRasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    pub fn sections(&self) -> &PageSections {
        &self.sections
    }

    pub fn columns(&self) -> &ColumnLayout {
        &self.columns
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn render_header(&self, ctx: &mut DrawingContext<'_>) -> Result<(), ReportError> {
        let text = &self.config.text;
        let x = self.geometry.left_edge();
        let y = self.geometry.top_edge();
        let header = format!("{} ", text.report_header);

        ctx.font(FontSpec::bold(self.config.fonts.report_header))
            .fill_color(self.config.palette.report_header);
        let header_width = ctx.width_of_string(&header);
        ctx.text(&header, x, y)?;
        ctx.font(FontSpec::regular(self.config.fonts.report_header));
        ctx.text(&text.report_sub_header, x + header_width, y)
    }

    fn render_footer(&self, ctx: &mut DrawingContext<'_>) -> Result<(), ReportError> {
        let layout = &self.config.layout;
        let bottom = self.geometry.bottom_edge();
        ctx.font(FontSpec::regular(self.config.fonts.report_footer))
            .fill_color(self.config.palette.report_footer);
        let y = bottom - ctx.current_line_height() * layout.footer_line_factor;
        ctx.text(&self.config.text.report_footer, self.geometry.left_edge(), y)?;

        if let Some(logo) = &self.logo {
            let width = layout.logo_width;
            let height = width * f64::from(logo.height()) / f64::from(logo.width().max(1));
            ctx.move_to(
                self.geometry.width - width - self.geometry.margins.right,
                bottom - width * layout.logo_offset_factor,
            );
            ctx.image(logo, width, height)?;
        }
        Ok(())
    }

    fn chart_area(&self) -> Rect {
        chart_rect(
            self.sections.get(SectionId::TimeInRanges),
            &self.config.layout,
        )
    }

    /// The time-in-range chart description, or `None` when there is no data to chart.
    pub fn time_in_range_chart(&self) -> Option<ChartSpec> {
        synthesize_time_in_range(
            &self.stats.time_in_range.data,
            &self.bounds,
            self.chart_area(),
            &self.config,
        )
    }

    /// Draws the time-in-range chart. Returns whether a chart was drawn.
    fn render_time_in_ranges(&self, ctx: &mut DrawingContext<'_>) -> Result<bool, ReportError> {
        let area = self.chart_area();
        ctx.move_to(area.x, area.y);

        let Some(spec) = self.time_in_range_chart() else {
            return Ok(false);
        };
        let image = self.rasterizer.rasterize(&spec)?;
        ctx.image(&image, spec.layout.display_width, spec.layout.display_height)?;
        Ok(true)
    }

    /// Paints the whole page in its fixed order.
    pub fn paint(&self, ctx: &mut DrawingContext<'_>) -> Result<(), ReportError> {
        self.render_header(ctx)?;
        self.render_footer(ctx)?;
        render_section_containers(ctx, &self.sections, &self.config)?;
        render_report_info(
            ctx,
            self.sections.get(SectionId::ReportInfo),
            &self.patient,
            &self.stats.sensor_usage.data.raw,
            &self.config,
        )?;
        if self.render_time_in_ranges(ctx)? {
            info!("Rendered AGP page with time in range chart");
        } else {
            info!("Rendered AGP page without time in range data");
        }
        Ok(())
    }
}

impl Element for AgpPage {
    fn render(
        &mut self,
        context: &Context,
        area: Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let size = area.size();
        debug!("Rendering AGP page into {:?}", size);
        let mut surface = PdfSurface::new(context, area);
        let mut ctx = DrawingContext::new(&mut surface);
        self.paint(&mut ctx).map_err(ReportError::into_genpdf)?;
        Ok(RenderResult {
            size,
            has_more: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::canvas::testing::{Op, RecordingSurface};
    use crate::geometry::Point;
    use crate::model::{CategoryDatum, StatisticRecord};

    struct SolidRasterizer {
        calls: Rc<Cell<usize>>,
    }

    impl ChartRasterizer for SolidRasterizer {
        fn rasterize(&self, spec: &ChartSpec) -> Result<RasterImage, ReportError> {
            self.calls.set(self.calls.get() + 1);
            let (width, height) = (spec.layout.width_px, spec.layout.height_px);
            RasterImage::new(width, height, vec![200; width as usize * height as usize * 3])
        }
    }

    struct FailingRasterizer;

    impl ChartRasterizer for FailingRasterizer {
        fn rasterize(&self, _spec: &ChartSpec) -> Result<RasterImage, ReportError> {
            Err(ReportError::Rasterization("backend offline".into()))
        }
    }

    fn stats(total: f64) -> AgpStats {
        let mut stats = AgpStats::default();
        stats.time_in_range.data = StatisticRecord::new(
            total,
            vec![
                CategoryDatum::new("veryLow", 1.0),
                CategoryDatum::new("low", 4.0),
                CategoryDatum::new("target", 70.0),
                CategoryDatum::new("high", 20.0),
                CategoryDatum::new("veryHigh", 5.0),
            ],
        );
        stats
    }

    fn paint(page: &AgpPage) -> (Result<(), ReportError>, RecordingSurface) {
        let mut surface = RecordingSurface::default();
        let result = {
            let mut ctx = DrawingContext::new(&mut surface);
            page.paint(&mut ctx)
        };
        (result, surface)
    }

    #[test]
    fn chart_is_embedded_at_display_size() {
        let calls = Rc::new(Cell::new(0));
        let page = AgpPage::new(ReportConfig::default(), PageGeometry::letter(), stats(100.0))
            .with_rasterizer(SolidRasterizer {
                calls: Rc::clone(&calls),
            });
        let (result, surface) = paint(&page);
        result.unwrap();
        assert_eq!(calls.get(), 1);
        let images = surface.images();
        // four section cards, then the chart
        assert_eq!(images.len(), 5);
        assert_eq!(
            images.last(),
            Some(&(2088, 1568, Rect::new(45.0, 73.0, 261.0, 196.0)))
        );
    }

    #[test]
    fn empty_statistic_skips_rasterizer() {
        let calls = Rc::new(Cell::new(0));
        let page = AgpPage::new(ReportConfig::default(), PageGeometry::letter(), stats(0.0))
            .with_rasterizer(SolidRasterizer {
                calls: Rc::clone(&calls),
            });
        let (result, surface) = paint(&page);
        result.unwrap();
        assert_eq!(calls.get(), 0);
        let chart = page.chart_area();
        let images = surface.images();
        assert_eq!(images.len(), 4);
        assert!(images.iter().all(|(_, _, rect)| *rect != chart));
    }

    #[test]
    fn rasterization_failure_aborts_the_page() {
        let page = AgpPage::new(ReportConfig::default(), PageGeometry::letter(), stats(100.0))
            .with_rasterizer(FailingRasterizer);
        let (result, _) = paint(&page);
        assert!(matches!(result, Err(ReportError::Rasterization(_))));
    }

    #[test]
    fn header_continues_on_the_same_line() {
        let page = AgpPage::new(ReportConfig::default(), PageGeometry::letter(), stats(0.0));
        let (result, surface) = paint(&page);
        result.unwrap();
        let texts = surface.texts();
        assert_eq!(texts[0].0, "AGP Report: ");
        assert_eq!(texts[0].1, Point::new(36.0, 36.0));
        assert_eq!(texts[0].2, FontSpec::bold(14));
        assert_eq!(texts[1].0, "Continuous Glucose Monitoring");
        // 12 characters at 14pt
        assert_eq!(texts[1].1, Point::new(36.0 + 84.0, 36.0));
        assert_eq!(texts[1].2, FontSpec::regular(14));
    }

    #[test]
    fn footer_and_logo_sit_above_bottom_edge() {
        let logo = RasterImage::new(140, 28, vec![0; 140 * 28 * 3]).unwrap();
        let page = AgpPage::new(ReportConfig::default(), PageGeometry::letter(), stats(0.0))
            .with_logo(logo);
        let (result, surface) = paint(&page);
        result.unwrap();
        let footer = surface
            .texts()
            .into_iter()
            .find(|(text, ..)| text.starts_with("Ambulatory Glucose Profile (AGP) report"))
            .expect("footer drawn");
        // 7pt lines are 8.4pt tall
        assert!((footer.1.y - (756.0 - 8.4 * 1.25)).abs() < 1e-9);
        let logo_rect = surface
            .ops
            .iter()
            .find_map(|op| match op {
                Op::Image {
                    width: 140,
                    height: 28,
                    rect,
                } => Some(*rect),
                _ => None,
            })
            .expect("logo drawn");
        assert_eq!(logo_rect.x, 612.0 - 70.0 - 36.0);
        assert!((logo_rect.y - (756.0 - 12.25)).abs() < 1e-9);
        assert_eq!((logo_rect.width, logo_rect.height), (70.0, 14.0));
    }

    #[test]
    fn column_grid_is_available_after_construction() {
        let page = AgpPage::new(ReportConfig::default(), PageGeometry::letter(), stats(0.0));
        let columns = page.columns().columns();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].x, 36.0);
    }
}
