//! The drawing context shared by every page renderer.
//!
//! Renderers never talk to `genpdf` directly. They paint through a [`DrawingContext`], which
//! owns the cursor position and the current font, fill and stroke state, and forwards the
//! primitive operations to a [`Surface`]. [`PdfSurface`] is the surface backed by a
//! `genpdf` render area; tests use a recording surface instead.
//!
//! There are no filled shapes: filled backgrounds are rasterized by their renderer and drawn
//! as images.

use genpdf::style::Style;
use genpdf::{render, Position};
use log::debug;

use crate::config::Rgb;
use crate::elements::{self, mm_from_pt, mm_to_pt};
use crate::error::ReportError;
use crate::geometry::{Point, Rect};
use crate::raster::RasterImage;

/// Weight of the bundled font family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// A font selection: weight and size in points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSpec {
    pub weight: FontWeight,
    pub size: u8,
}

impl FontSpec {
    pub const fn regular(size: u8) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
        }
    }

    pub const fn bold(size: u8) -> Self {
        Self {
            weight: FontWeight::Bold,
            size,
        }
    }

    fn to_style(self, color: Rgb) -> Style {
        let mut style = Style::new().with_font_size(self.size).with_color(color.into());
        if self.weight == FontWeight::Bold {
            style.set_bold();
        }
        style
    }
}

/// Horizontal alignment of text inside a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

/// Primitive painting operations in page coordinates (points, origin top-left).
pub trait Surface {
    /// Strokes a straight line.
    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Rgb,
    ) -> Result<(), ReportError>;

    /// Draws a single line of text whose top-left corner is `origin`.
    fn draw_text(
        &mut self,
        text: &str,
        origin: Point,
        font: FontSpec,
        color: Rgb,
    ) -> Result<(), ReportError>;

    /// Width of `text` in the given font.
    fn text_width(&self, text: &str, font: FontSpec) -> f64;

    /// Line height of the given font.
    fn line_height(&self, font: FontSpec) -> f64;

    /// Draws a raster image scaled to fill `rect`.
    fn draw_image(&mut self, image: &RasterImage, rect: Rect) -> Result<(), ReportError>;
}

/// Cursor and style state layered over a [`Surface`].
///
/// Text drawn at an explicit position moves the cursor to the start of the following line,
/// the way a flowing text canvas does.
pub struct DrawingContext<'s> {
    surface: &'s mut dyn Surface,
    cursor: Point,
    font: FontSpec,
    fill: Rgb,
    stroke: Rgb,
    line_width: f64,
}

impl<'s> DrawingContext<'s> {
    /// Creates a context with the cursor at the page origin.
    pub fn new(surface: &'s mut dyn Surface) -> Self {
        Self {
            surface,
            cursor: Point::default(),
            font: FontSpec::regular(10),
            fill: Rgb::new(0, 0, 0),
            stroke: Rgb::new(0, 0, 0),
            line_width: 1.0,
        }
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.cursor = Point::new(x, y);
    }

    pub fn set_x(&mut self, x: f64) {
        self.cursor.x = x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.cursor.y = y;
    }

    /// Moves the cursor down by `lines` lines of the current font.
    pub fn move_down(&mut self, lines: f64) {
        self.cursor.y += lines * self.current_line_height();
    }

    pub fn font(&mut self, font: FontSpec) -> &mut Self {
        self.font = font;
        self
    }

    pub fn fill_color(&mut self, color: Rgb) -> &mut Self {
        self.fill = color;
        self
    }

    pub fn stroke_color(&mut self, color: Rgb) -> &mut Self {
        self.stroke = color;
        self
    }

    pub fn line_width(&mut self, width: f64) -> &mut Self {
        self.line_width = width;
        self
    }

    pub fn current_font(&self) -> FontSpec {
        self.font
    }

    pub fn current_line_height(&self) -> f64 {
        self.surface.line_height(self.font)
    }

    pub fn width_of_string(&self, text: &str) -> f64 {
        self.surface.text_width(text, self.font)
    }

    /// Draws left-aligned text at `(x, y)` in the current font and fill color.
    pub fn text(&mut self, text: &str, x: f64, y: f64) -> Result<(), ReportError> {
        self.surface
            .draw_text(text, Point::new(x, y), self.font, self.fill)?;
        self.cursor = Point::new(x, y + self.current_line_height());
        Ok(())
    }

    /// Draws text aligned inside the box `[x, x + width]` and returns where it was placed.
    pub fn text_in_box(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        width: f64,
        align: TextAlign,
    ) -> Result<Point, ReportError> {
        let origin = match align {
            TextAlign::Left => Point::new(x, y),
            TextAlign::Right => Point::new(x + width - self.width_of_string(text), y),
        };
        self.surface.draw_text(text, origin, self.font, self.fill)?;
        self.cursor = Point::new(x, y + self.current_line_height());
        Ok(origin)
    }

    pub fn stroke_line(&mut self, from: Point, to: Point) -> Result<(), ReportError> {
        self.surface
            .stroke_line(from, to, self.line_width, self.stroke)
    }

    /// Draws an image at the cursor, scaled to `width × height`, then moves below it.
    pub fn image(
        &mut self,
        image: &RasterImage,
        width: f64,
        height: f64,
    ) -> Result<(), ReportError> {
        let rect = Rect::new(self.cursor.x, self.cursor.y, width, height);
        self.surface.draw_image(image, rect)?;
        self.cursor.y += height;
        Ok(())
    }
}

/// The rectangle covered by a horizontal or vertical stroke of `width`, centred on the line.
/// Slanted and zero-width strokes have none.
pub fn stroke_rect(from: Point, to: Point, width: f64) -> Option<Rect> {
    if !(width > 0.0) {
        return None;
    }
    let half = width / 2.0;
    if from.y == to.y {
        let x = from.x.min(to.x);
        Some(Rect::new(x, from.y - half, (to.x - from.x).abs(), width))
    } else if from.x == to.x {
        let y = from.y.min(to.y);
        Some(Rect::new(from.x - half, y, width, (to.y - from.y).abs()))
    } else {
        None
    }
}

/// A [`Surface`] painting into a `genpdf` render area whose origin is the page origin.
///
/// `genpdf` lines always use the default line width, so horizontal and vertical strokes are
/// drawn as a one-pixel image stretched over [`stroke_rect`]. Other strokes fall back to a
/// default-width line.
pub struct PdfSurface<'a, 'p> {
    context: &'a genpdf::Context,
    area: render::Area<'p>,
}

impl<'a, 'p> PdfSurface<'a, 'p> {
    pub fn new(context: &'a genpdf::Context, area: render::Area<'p>) -> Self {
        Self { context, area }
    }

    fn position(point: Point) -> Position {
        Position::new(mm_from_pt(point.x), mm_from_pt(point.y))
    }
}

impl Surface for PdfSurface<'_, '_> {
    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Rgb,
    ) -> Result<(), ReportError> {
        if let Some(rect) = stroke_rect(from, to, width) {
            let pixel = RasterImage::new(1, 1, vec![color.r, color.g, color.b])?;
            return elements::embed_raster(self.context, self.area.clone(), &pixel, rect);
        }
        debug!(
            "Stroke from {:?} to {:?} drawn at the default width instead of {}",
            from, to, width
        );
        self.area.draw_line(
            vec![Self::position(from), Self::position(to)],
            Style::new().with_color(color.into()),
        );
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        origin: Point,
        font: FontSpec,
        color: Rgb,
    ) -> Result<(), ReportError> {
        let printed = self
            .area
            .print_str(
                &self.context.font_cache,
                Self::position(origin),
                font.to_style(color),
                text,
            )
            .map_err(ReportError::Render)?;
        if !printed {
            debug!("Text `{}` at {:?} falls outside the page area", text, origin);
        }
        Ok(())
    }

    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        let style = font.to_style(Rgb::new(0, 0, 0));
        mm_to_pt(style.str_width(&self.context.font_cache, text))
    }

    fn line_height(&self, font: FontSpec) -> f64 {
        let style = font.to_style(Rgb::new(0, 0, 0));
        mm_to_pt(style.line_height(&self.context.font_cache))
    }

    fn draw_image(&mut self, image: &RasterImage, rect: Rect) -> Result<(), ReportError> {
        elements::embed_raster(self.context, self.area.clone(), image, rect)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Op, RecordingSurface};
    use super::*;

    #[test]
    fn text_moves_cursor_to_next_line() {
        let mut surface = RecordingSurface::default();
        let mut ctx = DrawingContext::new(&mut surface);
        ctx.font(FontSpec::bold(10));
        ctx.text("Hello", 20.0, 30.0).unwrap();
        assert_eq!(ctx.cursor(), Point::new(20.0, 42.0));
        ctx.move_down(1.0);
        assert_eq!(ctx.cursor(), Point::new(20.0, 54.0));
    }

    #[test]
    fn right_aligned_text_ends_at_box_edge() {
        let mut surface = RecordingSurface::default();
        let mut ctx = DrawingContext::new(&mut surface);
        ctx.font(FontSpec::regular(10));
        let origin = ctx
            .text_in_box("abcd", 0.0, 0.0, 100.0, TextAlign::Right)
            .unwrap();
        assert_eq!(origin, Point::new(80.0, 0.0));
    }

    #[test]
    fn strokes_use_current_style() {
        let mut surface = RecordingSurface::default();
        {
            let mut ctx = DrawingContext::new(&mut surface);
            ctx.stroke_color(Rgb::new(255, 0, 0)).line_width(0.25);
            ctx.stroke_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0))
                .unwrap();
        }
        assert_eq!(
            surface.ops,
            vec![Op::Line {
                from: Point::new(0.0, 0.0),
                to: Point::new(10.0, 0.0),
                width: 0.25,
                color: Rgb::new(255, 0, 0),
            }]
        );
        assert_eq!(surface.lines()[0].2, 0.25);
    }

    #[test]
    fn axis_aligned_strokes_cover_their_width() {
        assert_eq!(
            stroke_rect(Point::new(10.0, 20.0), Point::new(4.0, 20.0), 0.25),
            Some(Rect::new(4.0, 19.875, 6.0, 0.25))
        );
        assert_eq!(
            stroke_rect(Point::new(3.0, 0.0), Point::new(3.0, 8.0), 1.0),
            Some(Rect::new(2.5, 0.0, 1.0, 8.0))
        );
        assert_eq!(stroke_rect(Point::new(0.0, 0.0), Point::new(1.0, 1.0), 1.0), None);
        assert_eq!(stroke_rect(Point::new(0.0, 0.0), Point::new(1.0, 0.0), 0.0), None);
    }
}
