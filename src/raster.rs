//! Chart rasterization: the [`ChartRasterizer`] boundary and its `plotters` implementation.

use std::fmt::Display;

use image::{DynamicImage, RgbImage};
use log::debug;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_bitmap::BitMapBackend;

use crate::chart::{ChartLayout, ChartSpec, LabelPosition};
use crate::config::Rgb;
use crate::error::ReportError;
use crate::fonts::{self, CHART_FONT_FAMILY};

/// An 8-bit RGB image stored row by row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl RasterImage {
    /// Wraps a pixel buffer of `width × height × 3` bytes.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, ReportError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(ReportError::Image(format!(
                "pixel buffer holds {} bytes, {}x{} RGB needs {}",
                rgb.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, rgb })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.rgb
    }

    /// The color of the pixel at `(x, y)`, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb::new(
            self.rgb[offset],
            self.rgb[offset + 1],
            self.rgb[offset + 2],
        ))
    }

    /// Converts any decoded image, flattening transparency onto white.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let rgb = rgba
            .pixels()
            .flat_map(|pixel| {
                let [r, g, b, a] = pixel.0;
                let alpha = u32::from(a);
                let blend = |channel: u8| {
                    ((u32::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8
                };
                [blend(r), blend(g), blend(b)]
            })
            .collect();
        Self { width, height, rgb }
    }

    pub fn to_dynamic(&self) -> Result<DynamicImage, ReportError> {
        RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| ReportError::Image("pixel buffer does not match its size".to_owned()))
    }
}

/// Turns a chart description into pixels. The call blocks until the image is ready.
pub trait ChartRasterizer {
    fn rasterize(&self, spec: &ChartSpec) -> Result<RasterImage, ReportError>;
}

impl<R: ChartRasterizer + ?Sized> ChartRasterizer for Box<R> {
    fn rasterize(&self, spec: &ChartSpec) -> Result<RasterImage, ReportError> {
        (**self).rasterize(spec)
    }
}

/// Paints chart specs with `plotters` into an in-memory bitmap.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlottersRasterizer;

impl PlottersRasterizer {
    pub fn new() -> Self {
        Self
    }
}

fn backend_error<E: Display>(err: E) -> ReportError {
    ReportError::Rasterization(err.to_string())
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.r, rgb.g, rgb.b)
}

fn text_style(size: f64, rgb: Rgb, pos: Pos) -> TextStyle<'static> {
    (CHART_FONT_FAMILY, size)
        .into_font()
        .color(&color(rgb))
        .pos(pos)
}

/// Maps chart domain coordinates onto bitmap pixels.
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    x_range: [f64; 2],
    y_range: [f64; 2],
}

impl PlotArea {
    fn new(layout: &ChartLayout) -> Self {
        let margins = layout.margins;
        Self {
            left: margins.left,
            top: margins.top,
            width: (f64::from(layout.width_px) - margins.left - margins.right).max(0.0),
            height: (f64::from(layout.height_px) - margins.top - margins.bottom).max(0.0),
            x_range: layout.x_range,
            y_range: layout.y_range,
        }
    }

    fn x(&self, value: f64) -> i32 {
        let [start, end] = self.x_range;
        (self.left + (value - start) / (end - start) * self.width).round() as i32
    }

    /// Domain values grow upwards.
    fn y(&self, value: f64) -> i32 {
        let [start, end] = self.y_range;
        (self.top + self.height - (value - start) / (end - start) * self.height).round() as i32
    }
}

fn paint<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    spec: &ChartSpec,
) -> Result<(), ReportError> {
    let layout = &spec.layout;
    root.fill(&color(layout.background)).map_err(backend_error)?;

    let plot = PlotArea::new(layout);
    // the column starts at the left edge of the x domain
    let bar_left = plot.x(layout.x_range[0]);
    let bar_right = plot.x(layout.x_range[0] + layout.bar_width);
    let label_gap = layout.tick_length.round() as i32;

    let mut base = 0.0;
    for trace in &spec.traces {
        let top = base + trace.height;
        root.draw(&Rectangle::new(
            [(bar_left, plot.y(top)), (bar_right, plot.y(base))],
            color(trace.color).filled(),
        ))
        .map_err(backend_error)?;

        let (label_x, anchor) = match trace.label_position {
            LabelPosition::Outside => (bar_right + label_gap, HPos::Left),
        };
        root.draw(&Text::new(
            trace.label.clone(),
            (label_x, plot.y(base + trace.height / 2.0)),
            text_style(
                layout.text_size(layout.value_font_size),
                trace.label_color,
                Pos::new(anchor, VPos::Center),
            ),
        ))
        .map_err(backend_error)?;
        base = top;
    }

    // dividers between stacked segments
    let mut boundary = 0.0;
    for (trace, next) in spec.traces.iter().zip(spec.traces.iter().skip(1)) {
        boundary += trace.height;
        let width = next.divider_width.max(trace.divider_width).round().max(1.0) as u32;
        let y = plot.y(boundary);
        root.draw(&PathElement::new(
            vec![(bar_left, y), (bar_right, y)],
            color(trace.divider_color).stroke_width(width),
        ))
        .map_err(backend_error)?;
    }

    for (value, text) in layout.tick_values.iter().zip(&layout.tick_text) {
        root.draw(&Text::new(
            text.clone(),
            (plot.x(layout.x_range[0]) - label_gap, plot.y(*value)),
            text_style(
                layout.text_size(layout.tick_font_size),
                layout.font_color,
                Pos::new(HPos::Right, VPos::Center),
            ),
        ))
        .map_err(backend_error)?;
    }

    root.present().map_err(backend_error)
}

impl ChartRasterizer for PlottersRasterizer {
    fn rasterize(&self, spec: &ChartSpec) -> Result<RasterImage, ReportError> {
        fonts::register_chart_font()?;
        let (width, height) = (spec.layout.width_px, spec.layout.height_px);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            paint(&root, spec)?;
        }
        debug!(
            "Rasterized {} chart segments into {}x{} px",
            spec.traces.len(),
            width,
            height
        );
        RasterImage::new(width, height, buffer)
    }
}
