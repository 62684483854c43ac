//! Image helpers on top of `genpdf` primitives: unit conversion, decoding of the footer logo,
//! and embedding rasterized charts at an exact display size.

use std::path::Path;

use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Element, Mm, Position, Scale, Size};

use crate::error::ReportError;
use crate::geometry::Rect;
use crate::raster::RasterImage;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts PDF points into `genpdf` millimetres.
pub fn mm_from_pt(points: f64) -> Mm {
    mm_from_f64(points * MM_PER_INCH / POINTS_PER_INCH)
}

/// Converts `genpdf` millimetres into PDF points.
pub fn mm_to_pt(value: Mm) -> f64 {
    mm_to_f64(value) * POINTS_PER_INCH / MM_PER_INCH
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Loads an image file as an RGB raster, flattening any alpha channel onto white.
pub fn raster_from_path(path: impl AsRef<Path>) -> Result<RasterImage, ReportError> {
    let dynamic = decode_image_from_path(path).map_err(|err| ReportError::Image(err.to_string()))?;
    Ok(RasterImage::from_dynamic(&dynamic))
}

/// Scale factors that stretch an image of `natural` size onto `target`.
fn scale_to_fit(natural: Size, target: Rect) -> Scale {
    let axis = |natural: Mm, target: f64| {
        let natural = mm_to_f64(natural);
        if natural > f64::EPSILON {
            mm_to_f64(mm_from_pt(target)) / natural
        } else {
            1.0
        }
    };
    Scale::new(
        axis(natural.width, target.width),
        axis(natural.height, target.height),
    )
}

/// Renders `raster` into `area` so that it covers `target` (page points) exactly.
///
/// Charts are rasterized at a multiple of their display size; the scale computed here
/// brings them back down to the display rectangle.
pub fn embed_raster(
    context: &genpdf::Context,
    area: render::Area<'_>,
    raster: &RasterImage,
    target: Rect,
) -> Result<(), ReportError> {
    let dynamic = raster.to_dynamic()?;
    let natural = estimated_image_size(&dynamic, DEFAULT_IMAGE_DPI);
    let mut image = Image::from_dynamic_image(dynamic)
        .map_err(ReportError::Render)?
        .with_dpi(DEFAULT_IMAGE_DPI)
        .with_position(Position::new(mm_from_pt(target.x), mm_from_pt(target.y)))
        .with_scale(scale_to_fit(natural, target));
    let result = image
        .render(context, area, Style::new())
        .map_err(ReportError::Render)?;
    if result.has_more {
        log::warn!(
            "Image of {}x{} px does not fit at {:?}",
            raster.width(),
            raster.height(),
            target
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_and_millimetres_round_trip() {
        let mm = mm_from_pt(72.0);
        assert!((mm_to_f64(mm) - 25.4).abs() < 1e-9);
        assert!((mm_to_pt(mm) - 72.0).abs() < 1e-9);
    }

    #[test]
    fn scale_maps_natural_size_onto_target() {
        // 300 px at 300 dpi is one inch wide
        let natural = Size::new(mm_from_f64(25.4), mm_from_f64(12.7));
        let scale = scale_to_fit(natural, Rect::new(0.0, 0.0, 36.0, 36.0));
        assert!((scale.x - 0.5).abs() < 1e-9);
        assert!((scale.y - 1.0).abs() < 1e-9);
    }
}
