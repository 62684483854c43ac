//! Section containers: the shaded rounded card behind bordered sections, and the title,
//! subtitle and description text of every section.

use image::{Rgb as Pixel, RgbImage};
use log::debug;

use crate::canvas::{DrawingContext, FontSpec};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::geometry::{PageSections, Point, Rect, Section};
use crate::raster::RasterImage;

/// Rasterizes the card behind a bordered section: a shaded rounded rectangle with a white
/// body inset below the title band. A plain white strip squares off the top corners of the
/// body. Pixels outside the card are white.
pub fn card_raster(section: &Section, config: &ReportConfig) -> Result<RasterImage, ReportError> {
    let layout = &config.layout;
    let palette = &config.palette;
    let radius = layout.border_radius;
    let inset = layout.border_inset;
    let header = layout.units(layout.header_height_units);
    let body_y = section.y() + inset + header;
    let body_width = section.width() - 2.0 * inset;
    let strip = Rect::new(section.x() + inset, body_y, body_width, radius);
    let body = Rect::new(
        section.x() + inset,
        body_y,
        body_width,
        section.height() - 2.0 * inset - header,
    );

    let scale = layout.card_render_scale;
    if !(scale > 0.0) {
        return Err(ReportError::Image(format!(
            "card render scale must be positive, got {}",
            scale
        )));
    }
    let width = (section.width() * scale).ceil().max(1.0) as u32;
    let height = (section.height() * scale).ceil().max(1.0) as u32;
    let [shaded, white] = [palette.background_shaded, palette.white]
        .map(|color| Pixel([color.r, color.g, color.b]));

    let card = RgbImage::from_fn(width, height, |px, py| {
        let point = Point::new(
            section.x() + (f64::from(px) + 0.5) / scale,
            section.y() + (f64::from(py) + 0.5) / scale,
        );
        if strip.contains_rounded(point, 0.0) || body.contains_rounded(point, radius - inset) {
            white
        } else if section.rect.contains_rounded(point, radius) {
            shaded
        } else {
            white
        }
    });
    RasterImage::new(width, height, card.into_raw())
}

fn render_border(
    ctx: &mut DrawingContext<'_>,
    section: &Section,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let card = card_raster(section, config)?;
    ctx.move_to(section.x(), section.y());
    ctx.image(&card, section.width(), section.height())
}

fn render_text(
    ctx: &mut DrawingContext<'_>,
    section: &Section,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let layout = &config.layout;
    let palette = &config.palette;
    let fonts = &config.fonts;
    let header = layout.units(layout.header_height_units);
    let centred_in_header =
        |line_height: f64| section.y() + layout.border_inset + (header - line_height) / 2.0;

    if let Some(title) = &section.text.title {
        let title_x = section.x() + layout.title_padding_x;
        ctx.font(FontSpec::bold(fonts.section_title))
            .fill_color(palette.section_title);
        let title_y = centred_in_header(ctx.current_line_height());
        ctx.text(title, title_x, title_y)?;

        if let Some(subtitle) = &section.text.subtitle {
            let subtitle_x =
                title_x + ctx.width_of_string(title) + layout.units(layout.subtitle_gap_units);
            ctx.font(FontSpec::regular(fonts.section_subtitle))
                .fill_color(palette.section_subtitle);
            let subtitle_y = centred_in_header(ctx.current_line_height());
            ctx.text(subtitle, subtitle_x, subtitle_y)?;
        }
    }

    if let Some(description) = &section.text.description {
        ctx.font(FontSpec::regular(fonts.section_description))
            .fill_color(palette.section_description);
        ctx.text(
            description,
            section.x() + layout.units(layout.description_padding_x_units),
            section.y() + header + layout.units(layout.description_padding_y_units),
        )?;
    }
    Ok(())
}

/// Paints every section in definition order. The context's font, colors and cursor are left
/// wherever the last section put them.
pub fn render_section_containers(
    ctx: &mut DrawingContext<'_>,
    sections: &PageSections,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    for section in sections.iter() {
        debug!("Painting section {} at {:?}", section.id.key(), section.rect);
        if section.bordered {
            render_border(ctx, section, config)?;
        }
        render_text(ctx, section, config)?;
    }
    Ok(())
}
