use std::error::Error;

use agp_report::model::{AgpStats, Patient};
use agp_report::raster::RasterImage;
use agp_report::ReportBuilder;
use image::{DynamicImage, ImageBuffer, Rgba};

/// A two-tone wordmark placeholder, 4:1 like a typical footer logo.
fn placeholder_logo() -> RasterImage {
    let image = ImageBuffer::from_fn(320, 80, |x, y| {
        let inside = x > 8 && x < 312 && y > 8 && y < 72;
        match (inside, x < 120) {
            (false, _) => Rgba([0, 0, 0, 0]),
            (true, true) => Rgba([0x3A, 0x9E, 0x50, 255]),
            (true, false) => Rgba([0x75, 0x75, 0x75, 255]),
        }
    });
    RasterImage::from_dynamic(&DynamicImage::ImageRgba8(image))
}

fn main() -> Result<(), Box<dyn Error>> {
    let stats = AgpStats::from_json(include_str!("sample_stats.json"))?;
    let patient: Patient = serde_json::from_str(include_str!("sample_patient.json"))?;

    let report = ReportBuilder::new(stats)
        .with_patient(patient)
        .with_logo(placeholder_logo())
        .render()?;
    std::fs::write("agp_report.pdf", &report.bytes)?;
    println!("Generated agp_report.pdf ({} bytes)", report.bytes.len());
    Ok(())
}
