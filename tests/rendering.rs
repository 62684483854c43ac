use agp_report::chart::ChartSpec;
use agp_report::config::Rgb;
use agp_report::fonts;
use agp_report::model::{AgpStats, Patient};
use agp_report::raster::{ChartRasterizer, PlottersRasterizer, RasterImage};
use agp_report::{ReportBuilder, ReportError};
use sha2::{Digest, Sha256};

const SAMPLE_STATS: &str = r#"{
    "timeInRange": {
        "id": "timeInRange",
        "data": {
            "total": { "value": 100 },
            "data": [
                { "id": "veryLow", "value": 1 },
                { "id": "low", "value": 4 },
                { "id": "target", "value": 70 },
                { "id": "high", "value": 20 },
                { "id": "veryHigh", "value": 5 }
            ]
        }
    },
    "sensorUsage": {
        "id": "sensorUsage",
        "data": {
            "raw": {
                "cgmDaysWorn": 14,
                "oldestDatum": { "time": 1709208000000 },
                "newestDatum": { "time": 1710417600000 },
                "sensorUsageAGP": 93.4
            }
        }
    }
}"#;

/// Fills the whole chart with one color.
struct FlatRasterizer(Rgb);

impl ChartRasterizer for FlatRasterizer {
    fn rasterize(&self, spec: &ChartSpec) -> Result<RasterImage, ReportError> {
        let (width, height) = (spec.layout.width_px / 8, spec.layout.height_px / 8);
        let rgb = [self.0.r, self.0.g, self.0.b].repeat(width as usize * height as usize);
        RasterImage::new(width, height, rgb)
    }
}

fn sample_builder() -> ReportBuilder {
    let stats = AgpStats::from_json(SAMPLE_STATS).expect("sample stats");
    let patient: Patient =
        serde_json::from_str(r#"{ "fullName": "Jill Jellyfish", "birthday": "1984-02-29" }"#)
            .expect("sample patient");
    ReportBuilder::new(stats)
        .with_patient(patient)
        .with_rasterizer(FlatRasterizer(Rgb::new(0x3A, 0x9E, 0x50)))
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let bytes = sample_builder()
        .render()
        .expect("render sample pdf")
        .bytes;

    Some(bytes)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    Sha256::digest(&normalized).into()
}

const FONTS_MISSING: &str =
    "bundled fonts missing. Set AGP_REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

#[test]
fn renders_non_empty_output() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping renders_non_empty_output: {FONTS_MISSING}");
        return;
    };
    assert!(bytes.starts_with(b"%PDF-"), "output should carry a PDF header");
    assert!(bytes.len() > 1024);
}

#[test]
fn rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_sample_pdf(), render_sample_pdf()) else {
        eprintln!("Skipping rendering_is_deterministic: {FONTS_MISSING}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn empty_time_in_range_still_renders_page() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping empty_time_in_range_still_renders_page: {FONTS_MISSING}");
        return;
    }
    let bytes = ReportBuilder::new(AgpStats::default())
        .render()
        .expect("render without statistics")
        .bytes;
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn rasterizer_failure_aborts_render() {
    struct Broken;

    impl ChartRasterizer for Broken {
        fn rasterize(&self, _spec: &ChartSpec) -> Result<RasterImage, ReportError> {
            Err(ReportError::Rasterization("renderer unavailable".into()))
        }
    }

    if !fonts::default_fonts_available() {
        eprintln!("Skipping rasterizer_failure_aborts_render: {FONTS_MISSING}");
        return;
    }
    let stats = AgpStats::from_json(SAMPLE_STATS).expect("sample stats");
    let result = ReportBuilder::new(stats).with_rasterizer(Broken).render();
    assert!(matches!(result, Err(ReportError::Render(_))));
}

#[test]
fn plotters_paints_segments_and_background() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping plotters_paints_segments_and_background: {FONTS_MISSING}");
        return;
    }
    let page = sample_builder().page();
    let spec = page.time_in_range_chart().expect("chart for positive total");
    let image = PlottersRasterizer::new()
        .rasterize(&spec)
        .expect("rasterize chart");

    assert_eq!(image.width(), spec.layout.width_px);
    assert_eq!(image.height(), spec.layout.height_px);
    assert_eq!(image.pixel(0, 0), Some(Rgb::new(0xFF, 0xFF, 0xFF)));

    // target spans 0.0675..0.7675 of the plot height, sampled at its middle
    let margin = spec.layout.margins.left;
    let plot_width = f64::from(spec.layout.width_px) - 2.0 * margin;
    let plot_height = f64::from(spec.layout.height_px) - 2.0 * margin;
    let x = (margin + plot_width * spec.layout.bar_width / 2.0) as u32;
    let y = (margin + plot_height * (1.0 - 0.4175)) as u32;
    assert_eq!(image.pixel(x, y), Some(spec.traces[2].color));
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarks_add_outline() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping bookmarks_add_outline: {FONTS_MISSING}");
        return;
    }
    let report = sample_builder()
        .render_with_bookmarks()
        .expect("render with bookmarks");
    let document = lopdf::Document::load_mem(&report.bytes).expect("reload pdf");
    let root = document
        .trailer
        .get(b"Root")
        .and_then(lopdf::Object::as_reference)
        .expect("catalog reference");
    let catalog = document
        .get_object(root)
        .and_then(lopdf::Object::as_dict)
        .expect("catalog dictionary");
    assert!(catalog.get(b"Outlines").is_ok());
}
