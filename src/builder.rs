//! Document construction: a `genpdf::Document` preset for page-coordinate rendering, and the
//! [`ReportBuilder`] that renders an AGP page to PDF bytes.
//!
//! Documents never get a page decorator, so the page element's render area starts at the
//! top-left corner of the paper.

use std::fs;
use std::path::Path;

use genpdf::Size;
use log::info;

use crate::config::ReportConfig;
use crate::elements::{mm_from_pt, raster_from_path};
use crate::error::ReportError;
use crate::fonts;
use crate::geometry::PageGeometry;
use crate::model::{AgpStats, BoundsConfig, Patient};
use crate::page::AgpPage;
use crate::raster::{ChartRasterizer, RasterImage};

/// Builder for `genpdf::Document` instances loaded with the report fonts.
#[derive(Default)]
pub struct DocumentBuilder {
    paper_size: Option<Size>,
    title: Option<String>,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builds a configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, ReportError> {
        let font_family = fonts::default_font_family().map_err(ReportError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        if let Some(title) = self.title {
            document.set_title(title);
        }
        Ok(document)
    }
}

/// The bytes of a rendered report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
}

/// Collects the inputs of one AGP report and renders it.
pub struct ReportBuilder {
    config: ReportConfig,
    geometry: PageGeometry,
    stats: AgpStats,
    bounds: BoundsConfig,
    patient: Patient,
    logo: Option<RasterImage>,
    rasterizer: Option<Box<dyn ChartRasterizer>>,
    title: String,
}

impl ReportBuilder {
    /// Starts a US Letter report with the default configuration.
    pub fn new(stats: AgpStats) -> Self {
        Self {
            config: ReportConfig::default(),
            geometry: PageGeometry::letter(),
            stats,
            bounds: BoundsConfig::default(),
            patient: Patient::default(),
            logo: None,
            rasterizer: None,
            title: "AGP Report".to_owned(),
        }
    }

    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundsConfig) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.patient = patient;
        self
    }

    pub fn with_logo(mut self, logo: RasterImage) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Loads the footer logo from an image file.
    pub fn with_logo_file(self, path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let logo = raster_from_path(path)?;
        Ok(self.with_logo(logo))
    }

    /// Uses a custom chart rasterizer instead of the `plotters` one.
    pub fn with_rasterizer(mut self, rasterizer: impl ChartRasterizer + 'static) -> Self {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builds the page element without rendering it.
    pub fn page(self) -> AgpPage {
        let mut page = AgpPage::new(self.config, self.geometry, self.stats)
            .with_bounds(self.bounds)
            .with_patient(self.patient);
        if let Some(logo) = self.logo {
            page = page.with_logo(logo);
        }
        if let Some(rasterizer) = self.rasterizer {
            page = page.with_rasterizer(rasterizer);
        }
        page
    }

    fn paper_size(&self) -> Size {
        Size::new(
            mm_from_pt(self.geometry.width),
            mm_from_pt(self.geometry.height),
        )
    }

    /// Renders the report into PDF bytes.
    pub fn render(self) -> Result<RenderedReport, ReportError> {
        let document = DocumentBuilder::new()
            .with_paper_size(self.paper_size())
            .with_title(self.title.clone())
            .build()?;
        render_document(document, self.page())
    }

    /// Renders the report and writes it to `path`.
    pub fn render_to_file(self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let report = self.render()?;
        fs::write(path, &report.bytes)?;
        info!("Wrote {} bytes to {}", report.bytes.len(), path.display());
        Ok(())
    }

    /// Renders the report with one outline entry per titled section.
    #[cfg(feature = "bookmarks")]
    pub fn render_with_bookmarks(self) -> Result<RenderedReport, ReportError> {
        let geometry = self.geometry;
        let document = DocumentBuilder::new()
            .with_paper_size(self.paper_size())
            .with_title(self.title.clone())
            .build()?;
        let page = self.page();
        let targets = crate::bookmarks::section_targets(page.sections(), &geometry, 1);
        let report = render_document(document, page)?;
        let bytes = crate::bookmarks::apply_bookmarks(&report.bytes, &targets)?;
        Ok(RenderedReport { bytes })
    }
}

fn render_document(
    mut document: genpdf::Document,
    page: AgpPage,
) -> Result<RenderedReport, ReportError> {
    document.push(page);
    let mut bytes = Vec::new();
    document.render(&mut bytes).map_err(ReportError::Render)?;
    Ok(RenderedReport { bytes })
}
