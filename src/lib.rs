//! Renders the Ambulatory Glucose Profile (AGP) report page: a fixed grid of bordered
//! sections, patient and sensor usage rows, and a stacked time-in-range chart, drawn onto a
//! `genpdf` document.

pub mod builder;
pub mod canvas;
pub mod chart;
pub mod config;
pub mod container;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod info_row;
pub mod model;
pub mod page;
pub mod raster;
pub mod report_info;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use builder::{DocumentBuilder, RenderedReport, ReportBuilder};
pub use config::ReportConfig;
pub use error::ReportError;
pub use page::AgpPage;
