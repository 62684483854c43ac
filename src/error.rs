//! Error types shared by the report renderer.

use std::fmt;

#[cfg(feature = "bookmarks")]
use crate::bookmarks::BookmarkError;

/// Errors produced while building or rendering an AGP report.
///
/// Missing statistics are not errors: the affected region is left empty. Layout overflow is
/// not detected either. Everything that does fail is propagated to the caller unchanged.
#[derive(Debug)]
pub enum ReportError {
    /// The default font family could not be loaded.
    FontLoad(genpdf::error::Error),
    /// `genpdf` failed while laying out or writing the document.
    Render(genpdf::error::Error),
    /// The chart rasterizer rejected the chart specification.
    Rasterization(String),
    /// An image could not be decoded or converted for embedding.
    Image(String),
    /// Input statistics or configuration could not be parsed.
    Input(serde_json::Error),
    /// Reading inputs or writing the rendered document failed.
    Io(std::io::Error),
    /// Outline entries could not be injected into the rendered bytes.
    #[cfg(feature = "bookmarks")]
    Bookmarks(BookmarkError),
}

impl ReportError {
    /// Wraps the error into a `genpdf` error so it can cross an [`genpdf::Element`] boundary.
    pub(crate) fn into_genpdf(self) -> genpdf::error::Error {
        match self {
            Self::FontLoad(err) | Self::Render(err) => err,
            other => genpdf::error::Error::new(
                other.to_string(),
                genpdf::error::ErrorKind::Internal,
            ),
        }
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Input(err)
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(feature = "bookmarks")]
impl From<BookmarkError> for ReportError {
    fn from(err: BookmarkError) -> Self {
        Self::Bookmarks(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(err) => write!(f, "Failed to load report fonts: {err}"),
            Self::Render(err) => write!(f, "Failed to render report: {err}"),
            Self::Rasterization(message) => write!(f, "Chart rasterization failed: {message}"),
            Self::Image(message) => write!(f, "Invalid report image: {message}"),
            Self::Input(err) => write!(f, "Failed to parse report input: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(err) => write!(f, "Failed to add bookmarks: {err}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            Self::Input(err) => Some(err),
            Self::Io(err) => Some(err),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(err) => Some(err),
            Self::Rasterization(_) | Self::Image(_) => None,
        }
    }
}
