//! Font discovery for the report: the `genpdf` family used for page text and the
//! `plotters` font registration used when rasterizing charts.
//!
//! Both read the same files. The bundled Roboto family is searched for in
//! `AGP_REPORT_FONTS_DIR`, next to the executable and in the crate's `assets/fonts`; when it
//! cannot be found, the Windows Arial family is used instead.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

use crate::error::ReportError;

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable overriding the bundled font directory.
pub const FONTS_DIR_ENV: &str = "AGP_REPORT_FONTS_DIR";

/// Environment variable overriding the Windows fallback font directory.
pub const WINDOWS_FONTS_DIR_ENV: &str = "AGP_REPORT_WINDOWS_FONTS_DIR";

/// Family name the chart font is registered under with `plotters`.
pub const CHART_FONT_FAMILY: &str = "sans-serif";

const FONT_FILES: [&str; 4] = [
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// Arial files in regular, bold, italic, bold italic order.
const WINDOWS_FONT_FILES: [&str; 4] = ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"];

const WINDOWS_FALLBACK_FAMILY_NAME: &str = "Arial";

/// Where the report fonts were found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    Bundled(PathBuf),
    Windows(PathBuf),
}

impl FontSource {
    /// The file used for regular-weight text.
    pub fn regular_file(&self) -> PathBuf {
        match self {
            FontSource::Bundled(dir) => dir.join(FONT_FILES[0]),
            FontSource::Windows(dir) => dir.join(WINDOWS_FONT_FILES[0]),
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push(path);
    }
    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        push(bin_dir.join("assets/fonts"));
    }
    push(bundled_fonts_source_dir());

    candidates
}

/// The `assets/fonts` directory of the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn missing_font_files(dir: &Path, files: &[&str]) -> Vec<String> {
    files
        .iter()
        .filter(|name| !dir.join(name).is_file())
        .map(|name| (*name).to_owned())
        .collect()
}

fn not_found(message: String) -> Error {
    Error::new(
        message,
        io::Error::new(io::ErrorKind::NotFound, "report fonts not found"),
    )
}

fn resolve_bundled_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();
    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }
        let missing = missing_font_files(&candidate, &FONT_FILES);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }
    Err(not_found(format!(
        "Unable to locate the {} fonts. Checked: {}. See assets/fonts/README.md or set {}.",
        DEFAULT_FONT_FAMILY_NAME,
        attempts.join(", "),
        FONTS_DIR_ENV
    )))
}

fn windows_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(path);
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(candidate) = env_path(var).map(|root| root.join("Fonts")) {
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

/// Returns whether the error means the fonts are absent rather than unreadable.
pub fn is_missing_fonts(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Finds the report fonts, preferring the bundled family over the Windows fallback.
pub fn resolve_font_source() -> Result<FontSource, Error> {
    match resolve_bundled_directory() {
        Ok(dir) => Ok(FontSource::Bundled(dir)),
        Err(err) => match windows_font_directory() {
            Some(dir) if missing_font_files(&dir, &WINDOWS_FONT_FILES).is_empty() => {
                warn!(
                    "Bundled fonts unavailable ({}); falling back to Windows '{}' family.",
                    err, WINDOWS_FALLBACK_FAMILY_NAME
                );
                Ok(FontSource::Windows(dir))
            }
            Some(dir) => {
                warn!(
                    "Bundled fonts unavailable ({}); Windows fallback at {} is incomplete",
                    err,
                    dir.display()
                );
                Err(err)
            }
            None => Err(err),
        },
    }
}

fn load_font(path: &Path) -> Result<FontData, Error> {
    FontData::load(path, None).map_err(|err| {
        let kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!("Failed to load font {}: {}", path.display(), err),
            io::Error::new(kind, err.to_string()),
        )
    })
}

fn load_family(dir: &Path, files: &[&str; 4]) -> Result<FontFamily<FontData>, Error> {
    let [regular, bold, italic, bold_italic] = files;
    Ok(FontFamily {
        regular: load_font(&dir.join(regular))?,
        bold: load_font(&dir.join(bold))?,
        italic: load_font(&dir.join(italic))?,
        bold_italic: load_font(&dir.join(bold_italic))?,
    })
}

/// Loads the font family used for page text.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match resolve_font_source()? {
        FontSource::Bundled(dir) => {
            fonts::from_files(&dir, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
                Error::new(
                    format!(
                        "Failed to load font family '{}' from {}: {}",
                        DEFAULT_FONT_FAMILY_NAME,
                        dir.display(),
                        err
                    ),
                    io::Error::new(io::ErrorKind::Other, err.to_string()),
                )
            })
        }
        FontSource::Windows(dir) => load_family(&dir, &WINDOWS_FONT_FILES),
    }
}

/// Indicates whether the report fonts can be found on this machine.
pub fn default_fonts_available() -> bool {
    resolve_font_source().is_ok()
}

static CHART_FONT: OnceLock<Result<(), String>> = OnceLock::new();

fn register_chart_font_from(path: &Path) -> Result<(), String> {
    let bytes = fs::read(path).map_err(|err| format!("{}: {}", path.display(), err))?;
    // plotters keeps registered fonts for the life of the process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font(
        CHART_FONT_FAMILY,
        plotters::style::FontStyle::Normal,
        bytes,
    )
    .map_err(|_| format!("{} is not a usable font", path.display()))?;
    debug!("Registered chart font {}", path.display());
    Ok(())
}

/// Registers the regular report font with `plotters` as the chart text font.
///
/// Runs once per process; later calls return the first outcome.
pub fn register_chart_font() -> Result<(), ReportError> {
    CHART_FONT
        .get_or_init(|| {
            let source = resolve_font_source().map_err(|err| err.to_string())?;
            register_chart_font_from(&source.regular_file())
        })
        .clone()
        .map_err(|message| ReportError::Rasterization(format!("chart font unavailable: {message}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_file_matches_source_family() {
        let bundled = FontSource::Bundled(PathBuf::from("fonts"));
        assert_eq!(bundled.regular_file(), PathBuf::from("fonts/Roboto-Regular.ttf"));
        let windows = FontSource::Windows(PathBuf::from("C:/Windows/Fonts"));
        assert_eq!(
            windows.regular_file(),
            PathBuf::from("C:/Windows/Fonts/arial.ttf")
        );
    }

    #[test]
    fn missing_files_are_listed_by_name() {
        let dir = env::temp_dir().join("agp_report_missing_fonts");
        let missing = missing_font_files(&dir, &FONT_FILES);
        assert_eq!(missing.len(), FONT_FILES.len());
        assert_eq!(missing[0], "Roboto-Regular.ttf");
    }

    #[test]
    fn not_found_errors_count_as_missing_fonts() {
        assert!(is_missing_fonts(&not_found("gone".into())));
        let other = Error::new(
            "broken",
            io::Error::new(io::ErrorKind::InvalidData, "corrupt"),
        );
        assert!(!is_missing_fonts(&other));
    }
}
