use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

use agp_report::fonts::{self, FONTS_DIR_ENV, WINDOWS_FONTS_DIR_ENV};
use agp_report::model::AgpStats;
use agp_report::{ReportBuilder, ReportError};

static FONT_ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points both font directory variables at paths that do not exist.
struct FontEnvGuard {
    originals: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl FontEnvGuard {
    fn isolate() -> Self {
        let lock = FONT_ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("font isolation mutex poisoned");
        let originals = [FONTS_DIR_ENV, WINDOWS_FONTS_DIR_ENV]
            .into_iter()
            .map(|var| {
                let original = env::var_os(var);
                env::set_var(var, "/__agp_report_missing_fonts__");
                (var, original)
            })
            .collect();
        Self {
            originals,
            _lock: lock,
        }
    }
}

impl Drop for FontEnvGuard {
    fn drop(&mut self) {
        for (var, original) in self.originals.drain(..) {
            match original {
                Some(value) => env::set_var(var, value),
                None => env::remove_var(var),
            }
        }
    }
}

#[test]
fn missing_fonts_fail_with_font_load() {
    let _guard = FontEnvGuard::isolate();
    if fonts::default_fonts_available() {
        eprintln!("Skipping missing_fonts_fail_with_font_load: fonts found outside the override");
        return;
    }

    match ReportBuilder::new(AgpStats::default()).render() {
        Err(ReportError::FontLoad(err)) => {
            assert!(fonts::is_missing_fonts(&err), "unexpected font error: {err}");
            assert!(err.to_string().contains(FONTS_DIR_ENV));
        }
        Err(other) => panic!("expected a font load error, got {other}"),
        Ok(_) => panic!("render should fail without fonts"),
    }
}

#[test]
fn chart_font_registration_reports_missing_fonts() {
    let _guard = FontEnvGuard::isolate();
    if fonts::default_fonts_available() {
        eprintln!(
            "Skipping chart_font_registration_reports_missing_fonts: fonts found outside the override"
        );
        return;
    }
    assert!(matches!(
        fonts::register_chart_font(),
        Err(ReportError::Rasterization(_))
    ));
}
