//! The report info block: patient name and birthdate, CGM days worn with the covered dates,
//! and the share of time the sensor was active.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use log::debug;

use crate::canvas::DrawingContext;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::geometry::Section;
use crate::info_row::{render_info_row, InfoRow};
use crate::model::{Patient, SensorUsageRaw, TimedDatum};

const ELLIPSIS: &str = "...";

/// Shortens `name` to at most `max_chars` characters, the trailing `...` included.
pub fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_owned();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = name.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Formats a birthdate as `Jan 2, 1990`; no birthdate yields an empty string.
pub fn format_birthdate(birthday: Option<NaiveDate>) -> String {
    birthday
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// `1 Day` for exactly one day, `N Days` for anything else.
pub fn days_worn_label(days: u32) -> String {
    if days == 1 {
        "1 Day".to_owned()
    } else {
        format!("{days} Days")
    }
}

fn local_date(datum: Option<TimedDatum>, offset: FixedOffset) -> Option<NaiveDate> {
    let datum = datum?;
    let utc = DateTime::from_timestamp_millis(datum.time)?;
    Some(utc.with_timezone(&offset).date_naive())
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Formats the covered period: `March 1 - March 14, 2024`, with the year repeated on both
/// sides when the period crosses a year boundary.
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() {
        format!(
            "{} - {}",
            start.format("%B %-d"),
            end.format("%B %-d, %Y")
        )
    } else {
        format!("{} - {}", long_date(start), long_date(end))
    }
}

/// The days-worn row text, e.g. `14 Days: March 1 - March 14, 2024`.
///
/// Datum times are shifted by the fixed `utc_offset_minutes` before taking their date. When
/// the datum a period needs is missing, only the day count is printed.
pub fn days_worn_text(usage: &SensorUsageRaw, utc_offset_minutes: i32) -> String {
    let days = usage.cgm_days_worn;
    let mut text = days_worn_label(days);
    if days < 1 {
        return text;
    }
    let Some(offset) = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)) else {
        debug!("UTC offset of {utc_offset_minutes} minutes is out of range");
        return text;
    };
    let newest = local_date(usage.newest_datum, offset);
    let period = if days == 1 {
        newest.map(long_date)
    } else {
        match (local_date(usage.oldest_datum, offset), newest) {
            (Some(oldest), Some(newest)) => Some(format_date_range(oldest, newest)),
            (None, Some(newest)) => Some(long_date(newest)),
            _ => None,
        }
    };
    match period {
        Some(period) => {
            text.push_str(": ");
            text.push_str(&period);
        }
        None => debug!("Sensor usage has {days} days but no datum times"),
    }
    text
}

/// The sensor activity row text, e.g. `Time CGM Active: 92.3%`; unknown activity prints `--`.
pub fn cgm_active_text(label: &str, sensor_usage: Option<f64>) -> String {
    match sensor_usage.filter(|value| value.is_finite()) {
        Some(value) => format!("{label}: {value:.1}%"),
        None => format!("{label}: --"),
    }
}

/// Draws the three report info rows into `section`.
pub fn render_report_info(
    ctx: &mut DrawingContext<'_>,
    section: &Section,
    patient: &Patient,
    usage: &SensorUsageRaw,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let layout = &config.layout;
    let name = truncate_name(&patient.display_name(), layout.patient_name_max_chars);
    let birthdate = format_birthdate(patient.birthday);
    let days_worn = days_worn_text(usage, config.utc_offset_minutes);
    let cgm_active = cgm_active_text(&config.text.cgm_active_label, usage.sensor_usage_agp);

    ctx.move_to(
        section.x(),
        section.y() + layout.units(layout.report_info_padding_top_units),
    );
    let patient_row = if birthdate.is_empty() {
        InfoRow::new(&name)
    } else {
        InfoRow::new(&name).with_secondary(Some(config.text.dob_label.as_str()), &birthdate)
    };
    render_info_row(ctx, section, &patient_row, config)?;
    ctx.move_down(1.0);
    render_info_row(ctx, section, &InfoRow::new(&days_worn), config)?;
    ctx.move_down(1.0);
    render_info_row(ctx, section, &InfoRow::new(&cgm_active), config)?;
    Ok(())
}
