use std::error::Error;

use agp_report::model::AgpStats;
use agp_report::ReportBuilder;

fn main() -> Result<(), Box<dyn Error>> {
    let stats = AgpStats::from_json(include_str!("sample_stats.json"))?;
    let report = ReportBuilder::new(stats).render_with_bookmarks()?;
    std::fs::write("agp_report_bookmarks.pdf", &report.bytes)?;
    println!(
        "Generated agp_report_bookmarks.pdf ({} bytes)",
        report.bytes.len()
    );
    Ok(())
}
