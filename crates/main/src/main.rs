use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use agp_report::chart::{chart_rect, synthesize_time_in_range};
use agp_report::geometry::{PageGeometry, PageSections, SectionId};
use agp_report::model::{AgpStats, BoundsConfig, Patient};
use agp_report::{ReportBuilder, ReportConfig, ReportError};
use clap::{Args, Parser, Subcommand};
use log::info;

/// Renders AGP report pages from computed CGM statistics.
///
/// Fonts must be present under `assets/fonts` relative to the `agp_report` crate
/// or provided via the `AGP_REPORT_FONTS_DIR` environment variable.
#[derive(Parser)]
#[command(author, version, about = "Render AGP report pages")]
struct Cli {
    /// Log more detail (repeat for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the AGP page to a PDF file.
    Render(RenderArgs),

    /// Print the time-in-range chart description as JSON.
    #[command(name = "chart-spec", aliases = ["chart_spec"])]
    ChartSpec(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Statistics JSON (`timeInRange`, `sensorUsage`).
    #[arg(long)]
    stats: PathBuf,

    /// Glucose bounds JSON; consensus mg/dL targets when omitted.
    #[arg(long)]
    bounds: Option<PathBuf>,

    /// Layout and style overrides JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Patient JSON (`fullName` or `firstName`/`lastName`, `birthday`).
    #[arg(long)]
    patient: Option<PathBuf>,

    /// Image printed at the right end of the footer.
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Fixed offset applied to datum times, in minutes east of UTC.
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// Output file.
    #[arg(short, long, default_value = "agp_report.pdf")]
    output: PathBuf,

    /// Add an outline entry for every titled section.
    #[arg(long)]
    bookmarks: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ReportError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

struct Inputs {
    stats: AgpStats,
    bounds: BoundsConfig,
    config: ReportConfig,
}

fn load_inputs(args: &InputArgs) -> Result<Inputs, ReportError> {
    Ok(Inputs {
        stats: read_json(&args.stats)?,
        bounds: match &args.bounds {
            Some(path) => read_json(path)?,
            None => BoundsConfig::default(),
        },
        config: match &args.config {
            Some(path) => read_json(path)?,
            None => ReportConfig::default(),
        },
    })
}

fn render(args: RenderArgs) -> Result<(), ReportError> {
    let Inputs {
        stats,
        bounds,
        mut config,
    } = load_inputs(&args.input)?;
    if let Some(offset) = args.utc_offset {
        config.utc_offset_minutes = offset;
    }
    let patient: Patient = match &args.patient {
        Some(path) => read_json(path)?,
        None => Patient::default(),
    };

    let mut builder = ReportBuilder::new(stats)
        .with_config(config)
        .with_bounds(bounds)
        .with_patient(patient);
    if let Some(logo) = &args.logo {
        builder = builder.with_logo_file(logo)?;
    }

    if args.bookmarks {
        render_with_bookmarks(builder, &args.output)
    } else {
        builder.render_to_file(&args.output)
    }
}

#[cfg(feature = "bookmarks")]
fn render_with_bookmarks(builder: ReportBuilder, output: &Path) -> Result<(), ReportError> {
    let report = builder.render_with_bookmarks()?;
    fs::write(output, &report.bytes)?;
    info!("Wrote {} bytes to {}", report.bytes.len(), output.display());
    Ok(())
}

#[cfg(not(feature = "bookmarks"))]
fn render_with_bookmarks(builder: ReportBuilder, output: &Path) -> Result<(), ReportError> {
    log::warn!("Built without the `bookmarks` feature; writing the report without an outline");
    builder.render_to_file(output)
}

fn chart_spec(args: InputArgs) -> Result<(), ReportError> {
    let Inputs {
        stats,
        bounds,
        config,
    } = load_inputs(&args)?;
    let geometry = PageGeometry::letter();
    let sections = PageSections::new(&geometry, &config.layout, &config.text);
    let area = chart_rect(sections.get(SectionId::TimeInRanges), &config.layout);
    match synthesize_time_in_range(&stats.time_in_range.data, &bounds, area, &config) {
        Some(spec) => println!("{}", serde_json::to_string_pretty(&spec)?),
        None => {
            info!("Time in range total is not positive; no chart");
            println!("null");
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Render(args) => render(args),
        Commands::ChartSpec(args) => chart_spec(args),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(&err);
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
