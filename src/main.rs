//! `eshop-dash`: command-line front end for the warehouse dashboards.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use eshop_dashboard::loader::parse_timestamp;
use eshop_dashboard::visualization::{self, RenderConfig};
use eshop_dashboard::{
    run_batch, ChannelSelection, CutoffAnchor, LocationInput, PipelineConfig, ReportFilters,
    ReportSet,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAnchor {
    /// Cutoff times are taken on the day of `--now`
    ReferenceDay,
    /// Cutoff times are taken on each order's creation day
    OrderDay,
}

impl From<CliAnchor> for CutoffAnchor {
    fn from(cli: CliAnchor) -> Self {
        match cli {
            CliAnchor::ReferenceDay => CutoffAnchor::ReferenceDay,
            CliAnchor::OrderDay => CutoffAnchor::OrderDay,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Warehouse operations dashboards from CSV exports",
    long_about = "Builds per-location shipment pivots and multi-report dashboards.\n\n\
                  EXAMPLES:\n  \
                  # Pivot two locations into one workbook\n  \
                  eshop-dash pivot -l \"Hyd=hyd.csv\" -l \"Mumbai=mum.csv\" --xlsx out.xlsx\n\n  \
                  # Report dashboard for one week at one location\n  \
                  eshop-dash report -d reports/ --from 2025-03-01 --to 2025-03-07 --location Hyd"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Channel x status pivot per location, exported as one workbook
    Pivot {
        /// Location export as NAME=PATH; repeat for every location
        #[arg(short, long = "location", required = true)]
        locations: Vec<String>,

        /// Keep only these sales channels (default: every channel)
        #[arg(short, long = "channel")]
        channels: Vec<String>,

        /// Day the cutoff times are anchored on
        #[arg(long, value_enum)]
        anchor: Option<CliAnchor>,

        /// Reference time, e.g. "2025-03-14 12:30:00" (default: now)
        #[arg(long)]
        now: Option<String>,

        /// JSON pipeline settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Workbook output path (default: the configured workbook name)
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Also write an HTML page with the pivots and charts
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// KPIs and charts over a folder of report exports
    Report {
        /// Folder holding the report CSV files
        #[arg(short, long)]
        dir: PathBuf,

        /// First day of the date range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Last day of the date range, inclusive (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Location to show, or ALL
        #[arg(long)]
        location: Option<String>,

        /// HTML output path
        #[arg(long, default_value = "dashboard.html")]
        html: PathBuf,
    },
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Command::Pivot {
            locations,
            channels,
            anchor,
            now,
            config,
            xlsx,
            html,
        } => run_pivot(PivotArgs {
            locations,
            channels,
            anchor,
            now,
            config,
            xlsx,
            html,
        }),
        Command::Report {
            dir,
            from,
            to,
            location,
            html,
        } => run_report(&dir, from.zip(to), location, &html),
    }
}

struct PivotArgs {
    locations: Vec<String>,
    channels: Vec<String>,
    anchor: Option<CliAnchor>,
    now: Option<String>,
    config: Option<PathBuf>,
    xlsx: Option<PathBuf>,
    html: Option<PathBuf>,
}

fn run_pivot(args: PivotArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(anchor) = args.anchor {
        config.anchor = anchor.into();
    }
    let rule = config.cutoff_rule()?;

    let now: NaiveDateTime = match &args.now {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| anyhow!("invalid --now value: {raw}"))?,
        None => Local::now().naive_local(),
    };

    let selection = if args.channels.is_empty() {
        ChannelSelection::All
    } else {
        ChannelSelection::Only(args.channels.clone())
    };
    let inputs = args
        .locations
        .iter()
        .map(|arg| parse_location(arg).map(|input| input.with_channels(selection.clone())))
        .collect::<Result<Vec<_>>>()?;

    info!(locations = inputs.len(), %now, "running pivot batch");
    let mut report = run_batch(&inputs, &rule, now);

    for (name, reason) in report.failures() {
        warn!(location = name, "{reason}");
    }

    if let Some(path) = &args.html {
        let page = visualization::render_pivot_page(&report.outcomes, &RenderConfig::default())?;
        std::fs::write(path, page).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "pivot page written");
    }

    let Some(bytes) = report.workbook_bytes() else {
        bail!("No pivot tables were generated. Please check your uploaded files.");
    };
    let path = args
        .xlsx
        .unwrap_or_else(|| PathBuf::from(&config.workbook_name));
    std::fs::write(&path, bytes?).with_context(|| format!("writing {}", path.display()))?;
    info!(
        path = %path.display(),
        sheets = report.sheets_written(),
        "workbook written"
    );
    Ok(())
}

/// `NAME=PATH`, or a bare path named after its file stem.
fn parse_location(arg: &str) -> Result<LocationInput> {
    match arg.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok(LocationInput::from_path(name.trim(), path.trim()))
        }
        Some(_) => bail!("invalid --location '{arg}', expected NAME=PATH"),
        None => {
            let path = Path::new(arg);
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| anyhow!("invalid --location '{arg}'"))?;
            Ok(LocationInput::from_path(name, path))
        }
    }
}

fn run_report(
    dir: &Path,
    date_range: Option<(NaiveDate, NaiveDate)>,
    location: Option<String>,
    html: &Path,
) -> Result<()> {
    let reports =
        ReportSet::load_dir(dir).with_context(|| format!("reading folder {}", dir.display()))?;
    let filters = ReportFilters {
        date_range,
        location,
    };
    let dashboard = reports.dashboard(&filters)?;

    for warning in dashboard
        .warnings
        .iter()
        .chain(dashboard.sections.iter().flat_map(|s| s.warnings.iter()))
    {
        warn!("{warning}");
    }

    let page = visualization::render_dashboard(&dashboard, &RenderConfig::default())?;
    std::fs::write(html, page).with_context(|| format!("writing {}", html.display()))?;
    info!(
        path = %html.display(),
        sections = dashboard.sections.len(),
        "dashboard written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eshop_dashboard::locations::LocationSource;

    fn source_path(input: &LocationInput) -> &Path {
        match &input.source {
            LocationSource::Path(path) => path,
            LocationSource::Bytes(_) => panic!("expected a path source"),
        }
    }

    #[test]
    fn named_location_is_trimmed() {
        let input = parse_location(" Hyd = data/hyd.csv ").unwrap();
        assert_eq!(input.name, "Hyd");
        assert_eq!(source_path(&input), Path::new("data/hyd.csv"));
    }

    #[test]
    fn bare_path_is_named_after_its_stem() {
        let input = parse_location("data/hyd.csv").unwrap();
        assert_eq!(input.name, "hyd");
        assert_eq!(source_path(&input), Path::new("data/hyd.csv"));
    }

    #[test]
    fn only_the_first_equals_sign_splits() {
        let input = parse_location("Hyd=data/a=b.csv").unwrap();
        assert_eq!(input.name, "Hyd");
        assert_eq!(source_path(&input), Path::new("data/a=b.csv"));
    }

    #[test]
    fn empty_name_or_path_is_rejected() {
        for arg in ["=x.csv", "Hyd=", " = "] {
            let err = parse_location(arg).unwrap_err();
            assert!(err.to_string().contains("expected NAME=PATH"), "{arg}");
        }
    }
}
