use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

use eclipse_pairs::config::{Config, ConfigError, MaxGap};
use eclipse_pairs::ephemeris::{
    AnalyticEphemeris, EclipseEvent, EclipseKind, Ephemeris, EphemerisError,
};
use eclipse_pairs::location::{default_sites, Location, LocationGrid};
use eclipse_pairs::report::{self, OutputFormat, PairReport, ReportError};
use eclipse_pairs::search::{self, MatchMode, VisibilityTester};
use eclipse_pairs::time::format_jd;
use eclipse_pairs::verify::Verifier;

#[derive(Parser)]
#[command(name = "eclipse-pairs")]
#[command(about = "Find pairs of eclipses seen from a common place within a few days")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// YAML file with run parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// First astronomical year (-3099 is 3100 BC)
    #[arg(long, global = true, allow_negative_numbers = true)]
    start_year: Option<i32>,
    /// Last astronomical year, inclusive
    #[arg(long, global = true, allow_negative_numbers = true)]
    end_year: Option<i32>,
    /// Largest gap between paired eclipses, in days or as a duration ("15days")
    #[arg(long, global = true)]
    max_gap: Option<String>,
    /// Grid spacing in degrees for both latitude and longitude
    #[arg(long, global = true)]
    grid_step: Option<f64>,
    /// Test only the named sites, not the grid
    #[arg(long, global = true)]
    sites_only: bool,
    /// Keep every shared location per pair instead of the first
    #[arg(long, global = true)]
    all_locations: bool,
    /// Directory with ephemeris data tables
    #[arg(long, global = true)]
    ephe_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every eclipse in the window
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the full pair search
    Search {
        /// Cross-check the first N pairs
        #[arg(long, default_value_t = 0)]
        verify: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Geometric cross-check of one pair at one location
    Verify {
        #[arg(long)]
        first_jd: f64,
        #[arg(long, value_enum)]
        first_kind: KindArg,
        #[arg(long)]
        second_jd: f64,
        #[arg(long, value_enum)]
        second_kind: KindArg,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Show where a single eclipse tests visible, best locations first
    Where {
        #[arg(long)]
        jd: f64,
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Number of locations to print
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Solar,
    Lunar,
}

impl From<KindArg> for EclipseKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Solar => EclipseKind::Solar,
            KindArg::Lunar => EclipseKind::Lunar,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("ephemeris: {0}")]
    Ephemeris(#[from] EphemerisError),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("{0}")]
    Lookup(String),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { format, output } => list(&cli.common, format, output.as_deref()),
        Commands::Search {
            verify,
            format,
            output,
        } => run_search(&cli.common, verify, format, output.as_deref()),
        Commands::Verify {
            first_jd,
            first_kind,
            second_jd,
            second_kind,
            lat,
            lon,
        } => verify_pair(
            &cli.common,
            (first_jd, first_kind.into()),
            (second_jd, second_kind.into()),
            lat,
            lon,
        ),
        Commands::Where { jd, kind, limit } => where_visible(&cli.common, jd, kind.into(), limit),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(args: &CommonArgs) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(year) = args.start_year {
        config.window.start_year = year;
    }
    if let Some(year) = args.end_year {
        config.window.end_year = year;
    }
    if let Some(gap) = &args.max_gap {
        config.max_gap = MaxGap::Text(gap.clone());
    }
    if let Some(step) = args.grid_step {
        let grid = config.locations.grid.get_or_insert_with(LocationGrid::default);
        grid.lat_step = step;
        grid.lon_step = step;
    }
    if args.sites_only {
        config.locations.grid = None;
        if config.locations.sites.is_empty() {
            config.locations.sites = default_sites();
        }
    }
    if args.all_locations {
        config.match_mode = MatchMode::All;
    }
    if let Some(path) = &args.ephe_path {
        config.ephemeris.data_path = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn open_provider(config: &Config) -> Result<AnalyticEphemeris, CliError> {
    let provider = AnalyticEphemeris::open(&config.ephemeris)?;
    let (min, max) = provider.supported_range();
    log::debug!("Ephemeris covers {} to {}", format_jd(min), format_jd(max));
    Ok(provider)
}

fn warn_abnormal_stops(enumeration: &search::Enumeration) {
    for scan in enumeration.reports() {
        if scan.stop.is_abnormal() {
            log::warn!(
                "{} scan ended early after {} eclipses: {}; continuing with a partial event set",
                scan.kind,
                scan.found,
                scan.stop
            );
        }
    }
}

fn list(args: &CommonArgs, format: OutputFormat, output: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(args)?;
    let provider = open_provider(&config)?;
    let window = config.search_window()?;

    let enumeration = search::enumerate(&provider, &window, config.max_iterations);
    warn_abnormal_stops(&enumeration);

    let content = match format {
        OutputFormat::Text => report::events_text(&enumeration),
        OutputFormat::Json => report::events_json(&enumeration)?,
    };
    report::write_output(output, &content)?;
    Ok(())
}

fn run_search(
    args: &CommonArgs,
    verify: usize,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let config = load_config(args)?;
    let provider = open_provider(&config)?;
    let window = config.search_window()?;
    let options = config.match_options()?;
    let locations = config.locations.resolve();

    log::info!(
        "Searching {} to {} for pairs within {} days ({} mode, {} locations)",
        format_jd(window.start),
        format_jd(window.end),
        options.max_gap_days,
        options.mode,
        locations.len()
    );

    let enumeration = search::enumerate(&provider, &window, config.max_iterations);
    warn_abnormal_stops(&enumeration);

    let pairs = search::match_pairs(&provider, &enumeration.events, &locations, &options);

    let verification = Verifier::new(config.thresholds).verify_pairs(&provider, &pairs, verify);

    let pair_report = PairReport::new(
        &window,
        options.max_gap_days,
        locations.len(),
        &enumeration,
        &pairs,
    )
    .with_verification(verification);

    let content = match format {
        OutputFormat::Text => pair_report.to_text(),
        OutputFormat::Json => pair_report.to_json()?,
    };
    report::write_output(output, &content)?;
    Ok(())
}

/// The provider's eclipse of `kind` whose greatest phase lies within a day of `jd`.
fn lookup_event(
    provider: &dyn Ephemeris,
    kind: EclipseKind,
    jd: f64,
) -> Result<EclipseEvent, CliError> {
    match provider.next_eclipse(kind, jd - 1.0)? {
        Some(event) if (event.instant - jd).abs() <= 1.0 => {
            if (event.instant - jd).abs() > 1.0 / 24.0 {
                log::info!(
                    "Using greatest {} eclipse at {} (JD {:.5})",
                    kind,
                    format_jd(event.instant),
                    event.instant
                );
            }
            Ok(event)
        }
        _ => Err(CliError::Lookup(format!(
            "no {} eclipse within a day of JD {:.5}",
            kind, jd
        ))),
    }
}

fn verify_pair(
    args: &CommonArgs,
    first: (f64, EclipseKind),
    second: (f64, EclipseKind),
    lat: f64,
    lon: f64,
) -> Result<(), CliError> {
    let config = load_config(args)?;
    let provider = open_provider(&config)?;
    let location = Location::from_coordinates(&format!("{},{}", lat, lon), None)
        .ok_or_else(|| CliError::Lookup(format!("invalid coordinates {}, {}", lat, lon)))?;

    let first = lookup_event(&provider, first.1, first.0)?;
    let second = lookup_event(&provider, second.1, second.0)?;
    let (first, second) = if first.instant <= second.instant {
        (first, second)
    } else {
        (second, first)
    };

    let tester = VisibilityTester::new(config.thresholds);
    let pair = search::EclipsePair {
        first,
        second,
        gap_days: second.instant - first.instant,
        location: location.clone(),
        first_visibility: tester.test(&provider, &first, &location).metric,
        second_visibility: tester.test(&provider, &second, &location).metric,
    };

    let check = Verifier::new(config.thresholds).verify_pair(&provider, &pair)?;
    report::write_output(None, &report::verification_text(&[check]))?;
    Ok(())
}

fn where_visible(
    args: &CommonArgs,
    jd: f64,
    kind: EclipseKind,
    limit: usize,
) -> Result<(), CliError> {
    let config = load_config(args)?;
    let provider = open_provider(&config)?;
    let event = lookup_event(&provider, kind, jd)?;
    let locations = config.locations.resolve();

    let tester = VisibilityTester::new(config.thresholds);
    let hits = tester.visible_locations(&provider, &event, &locations);

    println!(
        "{} {} eclipse at {} (magnitude {:.4})",
        event.class,
        event.kind,
        format_jd(event.instant),
        event.magnitude
    );
    println!(
        "Visible from {} of {} locations",
        hits.len(),
        locations.len()
    );
    for hit in hits.iter().take(limit) {
        println!("  {:<32} {}", hit.location.to_string(), hit.metric);
    }
    Ok(())
}
