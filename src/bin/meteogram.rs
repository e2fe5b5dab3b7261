use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use meteogram::models::{epoch_ms, parse_timestamp};
use meteogram::panel::build_panels;
use meteogram::{ChartGroup, Client, Modifiers, PanelKind, ViewerConfig, WeatherPayload};
use meteogram::{storage, viz};

const HOUR_MS: f64 = 3_600_000.0;
/// One wheel notch as most platforms report it.
const WHEEL_NOTCH: f64 = 120.0;

#[derive(Parser, Debug)]
#[command(
    name = "meteogram",
    version,
    about = "Render, fetch & export synchronized weather meteograms"
)]
struct Cli {
    /// Config file (default: <config dir>/meteogram/config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every panel, stacked and time-synchronized, to an SVG or PNG.
    Render(RenderArgs),
    /// Download the weather document and save it as JSON.
    Fetch(FetchArgs),
    /// Export every panel's series as CSV.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Read the weather document from a JSON file instead of the backend.
    #[arg(short, long, conflicts_with = "url")]
    input: Option<PathBuf>,
    /// Backend endpoint (overrides `source_url` from the config).
    #[arg(long)]
    url: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Output image (.svg, or a bitmap format such as .png).
    #[arg(short, long)]
    out: PathBuf,
    /// Image width in pixels.
    #[arg(long)]
    width: Option<u32>,
    /// Height of each panel in pixels.
    #[arg(long)]
    panel_height: Option<u32>,
    /// Hours shown ahead of the reference time; 0 shows all data.
    #[arg(long)]
    horizon: Option<u32>,
    /// Reference time for the view (RFC 3339 or YYYY-MM-DDTHH:MM, UTC); defaults to now.
    #[arg(long)]
    now: Option<String>,
    /// Pan the synchronized view by this many hours (negative goes back).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_hours: f64,
    /// Wheel notches to apply: positive zooms out, negative zooms in.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    zoom: i32,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Backend endpoint (overrides `source_url` from the config).
    #[arg(long)]
    url: Option<String>,
    /// Where to save the JSON document.
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// CSV output path.
    #[arg(short, long)]
    out: PathBuf,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cfg = ViewerConfig::load_or_default(cli.config.as_deref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(&cfg, args),
        Command::Fetch(args) => cmd_fetch(&cfg, args),
        Command::Export(args) => cmd_export(&cfg, args),
    }
}

fn fetch(url: &str) -> Result<WeatherPayload> {
    Client::new(url)?.fetch_payload()
}

fn load_source(cfg: &ViewerConfig, source: &SourceArgs) -> Result<WeatherPayload> {
    match (&source.input, &source.url) {
        (Some(path), _) => storage::load_payload_json(path),
        (None, Some(url)) => fetch(url),
        (None, None) => fetch(&cfg.source_url),
    }
}

fn parse_now(s: &str) -> Result<f64> {
    parse_timestamp(s)
        .map(epoch_ms)
        .with_context(|| format!("invalid --now `{s}`, expected RFC 3339 or YYYY-MM-DDTHH:MM"))
}

/// Drag the temperature panel across a unit-wide plot so the view moves by `hours`.
fn pan_by_hours(group: &mut ChartGroup, hours: f64) {
    let id = PanelKind::Temperature.id();
    let Some(window) = group.registry().resolved_window(id) else {
        log::warn!("nothing to pan: {id} has no time window");
        return;
    };
    let fraction = hours * HOUR_MS / window.span();
    if group.pointer_down(id, 0.0) {
        group.pointer_move(id, -fraction, 1.0);
        group.pointer_up(id);
    }
}

fn zoom_by_notches(group: &mut ChartGroup, notches: i32) {
    let id = PanelKind::Temperature.id();
    let delta = WHEEL_NOTCH * f64::from(notches.signum());
    for _ in 0..notches.unsigned_abs() {
        group.wheel(id, delta, Modifiers::ALL);
    }
}

fn cmd_render(cfg: &ViewerConfig, args: RenderArgs) -> Result<()> {
    let payload = load_source(cfg, &args.source)?;
    if payload.is_empty() {
        log::warn!("weather document has no data; panels will be empty");
    }
    let horizon = match args.horizon {
        Some(h) => (h > 0).then_some(h),
        None => cfg.horizon(),
    };
    let mut group = ChartGroup::new(cfg.zoom_modifier, horizon);
    for panel in build_panels(&payload) {
        group.add_panel(panel);
    }
    match args.now.as_deref() {
        Some(s) => group.reset(parse_now(s)?),
        None => group.reset_now(),
    };
    if args.pan_hours != 0.0 {
        pan_by_hours(&mut group, args.pan_hours);
    }
    zoom_by_notches(&mut group, args.zoom);

    let width = args.width.unwrap_or(cfg.panel_width);
    let panel_height = args.panel_height.unwrap_or(cfg.panel_height);
    viz::render_group_to_file(&group, &args.out, width, panel_height)
        .with_context(|| format!("render {}", args.out.display()))?;
    eprintln!("Wrote {} panels to {}", group.registry().len(), args.out.display());
    Ok(())
}

fn cmd_fetch(cfg: &ViewerConfig, args: FetchArgs) -> Result<()> {
    let url = args.url.as_deref().unwrap_or(&cfg.source_url);
    let payload = fetch(url)?;
    storage::save_payload_json(&payload, &args.out)?;
    eprintln!("Saved weather document to {}", args.out.display());
    Ok(())
}

fn cmd_export(cfg: &ViewerConfig, args: ExportArgs) -> Result<()> {
    let payload = load_source(cfg, &args.source)?;
    let panels = build_panels(&payload);
    let rows = storage::export_csv(&panels, &args.out)?;
    eprintln!("Saved {} rows to {}", rows, args.out.display());
    Ok(())
}
