//! currency-dashboard CLI - live exchange rates with a logged trend history
//!
//! ## Example Usage
//!
//! ```bash
//! # One pass with the default selection
//! currency-dashboard show
//!
//! # Pick the base and targets
//! currency-dashboard show --base EUR --target USD --target GBP
//!
//! # Interactive loop (type `help` for commands)
//! currency-dashboard interactive
//!
//! # Logged observations for one pair
//! currency-dashboard history --base USD --target PKR
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use currency_dashboard::chart::{TrendSeries, TrendSummary};
use currency_dashboard::config::{DashboardConfig, API_KEY_ENV};
use currency_dashboard::currency::{CurrencyCode, RateSnapshot};
use currency_dashboard::error::Result as DashboardResult;
use currency_dashboard::history::HistoryReader;
use currency_dashboard::pipeline::{
    Dashboard, DashboardEvent, NoticeLevel, RenderOutput, SelectionRequest,
};
use currency_dashboard::sheet::{CsvSheetConnector, CsvWorksheet};
use currency_dashboard::sources::{ExchangeRateApiClient, InMemoryRateSource, RateSource};
use currency_dashboard::types::format_timestamp;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// currency-dashboard: live exchange rates with a logged trend history
#[derive(Parser)]
#[command(name = "currency-dashboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Robert Fall")]
#[command(about = "Live exchange rates with a logged trend history", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Observation log (CSV) to use instead of the configured one
    #[arg(long, global = true)]
    sheet: Option<PathBuf>,

    /// Use built-in sample rates instead of ExchangeRate-API
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pass: fetch, log and chart
    Show {
        /// Base currency (default: USD)
        #[arg(short = 'b', long)]
        base: Option<CurrencyCode>,

        /// Target currency, repeatable (default: preferred list)
        #[arg(short = 't', long = "target")]
        targets: Vec<CurrencyCode>,

        /// Do not save charts as SVG
        #[arg(long)]
        no_charts: bool,
    },

    /// Read commands from stdin and re-run on every change
    Interactive {
        /// Initial base currency
        #[arg(short = 'b', long)]
        base: Option<CurrencyCode>,

        /// Initial target currency, repeatable
        #[arg(short = 't', long = "target")]
        targets: Vec<CurrencyCode>,
    },

    /// List currencies supported by the rate source
    Currencies,

    /// Print logged observations for one pair
    History {
        #[arg(short = 'b', long, default_value = "USD")]
        base: CurrencyCode,

        #[arg(short = 't', long)]
        target: CurrencyCode,

        /// Only the last N observations
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print the series and summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Info,
}

/// Live or offline rate source, picked at startup
enum Source {
    Live(ExchangeRateApiClient),
    Offline(InMemoryRateSource),
}

impl Source {
    fn from_config(config: &DashboardConfig, offline: bool) -> anyhow::Result<Self> {
        if offline {
            return Ok(Source::Offline(InMemoryRateSource::sample()?));
        }
        let api_key = config.require_api_key()?.to_string();
        let client = ExchangeRateApiClient::with_config(
            api_key,
            config.api_base_url.clone(),
            config.request_timeout(),
        )?
        .with_universe_base(config.universe_base_code()?);
        Ok(Source::Live(client))
    }
}

impl RateSource for Source {
    async fn supported_currencies(&self) -> DashboardResult<BTreeSet<CurrencyCode>> {
        match self {
            Source::Live(client) => client.supported_currencies().await,
            Source::Offline(table) => table.supported_currencies().await,
        }
    }

    async fn latest_rates(&self, base: &CurrencyCode) -> DashboardResult<RateSnapshot> {
        match self {
            Source::Live(client) => client.latest_rates(base).await,
            Source::Offline(table) => table.latest_rates(base).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Source::Live(client) => client.name(),
            Source::Offline(table) => table.name(),
        }
    }
}

type CliDashboard = Dashboard<Source, CsvSheetConnector>;

/// A parsed line of interactive input
#[derive(Debug, PartialEq)]
enum Input {
    Event(DashboardEvent),
    Help,
    Quit,
}

fn parse_input(line: &str) -> anyhow::Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let code = |arg: Option<&str>| -> anyhow::Result<CurrencyCode> {
        match arg {
            Some(arg) => Ok(arg.parse()?),
            None => bail!("'{}' needs a currency code", command),
        }
    };

    let input = match command.to_ascii_lowercase().as_str() {
        "base" => Input::Event(DashboardEvent::SetBase(code(words.next())?)),
        "add" => Input::Event(DashboardEvent::AddTarget(code(words.next())?)),
        "remove" | "rm" => Input::Event(DashboardEvent::RemoveTarget(code(words.next())?)),
        "clear" => Input::Event(DashboardEvent::ClearTargets),
        "refresh" | "r" => Input::Event(DashboardEvent::Refresh),
        "reload" => Input::Event(DashboardEvent::InvalidateCaches),
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => bail!("Unknown command '{}'; type 'help'", other),
    };
    Ok(Some(input))
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn request_from(base: Option<CurrencyCode>, targets: Vec<CurrencyCode>) -> SelectionRequest {
    let targets = if targets.is_empty() {
        None
    } else {
        Some(targets)
    };
    SelectionRequest::new(base, targets)
}

fn build_dashboard(config: &DashboardConfig, offline: bool) -> anyhow::Result<CliDashboard> {
    let source = Source::from_config(config, offline)?;
    log::debug!("Using rate source '{}'", source.name());
    let connector = CsvSheetConnector::new(config.sheet_path.clone());
    Ok(Dashboard::from_config(source, connector, config)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match DashboardConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };
    if let Some(sheet) = &cli.sheet {
        config.sheet_path = sheet.clone();
    }

    if cli.verbose {
        println!(
            "{} v{}",
            "currency-dashboard".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!("Log: {}", config.sheet_path.display().to_string().dimmed());
    }

    let result = match cli.command {
        Commands::Show {
            base,
            targets,
            no_charts,
        } => run_show(&config, cli.offline, request_from(base, targets), no_charts).await,
        Commands::Interactive { base, targets } => {
            run_interactive(&config, cli.offline, request_from(base, targets)).await
        }
        Commands::Currencies => list_currencies(&config, cli.offline).await,
        Commands::History {
            base,
            target,
            limit,
            json,
        } => show_history(&config, &base, &target, limit, json),
        Commands::Info => show_info(&config, cli.offline),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

// Command implementations
async fn run_show(
    config: &DashboardConfig,
    offline: bool,
    request: SelectionRequest,
    no_charts: bool,
) -> anyhow::Result<()> {
    let mut dashboard = build_dashboard(config, offline)?;
    if no_charts {
        dashboard = dashboard.without_chart_dir();
    }

    let output = with_spinner("Fetching exchange rates...", dashboard.run(&request)).await?;
    print_output(&output);

    if output.has_errors() {
        bail!("pass stopped while {}", output.stopped_at);
    }
    Ok(())
}

async fn run_interactive(
    config: &DashboardConfig,
    offline: bool,
    request: SelectionRequest,
) -> anyhow::Result<()> {
    let mut dashboard = build_dashboard(config, offline)?.with_request(request.clone());

    println!("{}", "Currency Exchange Dashboard".cyan().bold());
    println!("Type {} for commands.", "help".bright_yellow());
    println!();

    let output = with_spinner("Fetching exchange rates...", dashboard.run(&request)).await?;
    print_output(&output);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Ok(None) => continue,
            Ok(Some(Input::Quit)) => break,
            Ok(Some(Input::Help)) => print_help(),
            Ok(Some(Input::Event(event))) => {
                let output = with_spinner("Updating...", dashboard.handle(event)).await?;
                print_output(&output);
            }
            Err(e) => eprintln!("{} {}", "Warning:".yellow(), e),
        }
    }
    Ok(())
}

async fn list_currencies(config: &DashboardConfig, offline: bool) -> anyhow::Result<()> {
    let mut dashboard = build_dashboard(config, offline)?;
    let universe = with_spinner("Fetching currencies...", dashboard.universe())
        .await?
        .context("Could not list currencies")?;

    println!("{}", "Supported Currencies".green().bold());
    println!("{}", "====================".green());
    let codes: Vec<&str> = universe.iter().map(CurrencyCode::as_str).collect();
    for row in codes.chunks(12) {
        println!("  {}", row.join(" "));
    }
    println!();
    println!("  {} {}", "Total:".bold(), universe.len());
    Ok(())
}

#[derive(Serialize)]
struct HistoryReport<'a> {
    series: &'a TrendSeries,
    summary: Option<TrendSummary>,
    skipped_rows: usize,
}

fn show_history(
    config: &DashboardConfig,
    base: &CurrencyCode,
    target: &CurrencyCode,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let Some(sheet) = CsvWorksheet::open_existing(&config.sheet_path) else {
        println!("No log yet at {}", config.sheet_path.display());
        return Ok(());
    };
    let history = HistoryReader::new().read_all(&sheet)?;
    let mut series = TrendSeries::from_records(&history.records, base, target);
    if let Some(n) = limit {
        let skip = series.len().saturating_sub(n);
        series.points.drain(..skip);
    }

    if json {
        let report = HistoryReport {
            summary: series.summary(),
            series: &series,
            skipped_rows: history.skipped_rows,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", series.title().green().bold());
    println!("{}", "=".repeat(series.title().len()).green());

    for point in &series.points {
        println!(
            "  {}  {:>14.4}",
            format_timestamp(&point.timestamp).dimmed(),
            point.rate
        );
    }
    if series.is_empty() {
        println!("  No data logged yet for {}/{}", base, target);
    }
    println!();

    if let Some(summary) = series.summary() {
        println!("  {} {}", "Observations:".bold(), summary.count);
        println!("  {} {:.4}", "First:".bold(), summary.first);
        println!("  {} {:.4}", "Last:".bold(), summary.last);
        println!("  {} {:.4} / {:.4}", "Min / Max:".bold(), summary.min, summary.max);
        println!("  {} {:.4}", "Mean:".bold(), summary.mean);
        if let Some(std_dev) = summary.std_dev {
            println!("  {} {:.4}", "Std dev:".bold(), std_dev);
        }
        println!("  {} {}", "Change:".bold(), format_change(summary.change_pct));
    }
    if history.skipped_rows > 0 {
        println!(
            "  {} {} malformed row(s) ignored",
            "Warning:".yellow(),
            history.skipped_rows
        );
    }
    Ok(())
}

fn show_info(config: &DashboardConfig, offline: bool) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "currency-dashboard".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();

    println!("{}", "Configuration".bold());
    println!("{}", "=============".dimmed());
    println!(
        "  {} {}",
        "Config file:".bold(),
        DashboardConfig::default_path().display()
    );
    println!(
        "  {} {}",
        "Rate source:".bold(),
        if offline {
            "built-in sample rates".to_string()
        } else {
            config.api_base_url.clone()
        }
    );
    println!(
        "  {} {}",
        "API key:".bold(),
        match config.require_api_key() {
            Ok(_) => "configured".green(),
            Err(_) => format!("missing (set {})", API_KEY_ENV).red(),
        }
    );
    println!("  {} {}", "Default base:".bold(), config.default_base);
    println!(
        "  {} {}",
        "Preferred targets:".bold(),
        config.preferred_targets.join(", ")
    );
    println!(
        "  {} {} (default {})",
        "Max targets:".bold(),
        config.max_targets,
        config.default_target_cap
    );
    println!("  {} {}", "Log:".bold(), config.sheet_path.display());
    println!("  {} {}", "Charts:".bold(), config.chart_dir.display());
    println!(
        "  {} {}",
        "Timezone:".bold(),
        config.timezone.as_deref().unwrap_or("local")
    );
    println!();
    Ok(())
}

fn print_help() {
    println!("{}", "Commands".bold());
    println!("  {}      set the base currency", "base XXX".bright_green());
    println!("  {}       add a target currency", "add XXX".bright_green());
    println!("  {}    remove a target currency", "remove XXX".bright_green());
    println!("  {}         clear all targets", "clear".bright_green());
    println!("  {}       fetch again", "refresh".bright_green());
    println!("  {}        reload currencies and reopen the log", "reload".bright_green());
    println!("  {}          exit", "quit".bright_green());
    println!();
}

fn print_output(output: &RenderOutput) {
    if let Some(selection) = &output.selection {
        println!(
            "{} {}",
            "Live Exchange Rates".green().bold(),
            format!("(base {})", selection.base).dimmed()
        );
        println!("{}", "===================".green());
    }
    for line in output.lines() {
        println!("  {}", line);
    }
    if !output.rates.is_empty() {
        println!();
    }

    for notice in &output.notices {
        let label = match notice.level {
            NoticeLevel::Info => "Info:".cyan().bold(),
            NoticeLevel::Warning => "Warning:".yellow().bold(),
            NoticeLevel::Error => "Error:".red().bold(),
        };
        println!("{} {}", label, notice);
    }

    if !output.charts.is_empty() {
        println!();
        println!("{}", "Trends".green().bold());
        println!("{}", "======".green());
    }
    for trend in &output.charts {
        let series = &trend.chart.series;
        let change = series
            .summary()
            .map(|s| format_change(s.change_pct))
            .unwrap_or_else(|| "no data".dimmed());
        print!("  {:<22} {:>4} pts  {}", series.title(), series.len(), change);
        match &trend.path {
            Some(path) => println!("  {}", path.display().to_string().dimmed()),
            None => println!(),
        }
    }
    println!();
}

fn format_change(change_pct: f64) -> colored::ColoredString {
    let text = format!("{:+.2}%", change_pct);
    if change_pct > 0.0 {
        text.green()
    } else if change_pct < 0.0 {
        text.red()
    } else {
        text.normal()
    }
}

/// Await `future` behind a spinner
async fn with_spinner<F: Future>(message: &'static str, future: F) -> anyhow::Result<F::Output> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;
    pb.finish_and_clear();
    Ok(output)
}
