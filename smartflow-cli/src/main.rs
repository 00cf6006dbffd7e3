//! SmartFlow CLI: replay candles through the engine and validate configs.
//!
//! Commands:
//! - `replay`: backfill each interval, stream the rest, print signals as JSON lines
//! - `check-config`: validate a TOML config and print its fingerprint and role mapping

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use smartflow_core::components::check_compatibility;
use smartflow_core::domain::{Candle, Interval, Signal};
use smartflow_core::synthetic::{generate_candles, FeedParams, SeedHierarchy};
use smartflow_core::{CandleOutcome, SmartFlowConfig, SymbolEngine};

#[derive(Parser)]
#[command(
    name = "smartflow",
    about = "SmartFlow CLI: smart-money candle to signal engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay historical or synthetic candles and emit signals as JSON lines.
    Replay {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Directory holding `{SYMBOL}_{interval}.csv` files.
        #[arg(long)]
        candles: Option<PathBuf>,

        /// Generate this many synthetic candles per interval instead of reading CSV.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Master seed for synthetic feeds.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Candles per interval used as history. Defaults to each interval's min_candles.
        #[arg(long)]
        warmup: Option<usize>,

        /// Write signals here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate a TOML config file.
    CheckConfig {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            config,
            candles,
            synthetic,
            seed,
            warmup,
            output,
        } => run_replay(&config, candles, synthetic, seed, warmup, output),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

// ─── Candle sources ──────────────────────────────────────────────────

/// One CSV row. `open_time` is RFC 3339.
#[derive(Debug, Deserialize)]
struct CandleRow {
    open_time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

enum Source {
    Csv(PathBuf),
    Synthetic { count: usize, seeds: SeedHierarchy },
}

impl Source {
    fn load(&self, symbol: &str, interval: Interval) -> Result<Vec<Candle>> {
        match self {
            Source::Csv(dir) => read_csv(&dir.join(format!("{symbol}_{interval}.csv")), symbol, interval),
            Source::Synthetic { count, seeds } => {
                let start = Utc
                    .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                    .single()
                    .context("invalid synthetic start time")?;
                Ok(generate_candles(seeds, symbol, interval, start, *count, FeedParams::default()))
            }
        }
    }
}

fn read_csv(path: &Path, symbol: &str, interval: Interval) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut candles = Vec::new();
    for (line, row) in reader.deserialize::<CandleRow>().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", path.display(), line + 2))?;
        candles.push(Candle {
            symbol: symbol.to_string(),
            interval,
            open_time: row.open_time,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            is_closed: true,
        });
    }
    candles.sort_by_key(|c| c.open_time);
    Ok(candles)
}

// ─── replay ──────────────────────────────────────────────────────────

/// Per-symbol replay totals.
#[derive(Debug, Default, Serialize)]
struct ReplaySummary {
    symbol: String,
    candles: usize,
    rejected: usize,
    outside_kill_zone: usize,
    discarded: usize,
    signals: usize,
}

fn run_replay(
    config_path: &Path,
    candles_dir: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    warmup: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let source = match (candles_dir, synthetic) {
        (Some(_), Some(_)) => bail!("--candles and --synthetic are mutually exclusive"),
        (None, None) => bail!("one of --candles or --synthetic is required"),
        (Some(dir), None) => Source::Csv(dir),
        (None, Some(count)) => Source::Synthetic {
            count,
            seeds: SeedHierarchy::new(seed),
        },
    };

    let config = Arc::new(SmartFlowConfig::load(config_path)?);
    info!(
        symbols = config.symbols.len(),
        fingerprint = %config.fingerprint()?,
        "config loaded"
    );

    // Symbols are independent; each gets its own engine on a rayon worker.
    let results: Vec<Result<(ReplaySummary, Vec<Signal>)>> = config
        .symbols
        .par_iter()
        .map(|symbol| replay_symbol(symbol, Arc::clone(&config), &source, warmup))
        .collect();

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut total = 0usize;
    for result in results {
        let (summary, signals) = result?;
        for signal in &signals {
            writeln!(out, "{}", serde_json::to_string(signal)?)?;
        }
        total += signals.len();
        info!(summary = %serde_json::to_string(&summary)?, "replay finished");
    }
    out.flush()?;
    info!(signals = total, "done");
    Ok(())
}

fn replay_symbol(
    symbol: &str,
    config: Arc<SmartFlowConfig>,
    source: &Source,
    warmup: Option<usize>,
) -> Result<(ReplaySummary, Vec<Signal>)> {
    let mut engine = SymbolEngine::new(symbol, Arc::clone(&config))?;
    let mut summary = ReplaySummary {
        symbol: symbol.to_string(),
        ..ReplaySummary::default()
    };

    let mut feeds = Vec::with_capacity(config.intervals.len());
    for ic in &config.intervals {
        let candles = source.load(symbol, ic.interval)?;
        feeds.push((ic.interval, warmup.unwrap_or_else(|| ic.min_candles()), candles));
    }

    // One cutoff for every interval, so no history candle closes after a live one.
    let cutoff = history_cutoff(&feeds);
    let mut live = Vec::new();
    for (interval, _, mut candles) in feeds {
        let split = cutoff.map_or(0, |cutoff| {
            candles.partition_point(|c| c.close_time() <= cutoff)
        });
        let rest = candles.split_off(split);
        if rest.is_empty() {
            warn!(symbol, %interval, "no candles left after warmup");
        }
        engine.initialize_with_history(interval, candles)?;
        live.extend(rest);
    }

    // Interleave intervals by close time; on ties the shorter interval first.
    live.sort_by_key(|c| (c.close_time(), c.interval));

    let mut signals = Vec::new();
    for candle in live {
        summary.candles += 1;
        let interval = candle.interval;
        match engine.on_closed_candle(interval, candle)? {
            CandleOutcome::Emitted(signal) => signals.push(signal),
            CandleOutcome::Rejected(_) => summary.rejected += 1,
            CandleOutcome::OutsideKillZone => summary.outside_kill_zone += 1,
            CandleOutcome::SignalDiscarded(_) => summary.discarded += 1,
            _ => {}
        }
    }
    summary.signals = signals.len();
    Ok((summary, signals))
}

/// Latest close time among each interval's warmup candle. Intervals with
/// fewer candles than their warmup contribute their last candle.
fn history_cutoff(feeds: &[(Interval, usize, Vec<Candle>)]) -> Option<DateTime<Utc>> {
    feeds
        .iter()
        .filter_map(|(_, warmup, candles)| {
            let last = (*warmup).min(candles.len()).checked_sub(1)?;
            Some(candles[last].close_time())
        })
        .max()
}

// ─── check-config ────────────────────────────────────────────────────

fn run_check_config(config_path: &Path) -> Result<()> {
    let config = SmartFlowConfig::load(config_path)?;
    let Some(symbol) = config.symbols.first() else {
        bail!("config has no symbols");
    };
    let engine = SymbolEngine::new(symbol.clone(), Arc::new(config.clone()))?;
    let (trend, zones, entry) = engine.role_intervals();

    println!("Config OK: {}", config_path.display());
    println!("  Fingerprint: {}", config.fingerprint()?);
    println!("  Strategy:    {}", engine.strategy_tag());
    println!("  Symbols:     {}", config.symbols.join(", "));
    println!("  Trend:       {trend}");
    println!("  Zones:       {zones}");
    println!("  Entry:       {entry}");
    for ic in &config.intervals {
        println!(
            "  {:<4} {}  buffer={} min_candles={}",
            ic.interval.as_str(),
            ic.role,
            ic.buffer_capacity,
            ic.min_candles()
        );
    }
    if config.kill_zones.is_empty() {
        println!("  Kill zones:  none (always open)");
    }
    for kz in &config.kill_zones {
        println!(
            "  Kill zone:   {}-{} {}",
            kz.start,
            kz.end,
            kz.label.as_deref().unwrap_or("")
        );
    }
    for warning in check_compatibility(&config.components).warnings {
        println!("  Warning: {warning}");
    }
    Ok(())
}
