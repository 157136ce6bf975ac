use std::env;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use geomag_imfv283::{
    DecoderConfig, Imfv283Decoder, StationTable, DEFAULT_MAX_DATA_AGE_MINUTES,
    DEFAULT_MAX_TRANSMIT_DELAY_MINUTES,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const STATIONS_ENV: &str = "IMFV283_STATIONS";

#[derive(Parser, Debug)]
#[command(author, version, about = "IMFV283 GOES message decoder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a receiver dump into JSON records, one per line
    Decode(DecodeArgs),
    /// Print the station table as JSON
    Stations(StationsArgs),
}

#[derive(Args, Debug)]
struct StationSource {
    /// Station table TOML (defaults to $IMFV283_STATIONS, then the embedded table)
    #[arg(long)]
    stations: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Receiver dump with one message per line
    file: PathBuf,
    #[command(flatten)]
    source: StationSource,
    /// Largest plausible delay between first sample and transmission
    #[arg(long, default_value_t = DEFAULT_MAX_TRANSMIT_DELAY_MINUTES)]
    max_transmit_delay_minutes: i64,
    /// Reject records whose first sample is older than this at transmission
    #[arg(long, default_value_t = DEFAULT_MAX_DATA_AGE_MINUTES, conflicts_with = "no_age_limit")]
    max_data_age_minutes: i64,
    /// Accept records regardless of their age
    #[arg(long)]
    no_age_limit: bool,
}

#[derive(Args, Debug)]
struct StationsArgs {
    #[command(flatten)]
    source: StationSource,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Decode(args) => handle_decode(args),
        Command::Stations(args) => handle_stations(args),
    }
}

fn handle_decode(args: DecodeArgs) -> Result<()> {
    if args.max_transmit_delay_minutes <= 0 {
        bail!("--max-transmit-delay-minutes must be positive");
    }
    let config = DecoderConfig {
        max_transmit_delay: Duration::minutes(args.max_transmit_delay_minutes),
        max_data_age: (!args.no_age_limit).then(|| Duration::minutes(args.max_data_age_minutes)),
    };

    let table = load_stations(&args.source)?;
    let feed = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let report = Imfv283Decoder::new(&table, config).decode_feed(&feed);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in &report.records {
        serde_json::to_writer(&mut out, record).context("failed to encode record")?;
        writeln!(out).context("failed to write record")?;
    }
    out.flush().context("failed to flush output")?;

    info!(
        file = %args.file.display(),
        decoded = report.records.len(),
        rejected = report.rejected.len(),
        corrected = report.corrected_count(),
        "Decoded receiver dump"
    );

    Ok(())
}

fn handle_stations(args: StationsArgs) -> Result<()> {
    let table = load_stations(&args.source)?;
    let json = serde_json::to_string_pretty(table.profiles())
        .context("failed to encode station table")?;
    println!("{json}");
    Ok(())
}

fn load_stations(source: &StationSource) -> Result<StationTable> {
    let path = source
        .stations
        .clone()
        .or_else(|| env::var_os(STATIONS_ENV).map(PathBuf::from));

    match path {
        Some(path) => read_table(&path),
        None => {
            info!("Using embedded station table");
            Ok(StationTable::builtin().clone())
        }
    }
}

fn read_table(path: &Path) -> Result<StationTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read station table {}", path.display()))?;
    let table = StationTable::from_toml_str(&content)
        .with_context(|| format!("invalid station table {}", path.display()))?;
    info!(path = %path.display(), stations = table.len(), "Loaded station table");
    Ok(table)
}
