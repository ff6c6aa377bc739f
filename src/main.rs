use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use disk_hammer::{
    config::{DEFAULT_CHUNK_COUNT, DEFAULT_CHUNK_SIZE, DEFAULT_ITERATIONS, DEFAULT_LENGTH},
    size::parse_size,
    Config, Hammer, OpenMode, Seed,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_SIZE: u64 = DEFAULT_CHUNK_SIZE as u64;

/// Overwrite OUTFILE many times, as fast as possible, with direct I/O.
///
/// LENGTH and SIZE accept k/m/g/t/p suffixes for KiB/MiB/GiB/TiB/PiB.
/// Passing 0 for ITERS loops forever.
#[derive(Parser)]
#[command(name = "disk-hammer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to overwrite
    outfile: PathBuf,

    /// Bytes per file, rounded down to a whole number of chunks
    #[arg(value_parser = parse_size, default_value_t = DEFAULT_LENGTH)]
    length: u64,

    /// Number of write cycles, 0 for unbounded
    #[arg(default_value_t = DEFAULT_ITERATIONS)]
    iters: u64,

    /// Chunk size in bytes
    #[arg(short = 's', long = "size", value_parser = parse_size, default_value_t = DEFAULT_SIZE)]
    size: u64,

    /// Number of unique chunks
    #[arg(short = 'c', long = "count", default_value_t = DEFAULT_CHUNK_COUNT)]
    count: usize,

    /// Build the buffer but write nothing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// More output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print per-chunk cksum values
    #[arg(long)]
    checksums: bool,

    /// Fill seed, -1 seeds from the clock [default: build-time seed]
    #[arg(long, value_parser = parse_seed, allow_hyphen_values = true)]
    seed: Option<Seed>,

    /// Truncate the file on every open instead of overwriting in place
    #[arg(long)]
    truncate: bool,

    /// Use the page cache
    #[arg(long)]
    buffered: bool,

    /// Do not lock the buffer into memory
    #[arg(long)]
    no_mlock: bool,
}

fn parse_seed(s: &str) -> Result<Seed, String> {
    Seed::parse(s).ok_or_else(|| format!("invalid seed '{s}'"))
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = Config::new(self.outfile);
        config.chunk_size = usize::try_from(self.size).context("chunk size too large")?;
        config.chunk_count = self.count;
        config.length = self.length;
        config.iterations = self.iters;
        config.dry_run = self.dry_run;
        config.verbose = self.verbose > 0;
        config.checksums = self.checksums;
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.truncate {
            config.open_mode = OpenMode::Truncate;
        }
        config.direct = !self.buffered;
        config.lock_memory = !self.no_mlock;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    let config = cli.into_config()?;
    let path = config.path.clone();
    let hammer = Hammer::prepare(config)
        .with_context(|| format!("Failed to prepare {}", path.display()))?;
    print!("{}", hammer.startup_report());

    let summary = hammer
        .run(|report| println!("{report}"))
        .with_context(|| format!("Failed to hammer {}", path.display()))?;
    if summary.iterations > 1 {
        println!("{summary}");
    }
    Ok(())
}
