//! Inspect how a set of input files is split between workers.
//!
//! # Usage
//!
//! Print the realigned range of every rank:
//!
//! ```sh
//! cargo run --release --bin strata-inspect -- --uri "/data/logs;/data/extra.txt" --workers 8
//! ```
//!
//! ```txt
//! rank=0 begin=0 end=134217811 files=/data/logs/0000.txt
//! rank=1 begin=134217811 end=268435507 files=/data/logs/0000.txt,/data/logs/0001.txt
//! ...
//! ```
//!
//! Write the bytes owned by rank 3 to stdout:
//!
//! ```sh
//! cargo run --release --bin strata-inspect -- --uri /data/logs --workers 8 --rank 3 --dump
//! ```

use clap::{value_parser, Arg, ArgAction, Command};
use std::{
    io::{self, Write},
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    process,
};
use strata_split::{
    fs::local,
    record::{Fixed, Line, Splitter},
    Config, Error, Split,
};
use tracing::{error, info};

/// Record format of the input.
#[derive(Clone, Copy, Debug)]
enum Format {
    Line,
    Fixed(NonZeroU64),
}

impl Format {
    /// Size every input file must be a multiple of.
    fn record_size(&self) -> NonZeroU64 {
        match self {
            Format::Line => NonZeroU64::MIN,
            Format::Fixed(size) => *size,
        }
    }
}

fn parse_format(value: &str) -> Result<Format, String> {
    if value == "line" {
        return Ok(Format::Line);
    }
    let size = value
        .strip_prefix("fixed:")
        .ok_or_else(|| format!("unknown format: {value}"))?;
    let size = size
        .parse::<NonZeroU64>()
        .map_err(|e| format!("invalid record size {size}: {e}"))?;
    Ok(Format::Fixed(size))
}

/// Print one line per rank describing its range.
fn describe<S: Splitter + Clone>(
    fs: &local::FileSystem,
    splitter: S,
    cfg: &Config,
) -> Result<(), Error> {
    let mut out = io::stdout().lock();
    for rank in 0..cfg.workers.get() {
        let mut cfg = cfg.clone();
        cfg.rank = rank;
        let split = Split::init(fs, splitter.clone(), cfg)?;
        let range = split.range();
        let files: Vec<_> = split.files().iter().map(|f| f.path.as_str()).collect();
        writeln!(
            out,
            "rank={} begin={} end={} files={}",
            rank,
            range.begin,
            range.end,
            files.join(",")
        )?;
    }
    Ok(())
}

/// Write every chunk of `cfg.rank` to stdout.
fn dump<S: Splitter>(fs: &local::FileSystem, splitter: S, cfg: Config) -> Result<(), Error> {
    let rank = cfg.rank;
    let mut split = Split::init(fs, splitter, cfg)?;
    let mut out = io::stdout().lock();
    let (mut chunks, mut bytes) = (0u64, 0u64);
    while let Some(chunk) = split.next_chunk()? {
        out.write_all(chunk)?;
        chunks += 1;
        bytes += chunk.len() as u64;
    }
    out.flush()?;
    info!(rank, chunks, bytes, "dumped split");
    Ok(())
}

fn main() {
    // Parse arguments
    let matches = Command::new("strata-inspect")
        .about("print the record-aligned range assigned to each worker")
        .arg(
            Arg::new("uri")
                .long("uri")
                .required(true)
                .help("';'-separated list of files and directories"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .required(true)
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("align")
                .long("align")
                .required(false)
                .value_parser(value_parser!(u64).range(1..))
                .help("required file size multiple (defaults to the record size)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .required(false)
                .default_value("line")
                .value_parser(parse_format)
                .help("'line' or 'fixed:<record size>'"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .required(false)
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("rank")
                .long("rank")
                .required(false)
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .action(ArgAction::SetTrue)
                .requires("rank"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag("verbose") {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    // Build configuration
    let uri = matches.get_one::<String>("uri").expect("uri is required");
    let workers = *matches.get_one::<u32>("workers").expect("workers is required");
    let mut cfg = Config::new(
        uri.clone(),
        0,
        NonZeroU32::new(workers).expect("workers must be positive"),
    );
    let format = *matches.get_one::<Format>("format").expect("format has a default");
    cfg.align_bytes = match matches.get_one::<u64>("align") {
        Some(align) => NonZeroU64::new(*align).expect("align must be positive"),
        None => format.record_size(),
    };
    if let Some(size) = matches.get_one::<u64>("chunk-size") {
        let size = usize::try_from(*size).expect("chunk size too large");
        cfg.chunk_size = NonZeroUsize::new(size).expect("chunk size must be positive");
    }
    if let Some(rank) = matches.get_one::<u32>("rank") {
        cfg.rank = *rank;
    }

    // Run
    let fs = local::FileSystem;
    let result = match (matches.get_flag("dump"), format) {
        (true, Format::Line) => dump(&fs, Line, cfg),
        (true, Format::Fixed(size)) => dump(&fs, Fixed::new(size), cfg),
        (false, Format::Line) => describe(&fs, Line, &cfg),
        (false, Format::Fixed(size)) => describe(&fs, Fixed::new(size), &cfg),
    };
    if let Err(err) = result {
        error!(?err, "failed to inspect input");
        process::exit(1);
    }
}
