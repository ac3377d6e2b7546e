//! count-queries
//! ---
//! Counts the occurrences of every distinct line of `--input` and writes them to
//! `--output` as `line<TAB>count` rows, holding at most `--limit` distinct lines in
//! memory at a time.  Intermediate parts are spilled into a private directory under
//! `--tmp-dir`, which is removed before the process exits.
//!
//! ```text
//! count-queries --limit 500 --input queries.log --output report.tsv
//! ```

#[macro_use]
extern crate log;

mod args;

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use querycount::partition::partition;
use querycount::reduce::reduce;
use querycount::storage::disk::DiskStore;
use querycount::storage::{openers, PartStore};

use args::Args;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn count_queries(args: &Args) -> Result<()> {
    let config = args.config();
    let input = File::open(&args.input)
        .with_context(|| format!("Unable to open input {}", args.input))?;

    let store = DiskStore::new(args.spill_root())?;
    info!("Spilling parts into {}", store.path().display());

    // 1. Split the input into parts of at most `limit` distinct lines
    let parts = partition(BufReader::new(input), &config, |part, n| {
        debug!("Saving part {} with {} distinct lines", n, part.len());
        store.save(part, n)
    })
    .with_context(|| format!("Unable to split {} into parts", args.input))?;
    info!("Split {} into {} parts", args.input, parts);

    // 2. Fold the parts into the report
    let output = File::create(&args.output)
        .with_context(|| format!("Unable to create output {}", args.output))?;
    reduce(&openers(&store, parts), output)
        .with_context(|| format!("Unable to write report {}", args.output))?;
    info!("Wrote report to {}", args.output);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    args.validate()?;
    count_queries(&args)
}
