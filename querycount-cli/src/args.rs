use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use querycount::config::{Config, DEFAULT_LIMIT, DEFAULT_MAX_LINE_LENGTH};

/// Accepted values for `--limit`
pub const LIMIT_RANGE: RangeInclusive<i64> = 150..=950;

/// Count how many times each distinct line occurs in a large input file.
///
/// The report holds one `line<TAB>count` row per distinct line, in no particular order.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Maximum number of distinct lines held in memory at once (150 to 950)
    #[arg(short, long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
    pub limit: i64,

    /// File to analyse
    #[arg(short, long, default_value = "")]
    pub input: String,

    /// Report file to create
    #[arg(short, long, default_value = "")]
    pub output: String,

    /// Longest accepted input line, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,

    /// Directory in which intermediate parts are spilled [default: system temp dir]
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Rejects arguments the counting core must never see.
    pub fn validate(&self) -> Result<()> {
        if self.input.trim().is_empty() || self.output.trim().is_empty() {
            bail!("both --input and --output must be given");
        }
        if !LIMIT_RANGE.contains(&self.limit) {
            bail!(
                "--limit must be between {} and {}, got {}",
                LIMIT_RANGE.start(),
                LIMIT_RANGE.end(),
                self.limit
            );
        }
        if self.max_line_length == 0 {
            bail!("--max-line-length must be positive");
        }
        Ok(())
    }

    /// Core configuration derived from the arguments
    pub fn config(&self) -> Config {
        Config::new(self.limit).with_max_line_length(self.max_line_length)
    }

    /// Root directory for the spill directory
    pub fn spill_root(&self) -> PathBuf {
        self.tmp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
