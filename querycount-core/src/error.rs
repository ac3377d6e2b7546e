use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::PartNumber;

/// Everything that can abort a partition or reduce run.
///
/// No variant is retried internally; the caller is expected to stop the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// The input stream failed for a reason other than a clean end of input
    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),

    /// An input line was longer than the configured cap
    #[error("input line {line} is longer than {limit} bytes")]
    LineTooLong {
        /// 1-based line number
        line: u64,
        /// Cap that was exceeded
        limit: usize,
    },

    /// A part handle could not be acquired, read, written, cleared or released
    #[error("storage failure on part {part}: {source}")]
    Storage {
        /// 1-based part position
        part: PartNumber,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// A part's bytes could not be encoded or decoded
    #[error("part {part} is corrupt: {source}")]
    Corrupt {
        /// 1-based part position
        part: PartNumber,
        /// Underlying codec failure
        #[source]
        source: bincode::Error,
    },

    /// The spill directory backing a `DiskStore` could not be created
    #[error("failed to prepare spill directory {}: {source}", .path.display())]
    SpillDir {
        /// Directory that was being created
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The report sink rejected a write
    #[error("failed to write report: {0}")]
    Output(#[source] io::Error),
}

impl Error {
    pub(crate) fn storage(part: PartNumber, source: io::Error) -> Self {
        Error::Storage { part, source }
    }

    pub(crate) fn corrupt(part: PartNumber, source: bincode::Error) -> Self {
        Error::Corrupt { part, source }
    }
}

/// Result alias used across the crate
pub type Result<T> = ::std::result::Result<T, Error>;
