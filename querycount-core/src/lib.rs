//! querycount
//! ---
//! `querycount` counts the occurrences of every distinct line in an input whose full
//! frequency table may not fit in memory.
//!
//! How does it work?
//! ---
//!
//! Counting happens in two sequential phases:
//!
//! 1. `partition` - reads the input line by line and accumulates counts in an in-memory
//!    table.  Whenever the table holds `limit` distinct records it is flushed as a "part"
//!    to a `PartStore` and a fresh table begins.
//! 2. `reduce` - folds every part into the earliest part that shares its keys, removing
//!    absorbed keys from the later parts as it goes, and writes one `record\tcount` line
//!    per distinct record.  At most two parts are held (and opened) at once, no matter
//!    how many parts exist.
//!
//! Storage is pluggable: `MemoryStore` keeps parts in process, `DiskStore` spills them
//! into a private directory that disappears when the store is dropped.
//!
//! Example - Counting in memory
//! ---
//! ```rust
//! use querycount::config::Config;
//! use querycount::partition::partition;
//! use querycount::reduce::reduce;
//! use querycount::storage::{openers, PartStore};
//! use querycount::storage::memory::MemoryStore;
//!
//! let input = "qA\nqB\nqA\n";
//! let store = MemoryStore::new();
//! let config = Config::default().with_limit(1);
//!
//! let parts = partition(input.as_bytes(), &config, |part, n| store.save(part, n)).unwrap();
//! assert_eq!(parts, 3);
//!
//! let mut report = Vec::new();
//! reduce(&openers(&store, parts), &mut report).unwrap();
//!
//! let mut lines: Vec<_> = String::from_utf8(report).unwrap()
//!     .lines().map(|l| l.to_owned()).collect();
//! lines.sort();
//! assert_eq!(lines, vec!["qA\t2", "qB\t1"]);
//! ```
//!
//! Example - Spilling to disk
//! ---
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use querycount::config::Config;
//! use querycount::partition::partition;
//! use querycount::reduce::reduce;
//! use querycount::storage::{openers, PartStore};
//! use querycount::storage::disk::DiskStore;
//!
//! fn main() -> querycount::Result<()> {
//!     let input = BufReader::new(File::open("queries.txt").map_err(querycount::Error::Input)?);
//!     let store = DiskStore::new(std::env::temp_dir())?;
//!
//!     let parts = partition(input, &Config::default(), |part, n| store.save(part, n))?;
//!     let output = File::create("report.tsv").map_err(querycount::Error::Output)?;
//!     reduce(&openers(&store, parts), output)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

/// Tuning knobs threaded into the partitioner
pub mod config;

/// Error taxonomy shared by every stage
pub mod error;

/// Bounded line splitting of the raw input
pub mod lines;

/// Binary encoding of parts and the tab-delimited report
pub mod codec;

/// Storage handles, stores and their memory/disk backends
pub mod storage;

/// Splits an input stream into size-capped parts
pub mod partition;

/// Merges stored parts into the final report
pub mod reduce;

use std::collections::HashMap;

pub use error::{Error, Result};

/// An in-memory frequency table: record to number of occurrences.
///
/// Records are raw line bytes, compared byte for byte.
pub type Part = HashMap<Vec<u8>, u64>;

/// 1-based position of a part in flush order.
pub type PartNumber = u64;
