use std::io::BufRead;

use crate::config::Config;
use crate::error::Result;
use crate::lines::Records;
use crate::{Part, PartNumber};

/// Reads `input` line by line and flushes size-capped frequency tables through `save`.
///
/// Counts accumulate in the current part until it holds `config.limit` distinct
/// records; the part is then handed to `save` with its 1-based number and a new part
/// begins.  A non-empty final part is flushed at end of input.  Returns the number of
/// parts flushed.
///
/// With a limit of zero or below no record is counted: every record flushes an empty
/// part of its own, so the part count equals the record count.
///
/// Any error from `save` or from reading the input aborts the run.  Parts saved
/// before the failure are left as they are.
/// ```rust
///   use querycount::Part;
///   use querycount::config::Config;
///   use querycount::partition::partition;
///
///   let mut parts: Vec<Part> = Vec::new();
///   let count = partition("qA\nqB\nqA\nqC\n".as_bytes(), &Config::new(2), |part, _n| {
///       parts.push(part.clone());
///       Ok(())
///   }).unwrap();
///
///   assert_eq!(count, 2);
///   assert_eq!(parts[0].len(), 2);
///   assert_eq!(parts[1].get(&b"qC"[..]), Some(&1));
/// ```
pub fn partition<R, S>(input: R, config: &Config, mut save: S) -> Result<PartNumber>
where
    R: BufRead,
    S: FnMut(&Part, PartNumber) -> Result<()>,
{
    let mut flushed: PartNumber = 0;
    let mut part = Part::new();
    for record in Records::new(input, config.max_line_length) {
        let record = record?;
        if config.limit > 0 {
            *part.entry(record).or_insert(0) += 1;
        }
        if config.limit <= 0 || part.len() as u64 >= config.limit as u64 {
            flushed += 1;
            save(&part, flushed)?;
            part = Part::new();
        }
    }

    if !part.is_empty() {
        flushed += 1;
        save(&part, flushed)?;
    }
    Ok(flushed)
}
