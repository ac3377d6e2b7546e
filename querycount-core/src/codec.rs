//! Parts are written as a bincode header followed by one bincode `(bytes, u64)`
//! record per entry, much like a record file is streamed one item at a time.
//! The header carries the entry count, so a stream that ends early is an error
//! rather than a silently shorter part.  It also carries the longest record, which
//! bounds how much a single record may read while decoding.

use std::io::{BufReader, BufWriter, Read, Write};

use bincode::{DefaultOptions, ErrorKind, Options};
use serde_derive::{Deserialize, Serialize};

use crate::Part;

const PART_MAGIC: u32 = 0x5143_5054;

/// Length prefix plus count that frame every record
const RECORD_OVERHEAD: u64 = 16;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PartHeader {
    magic: u32,
    entries: u64,
    longest: u64,
}

/// Fixed-width little-endian integers, the layout of `bincode::serialize_into`.
fn options() -> impl Options {
    DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

/// Encodes `part` into `sink`, flushing before returning.
pub fn serialize<W: Write>(part: &Part, sink: W) -> bincode::Result<()> {
    let mut out = BufWriter::new(sink);
    let header = PartHeader {
        magic: PART_MAGIC,
        entries: part.len() as u64,
        longest: part.keys().map(|record| record.len() as u64).max().unwrap_or(0),
    };
    options().serialize_into(&mut out, &header)?;
    for entry in part.iter() {
        options().serialize_into(&mut out, &entry)?;
    }
    out.flush()?;
    Ok(())
}

/// Decodes a part previously written by `serialize`.
///
/// Reading is buffered, so `source` may be consumed past the end of the part.
/// Repeated records are collapsed into one entry holding the summed count.  A
/// record whose length prefix exceeds the header's longest record is an error,
/// never an allocation of that size.
pub fn deserialize<R: Read>(source: R) -> bincode::Result<Part> {
    let mut input = BufReader::new(source);
    let header: PartHeader = options().deserialize_from(&mut input)?;
    if header.magic != PART_MAGIC {
        return Err(Box::new(ErrorKind::Custom(format!(
            "bad part magic {:#010x}", header.magic
        ))));
    }

    let record_limit = header.longest.saturating_add(RECORD_OVERHEAD);
    let mut part = Part::new();
    for _ in 0..header.entries {
        let (record, count): (Vec<u8>, u64) = options()
            .with_limit(record_limit)
            .deserialize_from(&mut input)?;
        *part.entry(record).or_insert(0) += count;
    }
    Ok(part)
}

/// Writes `part` as `record\tcount\n` lines in no particular order.
///
/// Records are written back byte for byte, whatever their encoding.
pub fn write_report<W: Write>(part: &Part, mut out: W) -> std::io::Result<()> {
    for (record, count) in part.iter() {
        out.write_all(record)?;
        writeln!(out, "\t{}", count)?;
    }
    Ok(())
}
