use std::io::{self, BufWriter, Write};

use crate::codec;
use crate::error::{Error, Result};
use crate::storage::PartHandle;
use crate::{Part, PartNumber};

/// Merges stored parts into one frequency report written to `output`.
///
/// `parts` holds one handle factory per part, in part order; each factory may be
/// called several times and must return a fresh handle every time.  For every part
/// `i`, the counts of each later part are folded into part `i`, and the records
/// folded away are removed from the later part's storage, so every record is
/// reported exactly once, by the first part that holds it.  A part's handle is
/// released as soon as the part is decoded and, when it was folded into, rewritten,
/// so at most one handle is open at any moment.
///
/// Lines are `record\tcount\n` in no particular order.  On error the output is
/// left partially written and must not be trusted.
/// ```rust
///   use querycount::Part;
///   use querycount::reduce::reduce;
///   use querycount::storage::{openers, PartStore};
///   use querycount::storage::memory::MemoryStore;
///
///   let store = MemoryStore::new();
///   let mut first = Part::new();
///   first.insert("qA".into(), 2);
///   let mut second = Part::new();
///   second.insert("qA".into(), 1);
///   store.save(&first, 1).unwrap();
///   store.save(&second, 2).unwrap();
///
///   let mut report = Vec::new();
///   reduce(&openers(&store, 2), &mut report).unwrap();
///   assert_eq!(report, b"qA\t3\n");
///   assert!(store.load(2).unwrap().is_empty());
/// ```
pub fn reduce<F, H, W>(parts: &[F], output: W) -> Result<()>
where
    F: Fn() -> io::Result<H>,
    H: PartHandle,
    W: Write,
{
    let mut out = BufWriter::new(output);
    for (idx, open) in parts.iter().enumerate() {
        let number = idx as PartNumber + 1;
        let mut handle = open().map_err(|e| Error::storage(number, e))?;
        let mut acc = codec::deserialize(&mut handle).map_err(|e| Error::corrupt(number, e))?;
        // The accumulator is never written back
        handle.close().map_err(|e| Error::storage(number, e))?;

        for (other_idx, other) in parts.iter().enumerate().skip(idx + 1) {
            absorb(&mut acc, other_idx as PartNumber + 1, other)?;
        }

        codec::write_report(&acc, &mut out).map_err(Error::Output)?;
    }
    out.flush().map_err(Error::Output)
}

/// Moves the counts of every record `acc` shares with part `number` into `acc`, then
/// stores what is left of that part.
fn absorb<F, H>(acc: &mut Part, number: PartNumber, open: &F) -> Result<()>
where
    F: Fn() -> io::Result<H>,
    H: PartHandle,
{
    let mut handle = open().map_err(|e| Error::storage(number, e))?;
    let mut other = codec::deserialize(&mut handle).map_err(|e| Error::corrupt(number, e))?;

    let before = other.len();
    other.retain(|record, count| match acc.get_mut(record) {
        Some(total) => {
            *total += *count;
            false
        }
        None => true,
    });

    // Untouched parts already hold exactly the surviving records
    if other.len() != before {
        handle.clear().map_err(|e| Error::storage(number, e))?;
        codec::serialize(&other, &mut handle).map_err(|e| Error::corrupt(number, e))?;
    }
    handle.close().map_err(|e| Error::storage(number, e))
}

#[cfg(test)]
mod test_lib {
    use super::*;
    use crate::config::Config;
    use crate::partition::partition;
    use crate::storage::memory::MemoryStore;
    use crate::storage::{openers, PartStore};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use std::cell::RefCell;

    fn part(entries: &[(&str, u64)]) -> Part {
        entries.iter().map(|&(k, v)| (k.as_bytes().to_vec(), v)).collect()
    }

    fn store_of(parts: &[Part]) -> MemoryStore {
        let store = MemoryStore::new();
        for (idx, p) in parts.iter().enumerate() {
            store.save(p, idx as PartNumber + 1).unwrap();
        }
        store
    }

    fn parse_report(report: &[u8]) -> Part {
        assert!(report.is_empty() || report.ends_with(b"\n"));
        let mut counts = Part::new();
        for line in report.split(|&b| b == b'\n').filter(|line| !line.is_empty()) {
            let tab = line.iter().rposition(|&b| b == b'\t').unwrap();
            let count = std::str::from_utf8(&line[tab + 1..]).unwrap().parse().unwrap();
            let record = line[..tab].to_vec();
            assert!(counts.insert(record, count).is_none(), "record reported twice: {:?}", line);
        }
        counts
    }

    fn reduce_store(store: &MemoryStore, count: PartNumber) -> Part {
        let mut report = Vec::new();
        reduce(&openers(store, count), &mut report).unwrap();
        parse_report(&report)
    }

    fn sample_parts() -> Vec<Part> {
        vec![
            part(&[("qA", 2), ("qB", 1), ("qC", 1), ("qD", 1)]),
            part(&[("qA", 1), ("qE", 1)]),
            part(&[("qC", 4)]),
        ]
    }

    #[test]
    fn test_merge_overlapping_parts() {
        let store = store_of(&sample_parts());
        let counts = reduce_store(&store, 3);
        assert_eq!(counts, part(&[("qA", 3), ("qB", 1), ("qC", 5), ("qD", 1), ("qE", 1)]));
    }

    #[test]
    fn test_order_independence() {
        let expected = reduce_store(&store_of(&sample_parts()), 3);
        let mut rng = StdRng::seed_from_u64(7);
        let mut parts: Vec<Part> = (0..12)
            .map(|i| {
                (0..9).filter(|k| (i + k) % 3 != 0)
                    .map(|k| (format!("q{}", k).into_bytes(), (i * k) as u64 % 5))
                    .collect()
            })
            .collect();
        parts.extend(sample_parts());

        let baseline = reduce_store(&store_of(&parts), parts.len() as PartNumber);
        for _ in 0..10 {
            parts.shuffle(&mut rng);
            let counts = reduce_store(&store_of(&parts), parts.len() as PartNumber);
            assert_eq!(counts, baseline);
        }
        assert_eq!(baseline[&b"qA"[..]], expected[&b"qA"[..]]);
    }

    #[test]
    fn test_absorbed_records_are_removed() {
        let store = store_of(&sample_parts());
        let mut acc = store.load(1).unwrap();
        absorb(&mut acc, 2, &|| store.open(2)).unwrap();
        absorb(&mut acc, 3, &|| store.open(3)).unwrap();

        assert_eq!(acc, part(&[("qA", 3), ("qB", 1), ("qC", 5), ("qD", 1)]));
        assert_eq!(store.load(2), Some(part(&[("qE", 1)])));
        assert_eq!(store.load(3), Some(Part::new()));

        // A second pass has nothing left to absorb
        absorb(&mut acc, 2, &|| store.open(2)).unwrap();
        assert_eq!(acc[&b"qA"[..]], 3);
        assert_eq!(store.load(2), Some(part(&[("qE", 1)])));
    }

    #[test]
    fn test_surviving_records_shrink() {
        let parts = vec![
            part(&[("qA", 1)]),
            part(&[("qB", 1)]),
            part(&[("qA", 1), ("qB", 1), ("qC", 1)]),
        ];
        let store = store_of(&parts);
        reduce_store(&store, 3);
        assert_eq!(store.load(1), Some(part(&[("qA", 1)])));
        assert_eq!(store.load(2), Some(part(&[("qB", 1)])));
        assert_eq!(store.load(3), Some(part(&[("qC", 1)])));
    }

    #[test]
    fn test_one_open_handle_during_fold() {
        let parts: Vec<Part> = (0..20)
            .map(|i| {
                let own = format!("q{}", i);
                part(&[("shared", 1), (own.as_str(), 1)])
            })
            .collect();
        let store = store_of(&parts);
        let counts = reduce_store(&store, 20);
        assert_eq!(counts[&b"shared"[..]], 20);
        assert_eq!(counts.len(), 21);
        // The accumulator's handle is released before any later part is opened
        assert_eq!(store.peak_open_handles(), 1);
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn test_accumulator_released_before_absorbing() {
        let store = store_of(&sample_parts());
        let seen = RefCell::new(Vec::new());
        let (store_ref, seen_ref) = (&store, &seen);
        let parts: Vec<_> = (1..=3)
            .map(move |number| {
                move || {
                    seen_ref.borrow_mut().push((number, store_ref.open_handles()));
                    store_ref.open(number)
                }
            })
            .collect();
        let mut report = Vec::new();
        reduce(&parts, &mut report).unwrap();

        assert_eq!(*seen.borrow(), vec![(1, 0), (2, 0), (3, 0), (2, 0), (3, 0), (3, 0)]);
        assert_eq!(parse_report(&report)[&b"qC"[..]], 5);
    }

    #[test]
    fn test_no_parts() {
        let store = MemoryStore::new();
        assert!(reduce_store(&store, 0).is_empty());
    }

    #[test]
    fn test_empty_parts_from_non_positive_limit() {
        let store = MemoryStore::new();
        let count = partition("qA\nqB\nqA\n".as_bytes(), &Config::new(0), |p, n| store.save(p, n)).unwrap();
        assert_eq!(count, 3);
        assert!(reduce_store(&store, count).is_empty());
    }

    #[test]
    fn test_partition_then_reduce() {
        let data = "qA\nqB\nqC\nqD\nqA\nqA\nqE\nqF\n";
        let store = MemoryStore::new();
        let count = partition(data.as_bytes(), &Config::new(5), |p, n| store.save(p, n)).unwrap();
        assert_eq!(count, 2);

        let expected = part(&[("qA", 3), ("qB", 1), ("qC", 1), ("qD", 1), ("qE", 1), ("qF", 1)]);
        assert_eq!(reduce_store(&store, count), expected);
    }

    #[test]
    fn test_non_utf8_records_reported_verbatim() {
        let store = MemoryStore::new();
        let count = partition(&b"caf\xe9\nqA\ncaf\xe9\n"[..], &Config::new(1), |p, n| store.save(p, n)).unwrap();
        assert_eq!(count, 3);

        let mut report = Vec::new();
        reduce(&openers(&store, count), &mut report).unwrap();
        let mut lines: Vec<_> = report.split(|&b| b == b'\n').filter(|l| !l.is_empty()).collect();
        lines.sort();
        assert_eq!(lines, vec![&b"caf\xe9\t2"[..], &b"qA\t1"[..]]);
    }

    #[test]
    fn test_missing_part_aborts() {
        let store = store_of(&sample_parts());
        let mut report = Vec::new();
        match reduce(&openers(&store, 4), &mut report) {
            Err(Error::Storage { part, source }) => {
                assert_eq!(part, 4);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Storage error, got {:?}", other),
        }
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn test_corrupt_part_aborts() {
        let store = store_of(&sample_parts());
        {
            let mut handle = store.open(2).unwrap();
            handle.clear().unwrap();
            handle.write_all(b"garbage").unwrap();
        }
        let mut report = Vec::new();
        match reduce(&openers(&store, 3), &mut report) {
            Err(Error::Corrupt { part, .. }) => assert_eq!(part, 2),
            other => panic!("expected Corrupt error, got {:?}", other),
        }
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn test_output_failure() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "pipe closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let store = store_of(&sample_parts());
        let parts = openers(&store, 3);
        match reduce(&parts, Broken) {
            Err(Error::Output(e)) => assert_eq!(e.to_string(), "pipe closed"),
            other => panic!("expected Output error, got {:?}", other),
        }
    }
}
