use std::io::{BufRead, ErrorKind};
use std::mem;

use crate::error::{Error, Result};

/// Splits a buffered reader into records, one per line.
///
/// Records are the raw bytes of each line; no encoding is assumed.  The line break
/// and a single trailing `\r` are stripped.  A last line without a line break is
/// still a record, while a trailing line break does not produce an extra empty
/// one.  Lines longer than `max_len` bytes fail with
/// `Error::LineTooLong` without being buffered in full.
/// ```rust
///   use querycount::lines::Records;
///
///   let records: Vec<_> = Records::new("qA\r\n\nqB".as_bytes(), 16)
///       .collect::<Result<_, _>>().unwrap();
///   assert_eq!(records, vec![b"qA".to_vec(), Vec::new(), b"qB".to_vec()]);
/// ```
pub struct Records<R> {
    reader: R,
    max_len: usize,
    line: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> Records<R> {
    /// Wraps `reader`, rejecting lines longer than `max_len` bytes
    pub fn new(reader: R, max_len: usize) -> Self {
        Records { reader, max_len, line: 0, buf: Vec::new(), done: false }
    }

    /// Fills `buf` with the next line; `false` on a clean end of input.
    fn fill_line(&mut self) -> Result<bool> {
        self.buf.clear();
        loop {
            let (found, used) = {
                let available = match self.reader.fill_buf() {
                    Ok(available) => available,
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(Error::Input(e)),
                };
                if available.is_empty() {
                    let any = !self.buf.is_empty();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                    return Ok(any);
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(idx) => {
                        self.buf.extend_from_slice(&available[..idx]);
                        (true, idx + 1)
                    }
                    None => {
                        self.buf.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };
            self.reader.consume(used);

            if self.buf.last() == Some(&b'\r') && found {
                self.buf.pop();
            }
            // A pending '\r' may still be stripped once the '\n' arrives
            let pending = if !found && self.buf.last() == Some(&b'\r') { 1 } else { 0 };
            if self.buf.len() - pending > self.max_len {
                return Err(Error::LineTooLong { line: self.line + 1, limit: self.max_len });
            }
            if found {
                return Ok(true);
            }
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.fill_line() {
            Ok(true) => {
                self.line += 1;
                Some(Ok(mem::take(&mut self.buf)))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
