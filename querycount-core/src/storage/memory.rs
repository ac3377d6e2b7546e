use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::rc::Rc;

use super::{PartHandle, PartStore};
use crate::codec;
use crate::{Part, PartNumber};

type Buffer = Rc<RefCell<Vec<u8>>>;

#[derive(Default)]
struct OpenCount {
    current: Cell<usize>,
    peak: Cell<usize>,
}

/// Keeps every part in an in-process byte buffer.
///
/// Useful for tests and for inputs known to be small.  The store also tracks how
/// many handles are open at once.
/// ```rust
///   use querycount::Part;
///   use querycount::storage::PartStore;
///   use querycount::storage::memory::MemoryStore;
///
///   let store = MemoryStore::new();
///   let mut part = Part::new();
///   part.insert("qA".into(), 2);
///   store.save(&part, 1).unwrap();
///
///   assert_eq!(store.load(1), Some(part));
///   assert_eq!(store.peak_open_handles(), 1);
///   assert_eq!(store.open_handles(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    parts: Rc<RefCell<HashMap<PartNumber, Buffer>>>,
    handles: Rc<OpenCount>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of parts stored
    pub fn len(&self) -> usize {
        self.parts.borrow().len()
    }

    /// Whether no part has been stored
    pub fn is_empty(&self) -> bool {
        self.parts.borrow().is_empty()
    }

    /// Decodes part `number` without going through a handle.
    ///
    /// Returns `None` for unknown or undecodable parts.
    pub fn load(&self, number: PartNumber) -> Option<Part> {
        let buffer = self.parts.borrow().get(&number).cloned()?;
        let bytes = buffer.borrow();
        codec::deserialize(&bytes[..]).ok()
    }

    /// Number of handles currently open
    pub fn open_handles(&self) -> usize {
        self.handles.current.get()
    }

    /// Largest number of handles that were ever open at the same time
    pub fn peak_open_handles(&self) -> usize {
        self.handles.peak.get()
    }

    fn handle(&self, buffer: Buffer) -> MemoryPart {
        let current = self.handles.current.get() + 1;
        self.handles.current.set(current);
        if current > self.handles.peak.get() {
            self.handles.peak.set(current);
        }
        MemoryPart { buffer, pos: 0, handles: self.handles.clone() }
    }
}

impl PartStore for MemoryStore {
    type Handle = MemoryPart;

    fn create(&self, number: PartNumber) -> io::Result<MemoryPart> {
        let buffer = Buffer::default();
        self.parts.borrow_mut().insert(number, buffer.clone());
        Ok(self.handle(buffer))
    }

    fn open(&self, number: PartNumber) -> io::Result<MemoryPart> {
        let buffer = self.parts.borrow().get(&number).cloned();
        match buffer {
            Some(buffer) => Ok(self.handle(buffer)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("part {} does not exist", number),
            )),
        }
    }
}

/// Handle to one part of a `MemoryStore`.
pub struct MemoryPart {
    buffer: Buffer,
    pos: usize,
    handles: Rc<OpenCount>,
}

impl Read for MemoryPart {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let buffer = self.buffer.borrow();
        let available = buffer.get(self.pos..).unwrap_or(&[]);
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MemoryPart {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.borrow_mut();
        let end = self.pos + data.len();
        if buffer.len() < end {
            buffer.resize(end, 0);
        }
        buffer[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PartHandle for MemoryPart {
    fn clear(&mut self) -> io::Result<()> {
        self.buffer.borrow_mut().clear();
        self.pos = 0;
        Ok(())
    }

    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryPart {
    fn drop(&mut self) {
        self.handles.current.set(self.handles.current.get() - 1);
    }
}
