//! A part lives behind a `PartStore`, which hands out short-lived `PartHandle`s.
//! Handles are opened on demand and released right after use, so the number of
//! simultaneously open resources (file descriptors, for instance) stays bounded no
//! matter how many parts a run produces.

/// Defines MemoryStore, which keeps parts in process
pub mod memory;

/// Defines DiskStore, which spills parts into a private directory
pub mod disk;

use std::io::{self, Read, Write};

use crate::codec;
use crate::error::{Error, Result};
use crate::{Part, PartNumber};

/// Read, write, clear and release access to exactly one stored part.
///
/// Dropping a handle releases it as well; `close` exists so that failures on
/// release can be observed.
pub trait PartHandle: Read + Write {
    /// Discards the stored bytes and moves the write position back to the start.
    fn clear(&mut self) -> io::Result<()>;

    /// Releases the handle
    fn close(self) -> io::Result<()>;
}

/// Hands out handles to numbered parts.
pub trait PartStore {
    /// Handle type produced by this store
    type Handle: PartHandle;

    /// Creates part `number` empty, replacing anything stored under it.
    fn create(&self, number: PartNumber) -> io::Result<Self::Handle>;

    /// Opens the existing part `number` for reading and rewriting.
    fn open(&self, number: PartNumber) -> io::Result<Self::Handle>;

    /// Serializes `part` as part `number`.  The handle is released before returning.
    fn save(&self, part: &Part, number: PartNumber) -> Result<()> {
        let mut handle = self.create(number).map_err(|e| Error::storage(number, e))?;
        codec::serialize(part, &mut handle).map_err(|e| Error::corrupt(number, e))?;
        handle.close().map_err(|e| Error::storage(number, e))
    }
}

/// Returns one handle factory per stored part, in part order, for `reduce`.
/// ```rust
///   use std::io::Read;
///   use querycount::Part;
///   use querycount::storage::{openers, PartStore};
///   use querycount::storage::memory::MemoryStore;
///
///   let store = MemoryStore::new();
///   store.save(&Part::new(), 1).unwrap();
///   store.save(&Part::new(), 2).unwrap();
///
///   let parts = openers(&store, 2);
///   assert_eq!(parts.len(), 2);
///   let mut bytes = Vec::new();
///   parts[1]().unwrap().read_to_end(&mut bytes).unwrap();
///   assert!(!bytes.is_empty());
/// ```
pub fn openers<S: PartStore>(
    store: &S,
    count: PartNumber,
) -> Vec<impl Fn() -> io::Result<S::Handle> + '_> {
    (1..=count).map(move |number| move || store.open(number)).collect()
}
