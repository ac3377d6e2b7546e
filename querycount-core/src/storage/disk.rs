//! Parts spilled to disk.
//!
//! A `DiskStore` owns a freshly created directory `querycount-<uuid>` inside a root
//! chosen by the caller.  Each part lives in its own `part<N>.bin` file, which is only
//! open while a handle to it is alive.  Dropping the store removes the directory and
//! everything in it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{PartHandle, PartStore};
use crate::error::{Error, Result};
use crate::PartNumber;

/// File-backed part store.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Creates a private spill directory under `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let dir = root.as_ref().join(format!("querycount-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).map_err(|source| Error::SpillDir {
            path: dir.clone(),
            source,
        })?;
        debug!("Created spill directory {}", dir.display());
        Ok(DiskStore { dir })
    }

    /// Directory holding the part files
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn part_path(&self, number: PartNumber) -> PathBuf {
        self.dir.join(format!("part{}.bin", number))
    }
}

impl Drop for DiskStore {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!("Removed spill directory {}", self.dir.display()),
            Err(e) => warn!("Error deleting {}: {}", self.dir.display(), e),
        }
    }
}

impl PartStore for DiskStore {
    type Handle = PartFile;

    fn create(&self, number: PartNumber) -> io::Result<PartFile> {
        let path = self.part_path(number);
        trace!("Creating {}", path.display());
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(PartFile { file })
    }

    fn open(&self, number: PartNumber) -> io::Result<PartFile> {
        let path = self.part_path(number);
        trace!("Opening {}", path.display());
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(PartFile { file })
    }
}

/// An open part file.  The descriptor is closed when the handle is dropped.
pub struct PartFile {
    file: File,
}

impl Read for PartFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for PartFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl PartHandle for PartFile {
    fn clear(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn close(mut self) -> io::Result<()> {
        self.file.flush()
    }
}
