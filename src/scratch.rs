//! The scratch file (§4.3, §9 "arena-per-document pattern").
//!
//! Stream payloads are spilled out of the in-memory object graph into a single
//! random-access backing store owned exclusively by the `COSDocument`. This keeps
//! large content/image streams off the heap and sidesteps cross-document lifetime
//! questions: a `(offset, length)` descriptor is meaningless once the owning
//! document is closed, which is exactly the invariant §5 calls for.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// A `(offset, length)` descriptor into a `ScratchFile`. Cheap to copy, carries no
/// borrow — the file handle it refers to is validated lazily on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchSlice {
    pub offset: u64,
    pub length: u64,
}

enum Backing {
    /// Spilled to a real temp file once the document grows past a trivial size,
    /// or unconditionally when `ParserConfig::in_memory_scratch` is false.
    File(NamedTempFile),
    /// Kept entirely in memory; used for small or embedded documents per §10.3.
    Memory(Vec<u8>),
}

pub struct ScratchFile {
    backing: Backing,
    len: u64,
    closed: bool,
}

impl ScratchFile {
    /// Create a scratch file backed by a temp file under `dir` (or the system
    /// default if `None`).
    pub fn new_on_disk(dir: Option<&PathBuf>) -> Result<Self> {
        let file = match dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(Error::Io)?;
        Ok(ScratchFile {
            backing: Backing::File(file),
            len: 0,
            closed: false,
        })
    }

    /// Create a scratch file that never touches disk.
    pub fn new_in_memory() -> Self {
        ScratchFile {
            backing: Backing::Memory(Vec::new()),
            len: 0,
            closed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::DocumentClosed);
        }
        Ok(())
    }

    /// Append `bytes` at the end of the scratch store and return the slice
    /// describing where they landed.
    pub fn allocate(&mut self, bytes: &[u8]) -> Result<ScratchSlice> {
        self.check_open()?;
        let offset = self.len;
        match &mut self.backing {
            Backing::File(file) => {
                let handle = file.as_file_mut();
                handle.seek(SeekFrom::End(0)).map_err(Error::Io)?;
                handle.write_all(bytes).map_err(Error::Io)?;
            }
            Backing::Memory(buf) => buf.extend_from_slice(bytes),
        }
        self.len += bytes.len() as u64;
        Ok(ScratchSlice {
            offset,
            length: bytes.len() as u64,
        })
    }

    /// Read back the bytes described by `slice`.
    pub fn read_at(&self, slice: ScratchSlice) -> Result<Vec<u8>> {
        self.check_open()?;
        let end = slice
            .offset
            .checked_add(slice.length)
            .ok_or_else(|| Error::InvalidStream("scratch slice overflows".into()))?;
        if end > self.len {
            return Err(Error::InvalidStream("scratch slice extends past end of store".into()));
        }
        match &self.backing {
            Backing::File(file) => {
                // Positional read, not seek-then-read: `read_at` lets concurrent
                // readers (the rayon object-stream fan-out, §10.4) share one file
                // handle without racing on a single cursor.
                let handle: &File = file.as_file();
                let mut buf = vec![0u8; slice.length as usize];
                #[cfg(unix)]
                {
                    use std::os::unix::fs::FileExt;
                    handle.read_exact_at(&mut buf, slice.offset).map_err(Error::Io)?;
                }
                #[cfg(not(unix))]
                {
                    let mut cursor: &File = handle;
                    cursor.seek(SeekFrom::Start(slice.offset)).map_err(Error::Io)?;
                    cursor.read_exact(&mut buf).map_err(Error::Io)?;
                }
                Ok(buf)
            }
            Backing::Memory(buf) => {
                let start = slice.offset as usize;
                let len = slice.length as usize;
                Ok(buf[start..start + len].to_vec())
            }
        }
    }

    /// Exclusive release of the backing store. Idempotent; subsequent reads fail
    /// with `DocumentClosed` (§5).
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk_backing() {
        let mut scratch = ScratchFile::new_on_disk(None).unwrap();
        let a = scratch.allocate(b"hello").unwrap();
        let b = scratch.allocate(b"world!").unwrap();
        assert_eq!(scratch.read_at(a).unwrap(), b"hello");
        assert_eq!(scratch.read_at(b).unwrap(), b"world!");
    }

    #[test]
    fn round_trips_through_memory_backing() {
        let mut scratch = ScratchFile::new_in_memory();
        let slice = scratch.allocate(b"payload").unwrap();
        assert_eq!(scratch.read_at(slice).unwrap(), b"payload");
    }

    #[test]
    fn reads_fail_after_close() {
        let mut scratch = ScratchFile::new_in_memory();
        let slice = scratch.allocate(b"payload").unwrap();
        scratch.close();
        assert!(matches!(scratch.read_at(slice), Err(Error::DocumentClosed)));
    }

    #[test]
    fn out_of_range_slice_is_rejected() {
        let mut scratch = ScratchFile::new_in_memory();
        let _ = scratch.allocate(b"abc").unwrap();
        let bogus = ScratchSlice { offset: 0, length: 100 };
        assert!(scratch.read_at(bogus).is_err());
    }
}
