//! Read-only memory-mapped file access
//!
//! The map is owned by [`MappedRaw`]; every byte span handed to the
//! parsers is a borrow bounded by its lifetime. No write path exists.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};

/// A RAW file mapped read-only into memory
#[derive(Debug)]
pub struct MappedRaw {
    mmap: Mmap,
}

impl MappedRaw {
    /// Map `path` read-only, enforcing the configured size budget
    ///
    /// Fails with `FILE_NOT_FOUND` when the path is missing or
    /// unreadable and `OUT_OF_MEMORY` when the file exceeds `max_bytes`.
    pub fn open<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::FileNotFound {
            path: path.display().to_string(),
            source,
        })?;

        let len = file.metadata()?.len();
        if len > max_bytes {
            return Err(Error::MemoryLimit {
                size: len,
                max: max_bytes,
            });
        }

        // Safety: the map is read-only and private to this process; a
        // concurrent writer truncating the file is the usual mmap caveat
        // and is accepted for locally ingested camera files.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }

    /// The mapped bytes
    pub fn data(&self) -> &[u8] {
        &self.mmap
    }

    /// Mapped length in bytes
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// True if the mapped file is empty
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}
