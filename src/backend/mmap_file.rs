//! Memory-Mapped Append-Only Segment File
//!
//! One log segment = one linear mmap-backed file:
//! - Append goes straight into the mapped region, no write syscall per record
//! - The mapping grows by doubling (set_len + remap) up to a hard cap
//! - Close flushes and truncates the file to the bytes actually written

use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Hard cap on a single segment's mapped length. Rotation normally caps
/// segments far below this; the limit only bounds a runaway oversized entry.
const MAX_SEGMENT_LEN: usize = 1 << 30; // 1 GiB

/// Append-only memory-mapped segment.
pub struct MmapFile {
    file: File,
    mmap: MmapMut,
    mapped_len: usize,
    written: usize,
}

impl MmapFile {
    /// Creates (truncating any stale file) and maps a segment of at least
    /// `initial_len` bytes.
    pub fn create<P: AsRef<Path>>(path: P, initial_len: usize) -> io::Result<Self> {
        let initial_len = initial_len.max(1).min(MAX_SEGMENT_LEN);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.set_len(initial_len as u64)?;

        // SAFETY: file is open with read/write permission and sized above
        let mmap = unsafe { MmapOptions::new().len(initial_len).map_mut(&file)? };

        Ok(Self {
            file,
            mmap,
            mapped_len: initial_len,
            written: 0,
        })
    }

    /// Appends `data`, remapping with doubled length when the region is
    /// exhausted. Fails once the segment cap is reached.
    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        let needed = self.written + data.len();
        if needed > self.mapped_len {
            self.grow(needed)?;
        }

        self.mmap[self.written..needed].copy_from_slice(data);
        self.written = needed;
        Ok(())
    }

    /// Flushes dirty pages to disk.
    pub fn flush(&mut self) -> io::Result<()> {
        self.mmap.flush()
    }

    /// Flushes and truncates the file to the written length.
    pub fn close(mut self) -> io::Result<()> {
        self.mmap.flush()?;
        self.file.set_len(self.written as u64)
    }

    /// Bytes appended so far.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.written
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    fn grow(&mut self, needed: usize) -> io::Result<()> {
        if needed > MAX_SEGMENT_LEN {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "segment exceeds maximum mapped length",
            ));
        }

        let mut new_len = self.mapped_len.max(1);
        while new_len < needed {
            new_len = (new_len * 2).min(MAX_SEGMENT_LEN);
        }

        // Flush before dropping the old mapping, then remap at the new size
        self.mmap.flush()?;
        self.file.set_len(new_len as u64)?;
        // SAFETY: file resized above, permissions unchanged
        self.mmap = unsafe { MmapOptions::new().len(new_len).map_mut(&self.file)? };
        self.mapped_len = new_len;
        Ok(())
    }
}
