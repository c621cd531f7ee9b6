//! Rotating persisted-file backend.
//!
//! Serializes entries into append-only segments and rotates to a fresh
//! segment before any write that would push the current one past the
//! configured size threshold. Rotation policy is decoupled from the mmap
//! primitive through [`SegmentStore`], so it is testable with an in-memory
//! fake.
//!
//! Segment names carry a zero-padded incrementing suffix
//! (`app.log.00000`, `app.log.00001`, ...) so a later reader can order
//! them lexicographically with no gaps.

use std::io;
use std::path::{Path, PathBuf};

use crate::backend::MmapFile;
use crate::core::LogEntry;
use crate::error::PipelineError;

/// Capability contract the rotation layer needs from a segment:
/// open-or-create with an initial size, append, flush, close.
pub trait SegmentStore: Sized {
    fn create(path: &Path, initial_len: usize) -> io::Result<Self>;
    fn append(&mut self, data: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    fn close(self) -> io::Result<()>;
}

impl SegmentStore for MmapFile {
    fn create(path: &Path, initial_len: usize) -> io::Result<Self> {
        MmapFile::create(path, initial_len)
    }

    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        MmapFile::append(self, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        MmapFile::flush(self)
    }

    fn close(self) -> io::Result<()> {
        MmapFile::close(self)
    }
}

/// Append-only sink that rotates segments at a byte threshold.
///
/// Touched only by the single consumer thread; needs no synchronization.
pub struct RotatingFileBackend<S: SegmentStore = MmapFile> {
    base_path: PathBuf,
    rotation_size: usize,
    segment: Option<S>,
    segment_index: u32,
    written: usize,
}

impl<S: SegmentStore> RotatingFileBackend<S> {
    pub fn new(base_path: impl Into<PathBuf>, rotation_size: usize) -> Self {
        Self {
            base_path: base_path.into(),
            rotation_size: rotation_size.max(1),
            segment: None,
            segment_index: 0,
            written: 0,
        }
    }

    /// Opens the first segment. Call once before any `process`; calling on
    /// an already-open backend is a no-op.
    pub fn open(&mut self) -> Result<(), PipelineError> {
        if self.segment.is_some() {
            return Ok(());
        }
        let seg = S::create(&self.segment_path(self.segment_index), self.rotation_size)
            .map_err(PipelineError::BackendOpen)?;
        self.segment = Some(seg);
        self.written = 0;
        Ok(())
    }

    /// Serializes and appends one entry, rotating first if the write would
    /// push the current segment past the threshold.
    ///
    /// An entry bigger than the threshold still gets written, alone in its
    /// own segment, rather than being dropped.
    pub fn process(&mut self, entry: &LogEntry) -> Result<(), PipelineError> {
        let line = entry.format_line();
        let bytes = line.as_bytes();

        if self.written > 0 && self.written + bytes.len() > self.rotation_size {
            self.rotate()?;
        }

        let seg = self
            .segment
            .as_mut()
            .ok_or_else(|| PipelineError::BackendWrite(not_open()))?;
        seg.append(bytes).map_err(PipelineError::BackendWrite)?;
        self.written += bytes.len();
        Ok(())
    }

    /// Flushes and closes the current segment. Idempotent; a no-op when
    /// `open` was never called.
    pub fn close(&mut self) -> Result<(), PipelineError> {
        match self.segment.take() {
            Some(seg) => seg.close().map_err(PipelineError::BackendClose),
            None => Ok(()),
        }
    }

    /// Index of the segment currently being written.
    pub fn segment_index(&self) -> u32 {
        self.segment_index
    }

    /// Path for a given segment index: base path plus a zero-padded,
    /// lexicographically sortable suffix.
    pub fn segment_path(&self, index: u32) -> PathBuf {
        let mut name = self.base_path.as_os_str().to_os_string();
        name.push(format!(".{:05}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> Result<(), PipelineError> {
        if let Some(seg) = self.segment.take() {
            // A close failure surfaces as a write failure here: the caller
            // is mid-stream, not shutting down
            seg.close().map_err(PipelineError::BackendWrite)?;
        }
        self.segment_index += 1;
        let seg = S::create(&self.segment_path(self.segment_index), self.rotation_size)
            .map_err(PipelineError::BackendWrite)?;
        self.segment = Some(seg);
        self.written = 0;
        Ok(())
    }
}

fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "backend segment not open")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    thread_local! {
        // Per-test (per-thread) record of every fake segment ever written
        static SEGMENTS: RefCell<BTreeMap<PathBuf, Vec<u8>>> = RefCell::new(BTreeMap::new());
    }

    fn segment_bytes(path: &Path) -> Option<Vec<u8>> {
        SEGMENTS.with(|s| s.borrow().get(path).cloned())
    }

    fn reset_segments() {
        SEGMENTS.with(|s| s.borrow_mut().clear());
    }

    /// In-memory stand-in for the mmap primitive.
    struct MemSegment {
        path: PathBuf,
        data: Vec<u8>,
    }

    impl SegmentStore for MemSegment {
        fn create(path: &Path, _initial_len: usize) -> io::Result<Self> {
            Ok(Self {
                path: path.to_path_buf(),
                data: Vec::new(),
            })
        }

        fn append(&mut self, data: &[u8]) -> io::Result<()> {
            self.data.extend_from_slice(data);
            self.publish();
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(self) -> io::Result<()> {
            Ok(())
        }
    }

    impl MemSegment {
        fn publish(&self) {
            SEGMENTS.with(|s| {
                s.borrow_mut()
                    .insert(self.path.clone(), self.data.clone())
            });
        }
    }

    /// Segment that always fails appends, for write-failure propagation.
    struct BrokenSegment;

    impl SegmentStore for BrokenSegment {
        fn create(_path: &Path, _initial_len: usize) -> io::Result<Self> {
            Ok(Self)
        }

        fn append(&mut self, _data: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Entry whose serialized line has an exact byte length.
    fn entry_with_line_len(len: usize) -> LogEntry {
        let probe = LogEntry::new(LogLevel::Info, "t", "");
        let overhead = probe.format_line().len();
        assert!(len > overhead, "requested line too short");
        LogEntry::new(LogLevel::Info, "t", "x".repeat(len - overhead))
    }

    #[test]
    fn test_rotates_before_threshold_crossing() {
        reset_segments();
        let mut backend: RotatingFileBackend<MemSegment> =
            RotatingFileBackend::new("app.log", 100);
        backend.open().unwrap();

        // Three 40-byte records against a 100-byte threshold:
        // segment 0 takes two (80 bytes), segment 1 takes the third
        for _ in 0..3 {
            backend.process(&entry_with_line_len(40)).unwrap();
        }
        backend.close().unwrap();

        let seg0 = segment_bytes(&backend.segment_path(0)).unwrap();
        let seg1 = segment_bytes(&backend.segment_path(1)).unwrap();
        assert_eq!(seg0.len(), 80);
        assert_eq!(seg1.len(), 40);
        assert_eq!(backend.segment_index(), 1);
    }

    #[test]
    fn test_oversized_entry_gets_own_segment() {
        reset_segments();
        let mut backend: RotatingFileBackend<MemSegment> =
            RotatingFileBackend::new("app.log", 100);
        backend.open().unwrap();

        backend.process(&entry_with_line_len(40)).unwrap();
        // 250 > threshold: rotated out of segment 0, written alone into 1
        backend.process(&entry_with_line_len(250)).unwrap();
        backend.process(&entry_with_line_len(40)).unwrap();
        backend.close().unwrap();

        assert_eq!(segment_bytes(&backend.segment_path(0)).unwrap().len(), 40);
        assert_eq!(segment_bytes(&backend.segment_path(1)).unwrap().len(), 250);
        assert_eq!(segment_bytes(&backend.segment_path(2)).unwrap().len(), 40);
    }

    #[test]
    fn test_exact_fit_does_not_rotate() {
        reset_segments();
        let mut backend: RotatingFileBackend<MemSegment> =
            RotatingFileBackend::new("app.log", 80);
        backend.open().unwrap();

        backend.process(&entry_with_line_len(40)).unwrap();
        backend.process(&entry_with_line_len(40)).unwrap(); // lands exactly on 80
        backend.close().unwrap();

        assert_eq!(segment_bytes(&backend.segment_path(0)).unwrap().len(), 80);
        assert_eq!(backend.segment_index(), 0);
    }

    #[test]
    fn test_close_is_idempotent_and_noop_when_never_opened() {
        let mut backend: RotatingFileBackend<MemSegment> =
            RotatingFileBackend::new("app.log", 100);
        backend.close().unwrap(); // never opened: no-op

        backend.open().unwrap();
        backend.close().unwrap();
        backend.close().unwrap(); // second close: no-op
    }

    #[test]
    fn test_write_failure_is_reported_not_fatal() {
        let mut backend: RotatingFileBackend<BrokenSegment> =
            RotatingFileBackend::new("app.log", 100);
        backend.open().unwrap();

        let err = backend.process(&entry_with_line_len(40)).unwrap_err();
        assert!(matches!(err, PipelineError::BackendWrite(_)));
        // Backend object stays usable for the caller's retry policy
        assert!(backend.process(&entry_with_line_len(40)).is_err());
    }

    #[test]
    fn test_segment_names_sort_lexicographically() {
        let backend: RotatingFileBackend<MemSegment> =
            RotatingFileBackend::new("dir/app.log", 100);
        let a = backend.segment_path(0);
        let b = backend.segment_path(1);
        let c = backend.segment_path(10);
        assert_eq!(a, PathBuf::from("dir/app.log.00000"));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_rotation_against_real_mmap_segments() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("real.log");
        let mut backend: RotatingFileBackend =
            RotatingFileBackend::new(&base, 100);
        backend.open().unwrap();

        for _ in 0..3 {
            backend.process(&entry_with_line_len(40)).unwrap();
        }
        backend.close().unwrap();

        let seg0 = std::fs::read(backend.segment_path(0)).unwrap();
        let seg1 = std::fs::read(backend.segment_path(1)).unwrap();
        assert_eq!(seg0.len(), 80);
        assert_eq!(seg1.len(), 40);
    }
}
