//! Persisted sink: mmap segment primitive plus rotation policy.

mod mmap_file;
mod rotating;

pub use mmap_file::MmapFile;
pub use rotating::{RotatingFileBackend, SegmentStore};
