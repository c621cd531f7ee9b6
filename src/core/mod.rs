//! Core module: log records and the lock-free handoff buffer
//!
//! Design principles:
//! - Lock-Free: producers never take a lock or touch I/O
//! - No-Allocation in the queue: all slots pre-allocated at init
//! - Drop-on-full: a saturated buffer rejects, it never blocks

mod entry;
mod ring_buffer;

pub use entry::{LogEntry, LogLevel};
pub use ring_buffer::RingBuffer;
