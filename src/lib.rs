//! Scribe - Asynchronous Lock-Free Logging Pipeline
//!
//! Architecture:
//! - Lock-Free handoff: MPMC ring buffer between producers and the drain loop
//! - Non-blocking producers: drop-on-full, never wait on I/O
//! - Mmap persistence: rotating append-only segments via memory mapping
//! - Single consumer: one background thread routes entries to the sinks
//!
//! ```no_run
//! use std::sync::Arc;
//! use scribe::{LogLevel, LogPipeline, PipelineConfig};
//!
//! let config = PipelineConfig {
//!     file_name: Some("app.log".into()),
//!     copy_to_stdout: true,
//!     ..PipelineConfig::default()
//! };
//! let (pipeline, _errors) = LogPipeline::initialise(config);
//! let pipeline = Arc::new(pipeline);
//!
//! let consumer = {
//!     let pipeline = Arc::clone(&pipeline);
//!     std::thread::spawn(move || pipeline.run())
//! };
//!
//! pipeline.log(LogLevel::Info, "main", "hello");
//! pipeline.shutdown();
//! consumer.join().unwrap();
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;

pub use backend::{MmapFile, RotatingFileBackend, SegmentStore};
pub use config::PipelineConfig;
pub use core::{LogEntry, LogLevel, RingBuffer};
pub use error::PipelineError;
pub use pipeline::{LogPipeline, PipelineState};
