//! Pipeline configuration.
//!
//! Values come from an external collaborator (file, env, CLI); this crate
//! only consumes the finished struct.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::LogLevel;

/// Configuration consumed by [`LogPipeline::initialise`].
///
/// [`LogPipeline::initialise`]: crate::LogPipeline::initialise
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pause between empty-queue checks; bounds worst-case log-to-sink
    /// latency to roughly one period.
    pub write_period: Duration,
    /// Ring buffer capacity (rounded up to a power of two).
    pub buffer_capacity: usize,
    /// Threshold: entries with a level above this are filtered at the
    /// producer.
    pub level: LogLevel,
    /// Base path for the persisted backend. `None` disables it.
    pub file_name: Option<PathBuf>,
    /// Byte threshold at which the backend rotates to a fresh segment.
    pub rotation_size: usize,
    /// Mirror every drained entry to stdout.
    pub copy_to_stdout: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            write_period: Duration::from_millis(10),
            buffer_capacity: 8192,
            level: LogLevel::Info,
            file_name: None,
            rotation_size: 64 * 1024 * 1024,
            copy_to_stdout: false,
        }
    }
}
