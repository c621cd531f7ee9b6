//! Pipeline failure taxonomy.
//!
//! None of these cross the producer hot path: `log()` is failure-silent and
//! queue saturation is tracked by a counter, not an error value. Backend
//! failures are reported on the pipeline's error channel and the drain loop
//! keeps running.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The backend could not open its first segment. Fatal for the backend
    /// only; console mirroring keeps working.
    #[error("backend open failed: {0}")]
    BackendOpen(#[source] io::Error),

    /// A single write failed (e.g. disk full). Reported once per occurrence,
    /// the drain loop continues.
    #[error("backend write failed: {0}")]
    BackendWrite(#[source] io::Error),

    /// Flush/close at shutdown failed. Does not prevent process exit.
    #[error("backend close failed: {0}")]
    BackendClose(#[source] io::Error),
}
