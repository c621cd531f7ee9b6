//! The logging pipeline: producer-side filtering and enqueue, plus the
//! single-consumer drain loop that routes entries to the enabled sinks.
//!
//! `log()` is the hot path: level check, construct, push. No I/O, no locks,
//! no failure surfaced to the caller. The drain loop is meant to run on one
//! dedicated thread owned by the embedder; `shutdown()` asks it to perform
//! a final full drain and stop.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::backend::RotatingFileBackend;
use crate::config::PipelineConfig;
use crate::core::{LogEntry, LogLevel, RingBuffer};
use crate::error::PipelineError;

/// Granularity of the drain-period sleep. Shutdown interrupts the wait at
/// the next slice boundary.
const SLEEP_SLICE: Duration = Duration::from_millis(1);

/// Drain loop lifecycle. Transitions are one-way; a stopped pipeline is
/// never reused.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl PipelineState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// Asynchronous logging pipeline.
///
/// Share it behind an `Arc`: producers call [`log`](Self::log) from any
/// thread while one dedicated thread runs [`run`](Self::run).
pub struct LogPipeline {
    config: PipelineConfig,
    buffer: RingBuffer<LogEntry>,
    finishing: AtomicBool,
    state: AtomicU8,
    dropped: AtomicU64,
    error_tx: Sender<PipelineError>,
}

impl LogPipeline {
    /// Builds a pipeline from its configuration.
    ///
    /// Also hands back the receiving end of the error channel; backend
    /// failures show up there. Dropping the receiver is fine for embedders
    /// that don't care.
    pub fn initialise(config: PipelineConfig) -> (Self, Receiver<PipelineError>) {
        let (error_tx, error_rx) = mpsc::channel();
        let pipeline = Self {
            buffer: RingBuffer::new(config.buffer_capacity),
            config,
            finishing: AtomicBool::new(false),
            state: AtomicU8::new(PipelineState::Idle as u8),
            dropped: AtomicU64::new(0),
            error_tx,
        };
        (pipeline, error_rx)
    }

    /// Producer entry point. Filters against the configured threshold,
    /// builds the entry and pushes it. Never blocks, never performs I/O,
    /// never reports failure to the caller; a full buffer only moves the
    /// dropped counter.
    pub fn log(&self, level: LogLevel, sender: &str, message: &str) {
        if level == LogLevel::Off || level > self.config.level {
            return;
        }
        let entry = LogEntry::new(level, sender, message);
        if self.buffer.push(entry).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The background drain loop. Enter once, from the consumer thread.
    ///
    /// Returns immediately when no sink is enabled or the pipeline already
    /// ran. Otherwise loops until [`shutdown`](Self::shutdown): drain the
    /// buffer, route each entry to the backend and/or stdout in pop order,
    /// then sleep one write period. On exit the backend is closed exactly
    /// once.
    pub fn run(&self) {
        let idle = PipelineState::Idle as u8;
        let running = PipelineState::Running as u8;
        if self
            .state
            .compare_exchange(idle, running, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return; // Already running or already stopped
        }

        let backend_enabled = self.config.file_name.is_some();
        if !backend_enabled && !self.config.copy_to_stdout {
            self.state
                .store(PipelineState::Stopped as u8, Ordering::Release);
            return; // Nothing to do
        }

        // Open failure disables the backend for this run; stdout mirroring
        // is unaffected
        let mut backend = self.config.file_name.as_ref().and_then(|path| {
            let mut b = RotatingFileBackend::new(path, self.config.rotation_size);
            match b.open() {
                Ok(()) => Some(b),
                Err(e) => {
                    self.report(e);
                    None
                }
            }
        });

        loop {
            self.drain(&mut backend);

            if self.finishing.load(Ordering::Acquire) {
                self.state
                    .store(PipelineState::Draining as u8, Ordering::Release);
                // Final pass: flush everything enqueued before the signal
                self.drain(&mut backend);
                break;
            }

            self.wait_one_period();
        }

        if let Some(b) = backend.as_mut() {
            if let Err(e) = b.close() {
                self.report(e);
            }
        }
        self.state
            .store(PipelineState::Stopped as u8, Ordering::Release);
    }

    /// Asks the drain loop to flush and stop. Callable from any thread,
    /// idempotent, never reset.
    pub fn shutdown(&self) {
        self.finishing.store(true, Ordering::Release);
    }

    /// Entries rejected because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Approximate number of entries waiting to be drained.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_finishing(&self) -> bool {
        self.finishing.load(Ordering::Acquire)
    }

    /// One drain pass: pop until empty, routing each entry to every enabled
    /// sink in pop order.
    fn drain(&self, backend: &mut Option<RotatingFileBackend>) {
        while let Some(entry) = self.buffer.pop() {
            if let Some(b) = backend.as_mut() {
                if let Err(e) = b.process(&entry) {
                    self.report(e);
                }
            }
            if self.config.copy_to_stdout {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                let _ = out.write_all(entry.format_line().as_bytes());
            }
        }
    }

    /// Sleeps one write period in small slices so a shutdown request cuts
    /// the wait short.
    fn wait_one_period(&self) {
        let mut remaining = self.config.write_period;
        while !remaining.is_zero() && !self.finishing.load(Ordering::Acquire) {
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
    }

    fn report(&self, error: PipelineError) {
        if self.config.copy_to_stdout {
            // Keep the surviving sink informed about the failing one
            eprintln!("scribe: {}", error);
        }
        let _ = self.error_tx.send(error);
    }
}
