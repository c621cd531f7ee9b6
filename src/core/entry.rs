//! Log levels and the immutable log record.
//!
//! A `LogEntry` is built once at the call site and moved through the ring
//! buffer to the drain loop; it is never mutated after construction.

use std::fmt;

/// Severity levels, ordered by increasing verbosity.
///
/// A configured threshold `T` admits a record of level `L` iff `L <= T`.
/// `Off` admits nothing.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Off),
            1 => Some(Self::Error),
            2 => Some(Self::Warn),
            3 => Some(Self::Info),
            4 => Some(Self::Debug),
            5 => Some(Self::Trace),
            _ => None,
        }
    }

    /// Fixed-width label used in the serialized record.
    #[inline(always)]
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One log record: level, sender, message, capture-time timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    level: LogLevel,
    sender: String,
    message: String,
    timestamp_ns: u64,
}

impl LogEntry {
    /// Construction is total: no side effects, no failure modes.
    pub fn new(level: LogLevel, sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            sender: sender.into(),
            message: message.into(),
            timestamp_ns: now_ns(),
        }
    }

    #[inline(always)]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[inline(always)]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    #[inline(always)]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Nanoseconds since the Unix epoch, captured at construction.
    #[inline(always)]
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Serialized record, shared by the file backend and the console sink
    /// so both outputs stay byte-identical per entry.
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] [{}] {}\n",
            self.timestamp_ns, self.level, self.sender, self.message
        )
    }
}

/// Current timestamp in nanoseconds.
#[inline(always)]
fn now_ns() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
