//! Verification diagnostics
//!
//! A verification pass appends every observation to a [Trail] and returns it
//! inside the final [Verification] alongside the boolean verdict. The trail
//! is plain data: callers render it, filter it by level, or serialize it for
//! tooling. Nothing in the crate writes to a process-wide logger.

use serde::Serialize;
use std::fmt;

/// Severity of one trail entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Hard mismatch against the schema (extension, header)
    Error,
    /// Structural failure or overall negative verdict
    Warn,
    /// Pass boundaries: start and final summary
    Info,
    /// Per-candidate detail while identifying a node
    Debug,
    /// Per-node detail for accepted nodes
    Trace,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        write!(f, "{}", label)
    }
}

/// One leveled, human-readable trail entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// Append-only record of one verification pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trail {
    entries: Vec<Diagnostic>,
}

impl Trail {
    pub fn new() -> Self {
        Trail::default()
    }

    pub(crate) fn push(&mut self, level: Level, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            level,
            message: message.into(),
        });
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.push(Level::Warn, message);
    }

    pub(crate) fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub(crate) fn debug(&mut self, message: impl Into<String>) {
        self.push(Level::Debug, message);
    }

    pub(crate) fn trace(&mut self, message: impl Into<String>) {
        self.push(Level::Trace, message);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of entries at the given level
    pub fn count(&self, level: Level) -> usize {
        self.entries.iter().filter(|d| d.level == level).count()
    }

    /// Messages at the given level, in trail order
    pub fn messages_at(&self, level: Level) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |d| d.level == level)
            .map(|d| d.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the whole trail, one `LEVEL: message` line per entry
    pub fn render(&self) -> String {
        let lines: Vec<String> = self.entries.iter().map(|d| d.to_string()).collect();
        lines.join("\n")
    }
}

/// Outcome of verifying one file: verdict plus the full trail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    passed: bool,
    trail: Trail,
}

impl Verification {
    pub(crate) fn new(passed: bool, trail: Trail) -> Self {
        Verification { passed, trail }
    }

    /// Did the file match the schema?
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }
}
