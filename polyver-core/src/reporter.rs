//! Buffered per-project output.
//!
//! Each project accumulates log lines while it is being processed; the buffer
//! is flushed to a [`VersionReporter`] once the project is skipped, finished
//! or about to fail. This keeps the output of one project contiguous.

use std::fmt;

use tracing::{info, warn};

/// Colour assigned to a project's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectColor {
    Cyan,
    Green,
    Yellow,
    Magenta,
    Blue,
    Red,
}

impl ProjectColor {
    pub const PALETTE: [ProjectColor; 6] = [
        ProjectColor::Cyan,
        ProjectColor::Green,
        ProjectColor::Yellow,
        ProjectColor::Magenta,
        ProjectColor::Blue,
        ProjectColor::Red,
    ];

    /// Deterministic colour for `project`.
    pub fn for_project(project: &str) -> Self {
        let hash = project
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        Self::PALETTE[(hash as usize) % Self::PALETTE.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Sink for flushed project output.
///
/// Lets the core report progress without writing to stdout/stderr itself.
pub trait VersionReporter: Send + Sync {
    fn flush(&self, project: &str, color: ProjectColor, lines: &[LogLine]);
}

/// Reporter that forwards lines to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl VersionReporter for TracingReporter {
    fn flush(&self, project: &str, _color: ProjectColor, lines: &[LogLine]) {
        for line in lines {
            match line.level {
                LogLevel::Info => info!(project = project, "{}", line.text),
                LogLevel::Warn => warn!(project = project, "{}", line.text),
            }
        }
    }
}

/// Buffer of output lines for one project.
#[derive(Debug, Clone)]
pub struct ProjectLogger {
    project: String,
    color: ProjectColor,
    lines: Vec<LogLine>,
}

impl ProjectLogger {
    pub fn new(project: impl Into<String>) -> Self {
        let project = project.into();
        let color = ProjectColor::for_project(&project);
        Self {
            project,
            color,
            lines: Vec::new(),
        }
    }

    #[inline]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[inline]
    pub fn color(&self) -> ProjectColor {
        self.color
    }

    pub fn buffer(&mut self, text: impl Into<String>) {
        self.lines.push(LogLine {
            level: LogLevel::Info,
            text: text.into(),
        });
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.lines.push(LogLine {
            level: LogLevel::Warn,
            text: text.into(),
        });
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sends all buffered lines to `reporter` and clears the buffer.
    pub fn flush(&mut self, reporter: &dyn VersionReporter) {
        if self.lines.is_empty() {
            return;
        }
        reporter.flush(&self.project, self.color, &self.lines);
        self.lines.clear();
    }
}
