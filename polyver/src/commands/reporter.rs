//! Terminal rendering of buffered project output.

use owo_colors::{AnsiColors, OwoColorize};
use polyver_core::{LogLevel, LogLine, ProjectColor, VersionReporter};

/// Prints each flushed line prefixed with the project name in its colour.
pub struct CliVersionReporter;

fn ansi(color: ProjectColor) -> AnsiColors {
    match color {
        ProjectColor::Cyan => AnsiColors::Cyan,
        ProjectColor::Green => AnsiColors::Green,
        ProjectColor::Yellow => AnsiColors::Yellow,
        ProjectColor::Magenta => AnsiColors::Magenta,
        ProjectColor::Blue => AnsiColors::Blue,
        ProjectColor::Red => AnsiColors::Red,
    }
}

impl VersionReporter for CliVersionReporter {
    fn flush(&self, project: &str, color: ProjectColor, lines: &[LogLine]) {
        let prefix = project.color(ansi(color)).bold().to_string();
        for line in lines {
            match line.level {
                LogLevel::Info => println!("{} {}", prefix, line.text),
                LogLevel::Warn => println!("{} {}", prefix, line.text.yellow()),
            }
        }
        println!();
    }
}
