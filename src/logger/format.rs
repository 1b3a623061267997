//! Log formatting and output with ANSI colors
//!
//! Handles:
//! - Colorized console output with aligned tag and level columns
//! - Number highlighting in messages
//! - Dual output (console + file)
//! - Broken pipe handling for piped invocations

use super::file::write_to_file;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{stdout, ErrorKind, Write};

/// Column widths for alignment
const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 8;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\$?[\d,]+\.?\d*%?)").expect("valid number regex"));

/// Format and output a log message to console and file
pub fn format_and_log(tag: LogTag, level: &str, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();

    let tag_str = format_tag(&tag);
    let level_str = format_level(level);

    let console_line = format!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        tag_str,
        level_str,
        highlight_numbers(message)
    );
    print_stdout_safe(&console_line);

    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let file_line = format!(
        "{} [{}] [{}] {}",
        timestamp,
        tag.to_plain_string(),
        level,
        message
    );
    write_to_file(&file_line);
}

/// Format a tag with its module color
fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => padded.bright_yellow().bold(),
        LogTag::Session => padded.bright_green().bold(),
        LogTag::Risk => padded.bright_red().bold(),
        LogTag::Positions => padded.bright_cyan().bold(),
        LogTag::Scheduler => padded.bright_blue().bold(),
        LogTag::News => padded.bright_magenta().bold(),
        LogTag::Calendar => padded.cyan().bold(),
        LogTag::Platform => padded.green().bold(),
        LogTag::Health => padded.yellow().bold(),
        LogTag::Notify => padded.magenta().bold(),
        LogTag::State => padded.blue().bold(),
        LogTag::Config => padded.white().bold(),
    }
}

/// Format a level string with severity color
fn format_level(level: &str) -> ColoredString {
    let padded = format!("{:<width$}", level, width = LEVEL_WIDTH);
    match level {
        "ERROR" => padded.red().bold(),
        "WARNING" => padded.yellow().bold(),
        "DEBUG" => padded.purple(),
        "VERBOSE" => padded.dimmed(),
        _ => padded.normal(),
    }
}

/// Highlight numbers, percentages and dollar values in a message
fn highlight_numbers(message: &str) -> String {
    NUMBER_RE
        .replace_all(message, |caps: &regex::Captures| {
            caps[1].bright_white().bold().to_string()
        })
        .to_string()
}

/// Print to stdout, ignoring broken pipes (e.g. `scoutbot | head`)
fn print_stdout_safe(line: &str) {
    let mut out = stdout();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() != ErrorKind::BrokenPipe {
            eprintln!("{}", line);
        }
    }
}
