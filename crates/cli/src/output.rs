//! Terminal output utilities

use owo_colors::OwoColorize;
use photopost_core::Error;
use std::time::Duration;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an aligned `label: value` line
    pub fn field(label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", format!("{label}:").dimmed(), value);
    }

    /// Print a coded error with its suggestion to stderr
    pub fn report(error: &Error) {
        eprintln!("{} {} {}", "✗".red(), format!("[{}]", error.code).dimmed(), error.message);
        if let Some(context) = &error.context {
            eprintln!("  {}", context.dimmed());
        }
        if let Some(suggestion) = &error.suggestion {
            eprintln!("  {} {}", "→".cyan(), suggestion);
        }
    }
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{mins}m {remaining_secs:.0}s")
    }
}

/// Format a file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// `"2.40 MB → 610.3 KB (-75%)"`
pub fn format_reduction(original: u64, compressed: u64, percent: f64) -> String {
    format!(
        "{} → {} (-{:.0}%)",
        format_size(original),
        format_size(compressed),
        percent
    )
}

/// Signed decimal coordinates with hemisphere letters, six decimals
pub fn format_coordinate(latitude: f64, longitude: f64) -> String {
    format!(
        "{:.6}°{} {:.6}°{}",
        latitude.abs(),
        if latitude < 0.0 { 'S' } else { 'N' },
        longitude.abs(),
        if longitude < 0.0 { 'W' } else { 'E' }
    )
}
