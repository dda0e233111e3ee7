//! Terminal helpers for the photopost command line
//!
//! - Arguments shared by every subcommand
//! - Status lines, size/duration formatting and error reports
//! - Spinners that stay out of the way of piped or `--json` output

#![warn(missing_docs)]

pub mod args;
pub mod output;
pub mod progress;

pub use args::GlobalArgs;
pub use output::Status;
