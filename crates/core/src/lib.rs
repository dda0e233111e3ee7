//! Shared foundations for the photopost pipeline
//!
//! - **Error handling**: coded errors with context and recovery suggestions,
//!   mapped to process exit codes
//! - **Configuration**: TOML-based configuration with per-section validation
//!
//! # Example
//!
//! ```rust,no_run
//! use photopost_core::config::Config;
//!
//! let config = Config::load(None)?;
//! println!("previews are {}px", config.schema.preview.max_edge);
//! # Ok::<(), photopost_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
}
