//! Configuration loading and schema definitions
//!
//! The loaded value is passed explicitly into every pipeline entry point;
//! nothing in the workspace reads configuration from global state.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
