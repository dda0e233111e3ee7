//! CLI command implementations

pub mod categories;
pub mod inspect;
pub mod publish;
pub mod search;
pub mod weather;
