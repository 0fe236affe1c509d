//! Utility functions shared by the library and the CLI.
//!
//! ## Modules
//!
//! - [`format`] - Size and gram rendering for status output
//! - [`progress`] - Progress bars (no-op without the `progress` feature)

pub mod format;
pub mod progress;

pub use format::*;
