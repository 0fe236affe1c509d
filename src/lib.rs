//! # gramdex - Suffix array + 3-gram bucket index builder
//!
//! gramdex concatenates byte ranges from one or more files into a single
//! logical document and persists two arrays over it:
//!
//! 1. **Suffix array** - every document position, in lexicographic suffix order
//! 2. **Gram bucket table** - for each of the 2^24 possible 3-byte prefixes,
//!    the index of the first suffix starting with it
//!
//! A reader can jump straight to the suffix array slice for a query's first
//! three bytes and search only inside it.
//!
//! ## Architecture
//!
//! - [`config`] - JSON build configuration
//! - [`index`] - File list, assembly, gram table, writer and reader
//! - [`error`] - Error kinds and their exit codes
//! - [`utils`] - Progress bars and formatting
//!
//! ## Quick Start
//!
//! ```no_run
//! use gramdex::config::BuildConfig;
//! use gramdex::index::build_index;
//! use std::path::Path;
//!
//! let config = BuildConfig::load(Path::new("corpus.json")).unwrap();
//! let stats = build_index(&config, false).unwrap();
//! println!("{} bytes indexed", stats.total_length);
//! ```
//!
//! ## Limits
//!
//! Positions are stored as u32, so a document may hold at most
//! `0xFFFF_FFFF` bytes. Larger builds fail before any I/O.

pub mod config;
pub mod error;
pub mod index;
pub mod utils;

pub use error::{Error, Result};
