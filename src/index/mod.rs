//! Index construction and reading
//!
//! ## Pipeline
//!
//! - `file_list`: ordered byte ranges forming one logical document
//! - `assembler`: reads the ranges into one zero-padded buffer
//! - `suffix_sort`: suffix array construction behind `SuffixArrayProvider`
//! - `gram`: 3-gram bucket table over the same buffer
//! - `writer`: persists both arrays
//! - `reader`: memory-mapped access to a finished artifact
//! - `build`: ties the stages together
//!
//! ## File Format
//!
//! One flat file of little-endian u32: `n` suffix array entries followed by
//! `2^24` gram bucket starts. No header.

pub mod assembler;
pub mod build;
pub mod file_list;
pub mod gram;
pub mod reader;
pub mod stats;
pub mod storage;
pub mod suffix_sort;
pub mod types;
pub mod writer;

pub use assembler::{LogicalBuffer, StreamAssembler};
pub use build::{BuildStats, BuiltIndex, IndexBuilder, build_index, build_into, verify_index};
pub use file_list::{VirtualFileList, VirtualSource};
pub use gram::{GramBucketTable, compute_gram_starts};
pub use reader::IndexReader;
pub use storage::{FileSink, LocalStorage, MemorySink, MemoryStorage, RangeRead, SealingWrite};
pub use suffix_sort::{PrefixDoublingProvider, SuffixArrayProvider};
pub use types::*;
pub use writer::IndexWriter;
