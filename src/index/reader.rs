//! Index artifact reader
//!
//! Memory-maps a finished artifact and exposes its two arrays without
//! loading them. The artifact carries no header, so the document length
//! comes from the caller.

use super::assembler::LogicalBuffer;
use super::file_list::VirtualFileList;
use super::gram::{GramBucketTable, bucket_range};
use super::suffix_sort::{SuffixArrayFault, find_fault};
use super::types::*;
use crate::error::{Error, Result};
use memmap2::Mmap;
use std::fs::File;
use std::ops::Range;
use std::path::Path;

/// Read-only view of an index artifact
pub struct IndexReader {
    mmap: Mmap,
    n: usize,
}

impl IndexReader {
    /// Open the artifact for a document of `n` bytes
    ///
    /// Fails with `ArtifactMismatch` unless the file holds exactly
    /// `n + 2^24` entries.
    pub fn open(path: &Path, n: u64) -> Result<Self> {
        if n > MAX_TEXT_LEN {
            return Err(Error::SizeExceeded { total_length: n });
        }

        let file = File::open(path).map_err(|e| {
            Error::ArtifactMismatch(format!("cannot open {}: {}", path.display(), e))
        })?;
        let actual = file
            .metadata()
            .map_err(|e| Error::ArtifactMismatch(format!("cannot stat {}: {}", path.display(), e)))?
            .len();
        let expected = artifact_len(n);
        if actual != expected {
            return Err(Error::ArtifactMismatch(format!(
                "{} is {} bytes, expected {} for a {}-byte document",
                path.display(),
                actual,
                expected,
                n
            )));
        }

        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            Error::ArtifactMismatch(format!("cannot map {}: {}", path.display(), e))
        })?;

        Ok(Self {
            mmap,
            n: n as usize,
        })
    }

    #[inline]
    fn entry(&self, index: usize) -> Position {
        let at = index * ENTRY_SIZE;
        let bytes = &self.mmap[at..at + ENTRY_SIZE];
        Position::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Document length the artifact describes
    #[inline]
    pub fn text_len(&self) -> usize {
        self.n
    }

    /// Artifact size in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.mmap.len()
    }

    /// Suffix array entry `i`
    #[inline]
    pub fn suffix(&self, i: usize) -> Position {
        assert!(i < self.n, "suffix index {} out of range {}", i, self.n);
        self.entry(i)
    }

    /// All suffix array entries in order
    pub fn suffixes(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.n).map(move |i| self.entry(i))
    }

    /// First suffix array index for gram `g`
    #[inline]
    pub fn gram_start(&self, gram: Gram) -> Position {
        self.entry(self.n + (gram as usize & (GRAM_TABLE_SIZE - 1)))
    }

    /// Suffix array index range of suffixes beginning with gram `g`
    ///
    /// Reads the stored slots as they are; `gram_table` returns a checked copy.
    pub fn gram_range(&self, gram: Gram) -> Range<Position> {
        let g = gram as usize & (GRAM_TABLE_SIZE - 1);
        let start = self.gram_start(g as Gram);
        let end = if g + 1 < GRAM_TABLE_SIZE {
            self.gram_start(g as Gram + 1)
        } else {
            self.n as Position
        };
        start..end
    }

    /// Copy of the gram table
    pub fn gram_table(&self) -> Result<GramBucketTable> {
        let starts = (0..GRAM_TABLE_SIZE).map(|g| self.entry(self.n + g)).collect();
        GramBucketTable::from_starts(starts, self.n as Position)
    }

    /// Check the artifact against the document it was built from
    ///
    /// Confirms the suffix array is a sorted permutation, that every suffix
    /// lies inside the bucket of its own gram, and that the stored gram
    /// table matches one rebuilt from `buffer`. Failing positions are
    /// reported with the source that owns them.
    pub fn verify(&self, buffer: &LogicalBuffer, list: &VirtualFileList) -> Result<()> {
        if buffer.len() != self.n {
            return Err(Error::ArtifactMismatch(format!(
                "artifact indexes {} bytes, document has {}",
                self.n,
                buffer.len()
            )));
        }

        if let Some(fault) = find_fault(buffer.text(), self.suffixes()) {
            let detail = match fault {
                SuffixArrayFault::OutOfRange { .. } | SuffixArrayFault::Length { .. } => {
                    String::new()
                }
                SuffixArrayFault::Duplicate { position, .. } => describe(list, position as u64),
                SuffixArrayFault::Unsorted { index } => describe(list, self.entry(index) as u64),
            };
            return Err(Error::ArtifactMismatch(format!(
                "suffix array: {}{}",
                fault, detail
            )));
        }

        let rebuilt = GramBucketTable::build(buffer)?;
        for g in 0..GRAM_TABLE_SIZE {
            let stored = self.entry(self.n + g);
            let expected = rebuilt.starts()[g];
            if stored != expected {
                let [b0, b1, b2] = gram_bytes(g as Gram);
                return Err(Error::ArtifactMismatch(format!(
                    "gram table: slot {:06x} ({:?}) holds {}, expected {}",
                    g,
                    String::from_utf8_lossy(&[b0, b1, b2]),
                    stored,
                    expected
                )));
            }
        }

        // Sorted suffixes sit inside their own gram's bucket
        let padded = buffer.padded();
        let total = self.n as Position;
        for i in 0..self.n {
            let position = self.entry(i);
            let gram = gram_at(padded, position as usize);
            if !bucket_range(rebuilt.starts(), total, gram).contains(&(i as Position)) {
                return Err(Error::ArtifactMismatch(format!(
                    "suffix array entry {} (gram {:06x}) lies outside its bucket{}",
                    i,
                    gram,
                    describe(list, position as u64)
                )));
            }
        }

        Ok(())
    }
}

/// " at <source>+<local>" for a document position, if it resolves
fn describe(list: &VirtualFileList, position: u64) -> String {
    match list.resolve(position) {
        Some((source, local)) => format!(" at {}+{}", source.name, local),
        None => String::new(),
    }
}
