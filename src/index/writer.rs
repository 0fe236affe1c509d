//! Index artifact writer
//!
//! The artifact is a flat run of little-endian u32 values: the `n` suffix
//! array entries, then the `2^24` gram bucket starts. It has no header, so
//! readers take `n` from the build config.

use super::gram::GramBucketTable;
use super::storage::SealingWrite;
use super::types::{ENTRY_SIZE, GRAM_TABLE_SIZE, Position};
use crate::error::{Error, Result};
use tracing::debug;

/// Entries encoded per write call
const ENTRIES_PER_WRITE: usize = 16 * 1024;

/// Serializes a built index to a destination
pub struct IndexWriter;

impl IndexWriter {
    /// Write the suffix array then the gram table, and seal the destination
    ///
    /// `destination` is only used to label errors.
    pub fn write(
        sink: &mut dyn SealingWrite,
        destination: &str,
        suffix_array: &[Position],
        grams: &GramBucketTable,
    ) -> Result<()> {
        if grams.starts().len() != GRAM_TABLE_SIZE {
            return Err(Error::InvalidInput(format!(
                "gram table has {} slots, expected {}",
                grams.starts().len(),
                GRAM_TABLE_SIZE
            )));
        }

        Self::write_array(sink, "suffix array", suffix_array)?;
        Self::write_array(sink, "gram table", grams.starts())?;

        sink.seal().map_err(|cause| Error::DestinationUnwritable {
            destination: destination.to_string(),
            cause,
        })?;

        debug!(
            destination,
            suffixes = suffix_array.len(),
            bytes = (suffix_array.len() + GRAM_TABLE_SIZE) * ENTRY_SIZE,
            "index sealed"
        );
        Ok(())
    }

    /// Write one array in fixed-size batches
    fn write_array(
        sink: &mut dyn SealingWrite,
        array: &'static str,
        values: &[Position],
    ) -> Result<()> {
        let mut buffer = Vec::with_capacity(ENTRIES_PER_WRITE * ENTRY_SIZE);
        let mut written = 0u64;

        for chunk in values.chunks(ENTRIES_PER_WRITE) {
            buffer.clear();
            for &value in chunk {
                buffer.extend_from_slice(&value.to_le_bytes());
            }
            sink.write_all(&buffer)
                .map_err(|cause| Error::WriteIncomplete {
                    array,
                    written,
                    expected: values.len() as u64,
                    cause,
                })?;
            written += chunk.len() as u64;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::assembler::LogicalBuffer;
    use crate::index::storage::MemorySink;

    fn decode(bytes: &[u8]) -> Vec<Position> {
        bytes
            .chunks_exact(ENTRY_SIZE)
            .map(|c| Position::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_layout() {
        let buffer = LogicalBuffer::from_text(b"banana").unwrap();
        let grams = GramBucketTable::build(&buffer).unwrap();
        let sa: Vec<Position> = vec![5, 3, 1, 0, 4, 2];

        let mut sink = MemorySink::new();
        IndexWriter::write(&mut sink, "mem", &sa, &grams).unwrap();

        assert!(sink.is_sealed());
        assert_eq!(sink.data().len(), (6 + GRAM_TABLE_SIZE) * ENTRY_SIZE);

        let values = decode(sink.data());
        assert_eq!(&values[..6], &sa[..]);
        assert_eq!(&values[6..], grams.starts());
        // Little-endian: 5 encodes as 05 00 00 00
        assert_eq!(&sink.data()[..4], &[5, 0, 0, 0]);
    }

    #[test]
    fn test_empty_suffix_array() {
        let grams = GramBucketTable::build(&LogicalBuffer::from_text(b"").unwrap()).unwrap();
        let mut sink = MemorySink::new();
        IndexWriter::write(&mut sink, "mem", &[], &grams).unwrap();
        assert_eq!(sink.data().len(), GRAM_TABLE_SIZE * ENTRY_SIZE);
    }

    #[test]
    fn test_short_write_in_gram_table() {
        let grams = GramBucketTable::build(&LogicalBuffer::from_text(b"abcd").unwrap()).unwrap();
        let sa: Vec<Position> = vec![0, 1, 2, 3];

        // Room for the suffix array and the first gram batch only
        let limit = (4 + ENTRIES_PER_WRITE) * ENTRY_SIZE;
        let mut sink = MemorySink::with_capacity_limit(limit);

        match IndexWriter::write(&mut sink, "mem", &sa, &grams).unwrap_err() {
            Error::WriteIncomplete {
                array,
                written,
                expected,
                ..
            } => {
                assert_eq!(array, "gram table");
                assert_eq!(written, ENTRIES_PER_WRITE as u64);
                assert_eq!(expected, GRAM_TABLE_SIZE as u64);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!sink.is_sealed());
    }

    #[test]
    fn test_short_write_in_suffix_array() {
        let grams = GramBucketTable::build(&LogicalBuffer::from_text(b"ab").unwrap()).unwrap();
        let mut sink = MemorySink::with_capacity_limit(4);

        let err = IndexWriter::write(&mut sink, "mem", &[1, 0], &grams).unwrap_err();
        assert!(matches!(
            err,
            Error::WriteIncomplete {
                array: "suffix array",
                written: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_seal_failure() {
        let grams = GramBucketTable::build(&LogicalBuffer::from_text(b"ab").unwrap()).unwrap();
        let mut sink = MemorySink::new();
        sink.seal().unwrap();

        // Writes to a sealed sink fail before seal is reached
        let err = IndexWriter::write(&mut sink, "mem", &[1, 0], &grams).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
