//! Logical stream assembly
//!
//! Reads every source of a `VirtualFileList` in order into one contiguous
//! buffer and zero-fills the padding behind it.

use super::file_list::VirtualFileList;
use super::storage::RangeRead;
use super::types::{MAX_TEXT_LEN, PAD};
use crate::error::{Error, Result};
use crate::utils::progress::ProgressBar;
use tracing::debug;

/// The assembled document followed by `PAD` zero bytes
#[derive(Debug, Clone)]
pub struct LogicalBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl LogicalBuffer {
    /// Wrap document bytes, appending the zero padding
    pub fn from_text(text: &[u8]) -> Result<Self> {
        if text.len() as u64 > MAX_TEXT_LEN {
            return Err(Error::SizeExceeded {
                total_length: text.len() as u64,
            });
        }
        let mut bytes = alloc_text(text.len())?;
        bytes.extend_from_slice(text);
        bytes.extend_from_slice(&[0u8; PAD]);
        Ok(Self {
            bytes,
            len: text.len(),
        })
    }

    /// Document length `n`, excluding padding
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Document bytes `[0, n)`
    #[inline]
    pub fn text(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Document bytes plus the zero padding
    #[inline]
    pub fn padded(&self) -> &[u8] {
        &self.bytes
    }
}

/// Reserve room for `len` document bytes plus padding
fn alloc_text(len: usize) -> Result<Vec<u8>> {
    let total = len.checked_add(PAD).ok_or(Error::AllocationFailed {
        what: "text buffer",
        bytes: len as u64,
    })?;
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(total)
        .map_err(|_| Error::AllocationFailed {
            what: "text buffer",
            bytes: total as u64,
        })?;
    Ok(bytes)
}

/// Copies sources into a `LogicalBuffer`
pub struct StreamAssembler<'a> {
    reader: &'a dyn RangeRead,
    progress: Option<ProgressBar>,
}

impl<'a> StreamAssembler<'a> {
    pub fn new(reader: &'a dyn RangeRead) -> Self {
        Self {
            reader,
            progress: None,
        }
    }

    /// Advance `progress` by each source's length as it is read
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Read the whole document described by `list`
    ///
    /// Any source that yields fewer than its `length` bytes aborts the
    /// assembly with `SourceUnreadable`.
    pub fn assemble(&self, list: &VirtualFileList) -> Result<LogicalBuffer> {
        let total = list.total_length();
        if total > MAX_TEXT_LEN {
            return Err(Error::SizeExceeded {
                total_length: total,
            });
        }
        let n = usize::try_from(total).map_err(|_| Error::AllocationFailed {
            what: "text buffer",
            bytes: total,
        })?;

        let mut bytes = alloc_text(n)?;
        bytes.resize(n, 0);

        let mut cursor = 0usize;
        for source in list.sources() {
            // Lengths sum to n, which fits usize
            let length = source.length as usize;
            let dest = &mut bytes[cursor..cursor + length];

            let read = self
                .reader
                .read_at(&source.name, source.physical_offset, dest)
                .map_err(|e| Error::SourceUnreadable {
                    source_name: source.name.clone(),
                    offset: source.physical_offset,
                    length: source.length,
                    read: 0,
                    cause: Some(e),
                })?;
            if read != length {
                return Err(Error::SourceUnreadable {
                    source_name: source.name.clone(),
                    offset: source.physical_offset,
                    length: source.length,
                    read: read as u64,
                    cause: None,
                });
            }

            debug!(
                name = %source.name,
                offset = source.physical_offset,
                length = source.length,
                virtual_offset = source.virtual_offset,
                "source read"
            );
            if let Some(ref pb) = self.progress {
                pb.inc(source.length);
            }
            cursor += length;
        }

        // The gram indexer reads up to two bytes past the last position
        bytes.extend_from_slice(&[0u8; PAD]);

        Ok(LogicalBuffer { bytes, len: n })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawFile;
    use crate::index::storage::MemoryStorage;

    fn raw(name: &str, offset: u64, length: u64) -> RawFile {
        RawFile {
            name: name.to_string(),
            offset,
            length,
        }
    }

    #[test]
    fn test_assemble_in_order() {
        let storage = MemoryStorage::new()
            .with("a", b"xxhello".to_vec())
            .with("b", b" world!!".to_vec());
        let files = vec![raw("a", 2, 5), raw("b", 0, 6)];
        let list = VirtualFileList::new(&files).unwrap();

        let buffer = StreamAssembler::new(&storage).assemble(&list).unwrap();
        assert_eq!(buffer.len(), 11);
        assert_eq!(buffer.text(), b"hello world");
        assert_eq!(buffer.padded().len(), 11 + PAD);
        assert!(buffer.padded()[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_same_source_twice() {
        let storage = MemoryStorage::new().with("a", b"abcdef".to_vec());
        let files = vec![raw("a", 3, 3), raw("a", 0, 3)];
        let list = VirtualFileList::new(&files).unwrap();

        let buffer = StreamAssembler::new(&storage).assemble(&list).unwrap();
        assert_eq!(buffer.text(), b"defabc");
    }

    #[test]
    fn test_short_read_fails() {
        let storage = MemoryStorage::new()
            .with("a", b"abc".to_vec())
            .with("b", b"short".to_vec());
        let files = vec![raw("a", 0, 3), raw("b", 2, 10)];
        let list = VirtualFileList::new(&files).unwrap();

        match StreamAssembler::new(&storage).assemble(&list).unwrap_err() {
            Error::SourceUnreadable {
                source_name,
                offset,
                length,
                read,
                cause,
            } => {
                assert_eq!(source_name, "b");
                assert_eq!(offset, 2);
                assert_eq!(length, 10);
                assert_eq!(read, 3);
                assert!(cause.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_source_fails() {
        let storage = MemoryStorage::new();
        let files = vec![raw("gone", 0, 1)];
        let list = VirtualFileList::new(&files).unwrap();

        let err = StreamAssembler::new(&storage).assemble(&list).unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable { cause: Some(_), .. }));
    }

    #[test]
    fn test_oversized_document_rejected_before_reading() {
        // Nothing backs these sources: the size check must come first
        let storage = MemoryStorage::new();
        let files = vec![raw("a", 0, 1 << 31), raw("b", 0, 1 << 31)];
        let list = VirtualFileList::new(&files).unwrap();
        assert_eq!(list.total_length(), 0x1_0000_0000);

        let err = StreamAssembler::new(&storage).assemble(&list).unwrap_err();
        assert!(matches!(err, Error::SizeExceeded { total_length: 0x1_0000_0000 }));
    }

    #[test]
    fn test_empty_document() {
        let storage = MemoryStorage::new();
        let list = VirtualFileList::new(&Vec::<RawFile>::new()).unwrap();
        let buffer = StreamAssembler::new(&storage).assemble(&list).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.padded(), &[0u8; PAD]);
    }

    #[test]
    fn test_from_text() {
        let buffer = LogicalBuffer::from_text(b"banana").unwrap();
        assert_eq!(buffer.text(), b"banana");
        assert_eq!(&buffer.padded()[6..], &[0u8; PAD]);
    }
}
