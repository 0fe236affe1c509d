//! Virtual file list
//!
//! Presents an ordered list of byte ranges as one contiguous logical stream
//! and maps a global offset back to the range that owns it.

use crate::config::{BuildConfig, RawFile};
use crate::error::{Error, Result};
use std::cmp::Ordering;
use tracing::debug;

/// One byte range placed in the logical stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualSource {
    /// Source identifier passed to the storage backend
    pub name: String,
    /// Start of the range within the physical source
    pub physical_offset: u64,
    /// Number of bytes contributed
    pub length: u64,
    /// Start of the range within the logical stream
    pub virtual_offset: u64,
}

impl VirtualSource {
    /// End of this source in the logical stream (exclusive)
    #[inline]
    pub fn virtual_end(&self) -> u64 {
        self.virtual_offset + self.length
    }

    #[inline]
    fn contains(&self, offset: u64) -> bool {
        self.virtual_offset <= offset && offset < self.virtual_end()
    }
}

/// Ordered, gap-free list of sources forming one logical document
#[derive(Debug, Clone, Default)]
pub struct VirtualFileList {
    sources: Vec<VirtualSource>,
    total_length: u64,
}

impl VirtualFileList {
    /// Build the list from raw ranges in concatenation order
    ///
    /// Zero-length ranges contribute nothing and could never be resolved,
    /// so they are dropped here.
    pub fn new<'a, I>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a RawFile>,
    {
        let mut sources = Vec::new();
        let mut total_length: u64 = 0;

        for file in files {
            if file.length == 0 {
                debug!(name = %file.name, "skipping zero-length source");
                continue;
            }
            if file.offset.checked_add(file.length).is_none() {
                return Err(Error::ConfigInvalid(format!(
                    "{}: offset {} + length {} overflows",
                    file.name, file.offset, file.length
                )));
            }

            sources.push(VirtualSource {
                name: file.name.clone(),
                physical_offset: file.offset,
                length: file.length,
                virtual_offset: total_length,
            });
            total_length = total_length.checked_add(file.length).ok_or_else(|| {
                Error::ConfigInvalid(format!("total length overflows at {}", file.name))
            })?;
        }

        Ok(Self {
            sources,
            total_length,
        })
    }

    /// Build the list for a parsed config
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        Self::new(&config.raw_files)
    }

    /// Total length of the logical stream
    #[inline]
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Sources in concatenation order
    #[inline]
    pub fn sources(&self) -> &[VirtualSource] {
        &self.sources
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Find the source owning a global offset using binary search
    ///
    /// Returns the source and the offset local to its range, or `None` when
    /// the offset lies outside `[0, total_length)`.
    pub fn resolve(&self, offset: u64) -> Option<(&VirtualSource, u64)> {
        if offset >= self.total_length {
            return None;
        }

        // Half-open window so the bounds never step below zero
        let mut lo = 0usize;
        let mut hi = self.sources.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let source = &self.sources[mid];
            match locate(source, offset) {
                Ordering::Greater => hi = mid,
                Ordering::Less => lo = mid + 1,
                Ordering::Equal => return Some((source, offset - source.virtual_offset)),
            }
        }

        None
    }

    /// Check that every source sits where the running total says it should
    ///
    /// Spot-checks the resolver at both ends of each range as well.
    pub fn validate(&self) -> Result<()> {
        let mut expected: u64 = 0;
        for (i, source) in self.sources.iter().enumerate() {
            if source.length == 0 {
                return Err(Error::InvalidInput(format!(
                    "source {} ({}) has zero length",
                    i, source.name
                )));
            }
            if source.virtual_offset != expected {
                return Err(Error::InvalidInput(format!(
                    "source {} ({}) starts at {} but should start at {}",
                    i, source.name, source.virtual_offset, expected
                )));
            }
            expected = source.virtual_end();

            for probe in [source.virtual_offset, source.virtual_end() - 1] {
                match self.resolve(probe) {
                    Some((found, _)) if std::ptr::eq(found, source) => {}
                    _ => {
                        return Err(Error::InvalidInput(format!(
                            "offset {} does not resolve to source {} ({})",
                            probe, i, source.name
                        )));
                    }
                }
            }
        }

        if expected != self.total_length {
            return Err(Error::InvalidInput(format!(
                "sources cover {} bytes but total length is {}",
                expected, self.total_length
            )));
        }
        Ok(())
    }
}

/// Where `offset` lies relative to the source's range: `Greater` when the
/// source is past it, `Less` when before it
#[inline]
fn locate(source: &VirtualSource, offset: u64) -> Ordering {
    if offset < source.virtual_offset {
        Ordering::Greater
    } else if source.contains(offset) {
        Ordering::Equal
    } else {
        Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, offset: u64, length: u64) -> RawFile {
        RawFile {
            name: name.to_string(),
            offset,
            length,
        }
    }

    #[test]
    fn test_two_sources() {
        let files = vec![raw("a", 0, 10), raw("b", 100, 20)];
        let list = VirtualFileList::new(&files).unwrap();

        assert_eq!(list.total_length(), 30);
        assert_eq!(list.sources()[0].virtual_offset, 0);
        assert_eq!(list.sources()[1].virtual_offset, 10);

        let (source, local) = list.resolve(15).unwrap();
        assert_eq!(source.name, "b");
        assert_eq!(local, 5);
    }

    #[test]
    fn test_resolve_every_offset() {
        let files = vec![
            raw("a", 0, 1),
            raw("b", 7, 4),
            raw("c", 0, 9),
            raw("d", 3, 2),
            raw("e", 0, 13),
        ];
        let list = VirtualFileList::new(&files).unwrap();

        for offset in 0..list.total_length() {
            let (source, local) = list.resolve(offset).unwrap();
            assert!(source.virtual_offset <= offset && offset < source.virtual_end());
            assert_eq!(local, offset - source.virtual_offset);
        }
        assert!(list.resolve(list.total_length()).is_none());
        assert!(list.resolve(u64::MAX).is_none());
    }

    #[test]
    fn test_resolve_boundaries() {
        let files = vec![raw("a", 0, 10), raw("b", 0, 20)];
        let list = VirtualFileList::new(&files).unwrap();

        assert_eq!(list.resolve(9).unwrap().0.name, "a");
        assert_eq!(list.resolve(10).unwrap().0.name, "b");
        assert_eq!(list.resolve(10).unwrap().1, 0);
        assert_eq!(list.resolve(29).unwrap().1, 19);
    }

    #[test]
    fn test_empty_list() {
        let list = VirtualFileList::new(&Vec::<RawFile>::new()).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.total_length(), 0);
        assert!(list.resolve(0).is_none());
        list.validate().unwrap();
    }

    #[test]
    fn test_zero_length_sources_dropped() {
        let files = vec![raw("a", 0, 0), raw("b", 0, 5), raw("c", 0, 0), raw("d", 0, 5)];
        let list = VirtualFileList::new(&files).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.sources()[1].name, "d");
        assert_eq!(list.sources()[1].virtual_offset, 5);
        assert_eq!(list.resolve(5).unwrap().0.name, "d");
        list.validate().unwrap();
    }

    #[test]
    fn test_single_source() {
        let files = vec![raw("only", 42, 3)];
        let list = VirtualFileList::new(&files).unwrap();
        assert_eq!(list.resolve(0).unwrap().1, 0);
        assert_eq!(list.resolve(2).unwrap().1, 2);
        assert!(list.resolve(3).is_none());
    }

    #[test]
    fn test_large_offsets() {
        let files = vec![raw("a", 0, 3 << 30), raw("b", 0, 3 << 30)];
        let list = VirtualFileList::new(&files).unwrap();
        assert_eq!(list.total_length(), 6 << 30);

        let (source, local) = list.resolve((3 << 30) + 17).unwrap();
        assert_eq!(source.name, "b");
        assert_eq!(local, 17);
    }

    #[test]
    fn test_total_overflow_rejected() {
        let files = vec![raw("a", 0, u64::MAX), raw("b", 0, 1)];
        assert!(matches!(
            VirtualFileList::new(&files).unwrap_err(),
            Error::ConfigInvalid(_)
        ));
    }

    #[test]
    fn test_validate() {
        let files = vec![raw("a", 0, 3), raw("b", 0, 4), raw("c", 0, 5)];
        let list = VirtualFileList::new(&files).unwrap();
        list.validate().unwrap();
    }
}
