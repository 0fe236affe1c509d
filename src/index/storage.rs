//! Storage seams
//!
//! - `RangeRead`: fetch a byte range from a named source.
//! - `SealingWrite`: append-only destination with an explicit `seal()` that
//!   flushes, commits and releases the destination.
//!
//! Local filesystem and in-memory implementations are provided.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Positional reads from named sources
pub trait RangeRead: Send + Sync {
    /// Read up to `buf.len()` bytes of `name` starting at `offset`.
    ///
    /// Returns the number of bytes placed in `buf`. Fewer than `buf.len()`
    /// means the source ended first.
    fn read_at(&self, name: &str, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

/// Append-only destination for the index artifact
pub trait SealingWrite {
    /// Append the whole buffer or fail
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush and commit everything written so far; no writes may follow
    fn seal(&mut self) -> io::Result<()>;
}

/// Fill `buf` from a reader, stopping early only at end of input
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Sources read from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    root: Option<PathBuf>,
}

impl LocalStorage {
    /// Relative source names resolve against `root`, or the working directory if unset
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Path a source name refers to
    pub fn path_of(&self, name: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(name),
            None => PathBuf::from(name),
        }
    }
}

impl RangeRead for LocalStorage {
    fn read_at(&self, name: &str, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = File::open(self.path_of(name))?;
        file.seek(SeekFrom::Start(offset))?;
        read_full(&mut file, buf)
    }
}

/// Index artifact on the local filesystem
///
/// Bytes go to `<path>.partial` and are renamed onto `path` by `seal()`.
/// A sink dropped before sealing, or whose seal fails, removes its partial
/// file, so `path` only ever holds a complete artifact.
pub struct FileSink {
    path: PathBuf,
    partial_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Open the partial file for writing, truncating any leftover
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut partial = path.as_os_str().to_owned();
        partial.push(".partial");
        let partial_path = PathBuf::from(partial);

        let file = File::create(&partial_path)?;
        Ok(Self {
            path: path.to_path_buf(),
            partial_path,
            writer: Some(BufWriter::with_capacity(65536, file)),
        })
    }
}

impl SealingWrite for FileSink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(buf),
            None => Err(io::Error::other("index file already sealed")),
        }
    }

    fn seal(&mut self) -> io::Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("index file already sealed"))?;
        let committed = commit(writer, &self.partial_path, &self.path);
        if committed.is_err() {
            let _ = fs::remove_file(&self.partial_path);
        }
        committed
    }
}

/// Flush and sync the partial file, then move it onto `path`
fn commit(mut writer: BufWriter<File>, partial_path: &Path, path: &Path) -> io::Result<()> {
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);
    fs::rename(partial_path, path)
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            drop(writer);
            let _ = fs::remove_file(&self.partial_path);
        }
    }
}

/// In-memory sources keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    sources: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a source
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.sources.insert(name.into(), data.into());
    }

    /// Builder-style `insert`
    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }
}

impl RangeRead for MemoryStorage {
    fn read_at(&self, name: &str, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.sources.get(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such source: {}", name))
        })?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let available = &data[start..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        Ok(count)
    }
}

/// In-memory destination that records every write
#[derive(Debug, Default)]
pub struct MemorySink {
    data: Vec<u8>,
    writes: usize,
    sealed: bool,
    capacity: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that fails any write taking it past `bytes`
    pub fn with_capacity_limit(bytes: usize) -> Self {
        Self {
            capacity: Some(bytes),
            ..Self::default()
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of `write_all` calls received, successful or not
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

impl SealingWrite for MemorySink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writes += 1;
        if self.sealed {
            return Err(io::Error::other("sink already sealed"));
        }
        if let Some(limit) = self.capacity {
            if self.data.len() + buf.len() > limit {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "sink full"));
            }
        }
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> io::Result<()> {
        if self.sealed {
            return Err(io::Error::other("sink already sealed"));
        }
        self.sealed = true;
        Ok(())
    }
}
