use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::index::assembler::{LogicalBuffer, StreamAssembler};
use crate::index::file_list::VirtualFileList;
use crate::index::gram::GramBucketTable;
use crate::index::reader::IndexReader;
use crate::index::storage::{FileSink, LocalStorage, RangeRead, SealingWrite};
use crate::index::suffix_sort::{PrefixDoublingProvider, SuffixArrayProvider};
use crate::index::types::{MAX_TEXT_LEN, Position};
use crate::index::writer::IndexWriter;
use crate::utils::progress::{bytes_bar, spinner};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// In-memory result of a build, before it is written
pub struct BuiltIndex {
    pub text: LogicalBuffer,
    pub suffix_array: Vec<Position>,
    pub grams: GramBucketTable,
}

/// Summary of a completed build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStats {
    /// Non-empty sources concatenated
    pub sources: usize,
    /// Logical document length
    pub total_length: u64,
    /// Grams with at least one position
    pub populated_grams: usize,
    pub elapsed: Duration,
}

/// Assembles a document and computes both index arrays
pub struct IndexBuilder<'a> {
    reader: &'a dyn RangeRead,
    provider: &'a dyn SuffixArrayProvider,
    silent: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(reader: &'a dyn RangeRead, provider: &'a dyn SuffixArrayProvider) -> Self {
        Self {
            reader,
            provider,
            silent: true,
        }
    }

    /// Show progress bars on the terminal
    pub fn with_progress(mut self, show: bool) -> Self {
        self.silent = !show;
        self
    }

    /// Read every source and build the suffix array and gram table
    ///
    /// Oversized documents are rejected before any source is read.
    pub fn build(&self, list: &VirtualFileList) -> Result<BuiltIndex> {
        let total = list.total_length();
        if total > MAX_TEXT_LEN {
            return Err(Error::SizeExceeded {
                total_length: total,
            });
        }
        list.validate()?;
        if total == 0 {
            warn!("document is empty, index will hold only the gram table");
        }

        // Phase 1: read sources
        let progress_bar = (!self.silent).then(|| bytes_bar(total, "Reading sources..."));

        let mut assembler = StreamAssembler::new(self.reader);
        if let Some(ref pb) = progress_bar {
            assembler = assembler.with_progress(pb.clone());
        }
        let text = assembler.assemble(list)?;

        if let Some(pb) = progress_bar {
            pb.finish_with_message(format!("Read {} sources", list.len()));
        }

        // Phase 2: suffix array and gram table share only the read-only text
        let sort_spinner = (!self.silent).then(|| spinner("Sorting suffixes..."));

        let provider = self.provider;
        let (suffix_array, grams) = rayon::join(
            || provider.build(text.text()),
            || GramBucketTable::build(&text),
        );
        let suffix_array = suffix_array?;
        let grams = grams?;

        if let Some(sorting) = sort_spinner {
            sorting.finish_with_message("Suffixes sorted");
        }

        if suffix_array.len() != text.len() {
            return Err(Error::InvalidInput(format!(
                "suffix array has {} entries for a {}-byte document",
                suffix_array.len(),
                text.len()
            )));
        }

        Ok(BuiltIndex {
            text,
            suffix_array,
            grams,
        })
    }
}

/// Build an index and write it to `sink`
///
/// The sink is only touched after the whole index is computed, so a
/// failed build performs no writes at all.
pub fn build_into(
    list: &VirtualFileList,
    reader: &dyn RangeRead,
    provider: &dyn SuffixArrayProvider,
    sink: &mut dyn SealingWrite,
    destination: &str,
) -> Result<BuildStats> {
    let start = Instant::now();
    let built = IndexBuilder::new(reader, provider).build(list)?;
    IndexWriter::write(sink, destination, &built.suffix_array, &built.grams)?;
    Ok(stats_for(list, &built, start.elapsed()))
}

fn stats_for(list: &VirtualFileList, built: &BuiltIndex, elapsed: Duration) -> BuildStats {
    BuildStats {
        sources: list.len(),
        total_length: list.total_length(),
        populated_grams: built.grams.populated(),
        elapsed,
    }
}

/// Build the index a config describes, reading and writing the local filesystem
pub fn build_index(config: &BuildConfig, show_progress: bool) -> Result<BuildStats> {
    let start = Instant::now();
    let list = VirtualFileList::from_config(config)?;
    let total = list.total_length();

    info!(
        sources = list.len(),
        total_length = total,
        index_file = %config.index_file.display(),
        "building index"
    );

    // The builder rejects oversized documents before any read, and the
    // destination is only created once the index is complete
    let storage = LocalStorage::new(config.root.clone());
    let built = IndexBuilder::new(&storage, &PrefixDoublingProvider)
        .with_progress(show_progress)
        .build(&list)?;

    let destination = config.index_file.display().to_string();
    let mut sink = FileSink::create(&config.index_file).map_err(|cause| {
        Error::DestinationUnwritable {
            destination: destination.clone(),
            cause,
        }
    })?;
    IndexWriter::write(&mut sink, &destination, &built.suffix_array, &built.grams)?;

    let stats = stats_for(&list, &built, start.elapsed());
    info!(
        total_length = stats.total_length,
        populated_grams = stats.populated_grams,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "index written"
    );
    Ok(stats)
}

/// Rebuild the document a config describes and check its artifact
pub fn verify_index(config: &BuildConfig, show_progress: bool) -> Result<BuildStats> {
    let start = Instant::now();
    let list = VirtualFileList::from_config(config)?;
    let total = list.total_length();

    let reader = IndexReader::open(&config.index_file, total)?;
    let storage = LocalStorage::new(config.root.clone());

    let mut assembler = StreamAssembler::new(&storage);
    if show_progress {
        assembler = assembler.with_progress(bytes_bar(total, "Reading sources..."));
    }
    let text = assembler.assemble(&list)?;
    reader.verify(&text, &list)?;

    let grams = reader.gram_table()?;
    info!(
        total_length = total,
        index_file = %config.index_file.display(),
        "index verified"
    );
    Ok(BuildStats {
        sources: list.len(),
        total_length: total,
        populated_grams: grams.populated(),
        elapsed: start.elapsed(),
    })
}
