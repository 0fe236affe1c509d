use crate::config::BuildConfig;
use crate::index::file_list::VirtualFileList;
use crate::index::reader::IndexReader;
use crate::index::types::{GRAM_TABLE_SIZE, Gram};
use crate::utils::{format_gram, format_size};
use anyhow::{Context, Result};

/// Display statistics for the artifact a config describes
pub fn show_stats(config: &BuildConfig) -> Result<()> {
    let list = VirtualFileList::from_config(config)?;
    let reader = IndexReader::open(&config.index_file, list.total_length())
        .with_context(|| format!("Failed to open {}", config.index_file.display()))?;
    let grams = reader.gram_table()?;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Index file:       {}", config.index_file.display());
    println!("Index size:       {}", format_size(reader.byte_len() as u64));
    println!("Sources:          {}", list.len());
    println!(
        "Document length:  {} ({})",
        list.total_length(),
        format_size(list.total_length())
    );
    println!(
        "Populated grams:  {} of {}",
        grams.populated(),
        GRAM_TABLE_SIZE
    );

    if let Some((gram, width)) = grams.widest() {
        println!("Widest bucket:    {} with {} suffixes", format_gram(gram), width);
    }

    println!();
    println!("Sources:");
    for source in list.sources().iter().take(15) {
        println!(
            "  {:>12} +{:<10} {} @ {}",
            source.virtual_offset, source.length, source.name, source.physical_offset
        );
    }
    if list.len() > 15 {
        println!("  ... and {} more", list.len() - 15);
    }

    Ok(())
}

/// Print which source owns a global document offset
pub fn show_location(config: &BuildConfig, offset: u64) -> Result<()> {
    let list = VirtualFileList::from_config(config)?;
    let (source, local) = list.resolve(offset).with_context(|| {
        format!(
            "Offset {} is outside the document (length {})",
            offset,
            list.total_length()
        )
    })?;

    println!(
        "{} -> {} at {} (physical {})",
        offset,
        source.name,
        local,
        source.physical_offset + local
    );
    Ok(())
}

/// Bucket summary line for one gram, used by `stats --gram`
pub fn show_gram(config: &BuildConfig, gram: Gram) -> Result<()> {
    let list = VirtualFileList::from_config(config)?;
    let reader = IndexReader::open(&config.index_file, list.total_length())?;
    // A checked table keeps every bucket inside the suffix array
    let range = reader.gram_table()?.bucket(gram);

    println!(
        "{}: suffixes {}..{} ({} positions)",
        format_gram(gram),
        range.start,
        range.end,
        range.end - range.start
    );
    for i in range.clone().take(10) {
        let position = reader.suffix(i as usize) as u64;
        if let Some((source, local)) = list.resolve(position) {
            println!("  {:>12}  {}+{}", position, source.name, local);
        }
    }
    if range.end - range.start > 10 {
        println!("  ...");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawFile;
    use crate::index::build::build_index;
    use crate::index::types::{ENTRY_SIZE, gram_of};
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn banana_index() -> (TempDir, BuildConfig) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), b"banana").unwrap();
        let config = BuildConfig {
            index_file: dir.path().join("banana.idx"),
            root: Some(dir.path().to_path_buf()),
            raw_files: vec![RawFile {
                name: "doc.txt".into(),
                offset: 0,
                length: 6,
            }],
        };
        build_index(&config, false).unwrap();
        (dir, config)
    }

    /// Overwrite gram slot `gram` of a 6-byte document's artifact
    fn set_slot(config: &BuildConfig, gram: Gram, value: u32) {
        let mut bytes = fs::read(&config.index_file).unwrap();
        let at = (6 + gram as usize) * ENTRY_SIZE;
        bytes[at..at + ENTRY_SIZE].copy_from_slice(&value.to_le_bytes());
        fs::write(&config.index_file, &bytes).unwrap();
    }

    #[test]
    fn test_reports_on_valid_index() {
        let (_dir, config) = banana_index();
        show_stats(&config).unwrap();
        show_gram(&config, gram_of(b'a', b'n', b'a')).unwrap();
        show_location(&config, 5).unwrap();
    }

    #[test]
    fn test_decreasing_slot_is_an_error() {
        let (_dir, config) = banana_index();
        let ana = gram_of(b'a', b'n', b'a');
        // Its successor slot holds 3
        set_slot(&config, ana, 5);

        let err = show_stats(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::Error>(),
            Some(crate::Error::ArtifactMismatch(_))
        ));
        assert!(show_gram(&config, ana).is_err());
    }

    #[test]
    fn test_slot_past_document_is_an_error() {
        let (_dir, config) = banana_index();
        set_slot(&config, (GRAM_TABLE_SIZE - 1) as Gram, 40);

        let err = show_gram(&config, (GRAM_TABLE_SIZE - 1) as Gram).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::Error>(),
            Some(crate::Error::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn test_location_outside_document() {
        let (_dir, config) = banana_index();
        assert!(show_location(&config, 6).is_err());
    }
}
