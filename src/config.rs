//! Build configuration
//!
//! A build is described by one JSON file naming the destination artifact and
//! the ordered list of byte ranges that make up the logical document:
//!
//! ```json
//! {
//!     "index_file": "corpus.idx",
//!     "raw_files": [
//!         { "name": "part-0000", "offset": 0, "length": 1048576 },
//!         { "name": "part-0001", "offset": 512, "length": 4096 }
//!     ]
//! }
//! ```
//!
//! Unknown keys are ignored.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One byte range contributing to the logical document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawFile {
    /// Source identifier, resolved by the storage backend
    pub name: String,
    /// Start of the range within the source
    pub offset: u64,
    /// Number of bytes taken from the source
    pub length: u64,
}

/// Parsed build configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Destination artifact
    pub index_file: PathBuf,

    /// Base directory for relative source names (defaults to the working directory)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Sources in concatenation order
    pub raw_files: Vec<RawFile>,
}

impl BuildConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            Error::ConfigUnreadable { reason, .. } => Error::ConfigUnreadable {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a config from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: BuildConfig = serde_json::from_str(content).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                Error::ConfigUnreadable {
                    path: PathBuf::new(),
                    reason: e.to_string(),
                }
            } else {
                // Missing fields, wrong types, negative numbers
                Error::ConfigInvalid(e.to_string())
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.index_file.as_os_str().is_empty() {
            return Err(Error::ConfigInvalid("index_file is empty".into()));
        }
        if self.raw_files.is_empty() {
            return Err(Error::ConfigInvalid("raw_files is empty".into()));
        }

        let mut total: u64 = 0;
        for (i, file) in self.raw_files.iter().enumerate() {
            if file.name.is_empty() {
                return Err(Error::ConfigInvalid(format!("raw_files[{}] has no name", i)));
            }
            if file.offset.checked_add(file.length).is_none() {
                return Err(Error::ConfigInvalid(format!(
                    "raw_files[{}] ({}): offset {} + length {} overflows",
                    i, file.name, file.offset, file.length
                )));
            }
            total = total.checked_add(file.length).ok_or_else(|| {
                Error::ConfigInvalid(format!("total length overflows at raw_files[{}]", i))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const VALID: &str = r#"{
        "index_file": "out.idx",
        "raw_files": [
            {"name": "a.txt", "offset": 0, "length": 10},
            {"name": "b.txt", "offset": 4, "length": 20}
        ]
    }"#;

    #[test]
    fn test_parse_valid() {
        let config = BuildConfig::from_json(VALID).unwrap();
        assert_eq!(config.index_file, PathBuf::from("out.idx"));
        assert_eq!(config.raw_files.len(), 2);
        assert_eq!(config.raw_files[1].offset, 4);
        assert_eq!(config.raw_files[1].length, 20);
        assert!(config.root.is_none());
    }

    #[test]
    fn test_legacy_keys_ignored() {
        let json = r#"{
            "hostname": "namenode",
            "port": 9000,
            "index_file": "/idx/out.idx",
            "raw_files": [{"name": "/data/a", "offset": 0, "length": 3}]
        }"#;
        let config = BuildConfig::from_json(json).unwrap();
        assert_eq!(config.raw_files[0].name, "/data/a");
    }

    #[test]
    fn test_missing_length_is_invalid() {
        let json = r#"{"index_file": "o", "raw_files": [{"name": "a", "offset": 0}]}"#;
        let err = BuildConfig::from_json(json).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)), "{:?}", err);
    }

    #[test]
    fn test_negative_offset_is_invalid() {
        let json = r#"{"index_file": "o", "raw_files": [{"name": "a", "offset": -1, "length": 2}]}"#;
        let err = BuildConfig::from_json(json).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_malformed_json_is_unreadable() {
        let err = BuildConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::ConfigUnreadable { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_empty_raw_files_rejected() {
        let err = BuildConfig::from_json(r#"{"index_file": "o", "raw_files": []}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_empty_index_file_rejected() {
        let json = r#"{"index_file": "", "raw_files": [{"name": "a", "offset": 0, "length": 1}]}"#;
        assert!(matches!(
            BuildConfig::from_json(json).unwrap_err(),
            Error::ConfigInvalid(_)
        ));
    }

    #[test]
    fn test_length_overflow_rejected() {
        let json = format!(
            r#"{{"index_file": "o", "raw_files": [
                {{"name": "a", "offset": 0, "length": {max}}},
                {{"name": "b", "offset": 0, "length": 1}}
            ]}}"#,
            max = u64::MAX
        );
        assert!(matches!(
            BuildConfig::from_json(&json).unwrap_err(),
            Error::ConfigInvalid(_)
        ));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[").unwrap();

        match BuildConfig::load(&path).unwrap_err() {
            Error::ConfigUnreadable { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = BuildConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigUnreadable { .. }));
    }
}
