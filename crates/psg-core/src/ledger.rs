//! Usage ledger of converted subjects (`slf_usage.json`).
//!
//! Maps each converted subject id to its downstream processing flags. The
//! converter only adds ids with `analysed: false`; flags written by other
//! tools are preserved.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, Result};

/// File name of the ledger inside the log directory.
pub const LEDGER_FILE_NAME: &str = "slf_usage.json";

/// Processing flags of one converted subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    #[serde(default)]
    pub analysed: bool,
    /// Flags owned by other tools.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageLedger {
    entries: BTreeMap<String, UsageEntry>,
}

impl UsageLedger {
    /// Loads the ledger; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CoreError::Io {
                    operation: "read",
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        let ledger: Self =
            serde_json::from_slice(&bytes).map_err(|source| CoreError::LedgerFormat {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), subjects = ledger.len(), "loaded usage ledger");
        Ok(ledger)
    }

    /// Writes the ledger through a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut bytes =
            serde_json::to_vec_pretty(self).map_err(|source| CoreError::LedgerFormat {
                path: path.to_path_buf(),
                source,
            })?;
        bytes.push(b'\n');

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoreError::Io {
                operation: "create directory",
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(|e| CoreError::Io {
            operation: "create",
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(&bytes).map_err(|e| CoreError::Io {
            operation: "write",
            path: temp_path.clone(),
            source: e,
        })?;
        file.sync_all().map_err(|e| CoreError::Io {
            operation: "sync",
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, path).map_err(|e| CoreError::AtomicWriteFailed {
            temp_path: temp_path.clone(),
            target_path: path.to_path_buf(),
            source: e,
        })?;

        info!(path = %path.display(), subjects = self.len(), "saved usage ledger");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, subject_id: &str) -> bool {
        self.entries.contains_key(subject_id)
    }

    pub fn get(&self, subject_id: &str) -> Option<&UsageEntry> {
        self.entries.get(subject_id)
    }

    /// Adds `subject_id` unless already known. Returns whether it was new.
    pub fn record(&mut self, subject_id: &str) -> bool {
        if self.entries.contains_key(subject_id) {
            return false;
        }
        self.entries
            .insert(subject_id.to_string(), UsageEntry::default());
        true
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = UsageLedger::load(&dir.path().join(LEDGER_FILE_NAME)).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn existing_flags_survive_a_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join(LEDGER_FILE_NAME);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"PA1_V1_FE1": {"analysed": true, "abosa": true}}"#,
        )
        .unwrap();

        let mut ledger = UsageLedger::load(&path).unwrap();
        assert!(!ledger.record("PA1_V1_FE1"));
        assert!(ledger.record("PA2_V1_FE4"));
        ledger.save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["PA1_V1_FE1"]["analysed"], true);
        assert_eq!(json["PA1_V1_FE1"]["abosa"], true);
        assert_eq!(json["PA2_V1_FE4"]["analysed"], false);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_ledger_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE_NAME);
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            UsageLedger::load(&path),
            Err(CoreError::LedgerFormat { .. })
        ));
    }
}
