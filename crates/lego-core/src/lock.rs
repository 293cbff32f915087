//! Structured record of what a composite was built from.
//!
//! Stored at `.lego/sources.json` next to the human-readable SOURCES.md. The
//! updater prefers it over scraping identifiers out of the ledger prose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::record::SkillRecord;
use crate::skills::LicenseTag;

/// Current lock format version
const LOCK_VERSION: u32 = 1;

/// One locked skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedSkill {
    /// Identifier as passed to compose (canonical form)
    pub identifier: String,
    pub name: String,
    pub commit: String,
    pub license: LicenseTag,
}

/// The persisted lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesLock {
    pub version: u32,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub workflow: String,
    pub composed_at: DateTime<Utc>,
    pub skills: Vec<LockedSkill>,
}

impl SourcesLock {
    pub fn new(name: &str, description: &str, workflow: &str, records: &[SkillRecord]) -> Self {
        Self {
            version: LOCK_VERSION,
            name: name.to_string(),
            description: description.to_string(),
            workflow: workflow.to_string(),
            composed_at: Utc::now(),
            skills: records
                .iter()
                .map(|r| LockedSkill {
                    identifier: r.source.clone(),
                    name: r.name.clone(),
                    commit: r.commit.clone(),
                    license: r.license,
                })
                .collect(),
        }
    }

    /// Path of the lock inside a composite
    pub fn lock_path(composite_dir: &Path) -> PathBuf {
        composite_dir.join(".lego").join("sources.json")
    }

    /// Identifiers in composition order
    pub fn identifiers(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.identifier.clone()).collect()
    }

    /// Load the lock, or `None` if absent.
    ///
    /// A corrupted lock is reported and treated as absent so the ledger can
    /// still be used.
    pub fn load(composite_dir: &Path) -> Result<Option<Self>> {
        let path = Self::lock_path(composite_dir);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(lock) => Ok(Some(lock)),
            Err(e) => {
                warn!("Ignoring corrupted {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Save the lock into a composite
    pub fn save(&self, composite_dir: &Path) -> Result<()> {
        let path = Self::lock_path(composite_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::record;
    use tempfile::TempDir;

    #[test]
    fn test_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let records = vec![record("alpha", "", &[]), record("beta", "", &[])];
        let lock = SourcesLock::new("suite", "desc", "flow", &records);
        lock.save(temp_dir.path()).unwrap();

        let loaded = SourcesLock::load(temp_dir.path()).unwrap().unwrap();
        assert_eq!(loaded, lock);
        assert_eq!(
            loaded.identifiers(),
            vec!["github.com/acme/alpha", "github.com/acme/beta"]
        );
    }

    #[test]
    fn test_missing_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(SourcesLock::load(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupted_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = SourcesLock::lock_path(temp_dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not valid json").unwrap();

        assert!(SourcesLock::load(temp_dir.path()).unwrap().is_none());
    }
}
