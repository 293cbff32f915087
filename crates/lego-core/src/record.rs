//! Per-skill metadata accumulated during a composition.

use serde::{Deserialize, Serialize};

use crate::skills::LicenseTag;

/// One included skill. Created once per identifier, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Directory name under `skills/`
    pub name: String,
    /// Canonical identifier the skill was fetched from
    pub source: String,
    /// Branch actually checked out (after any fallback)
    pub branch: String,
    /// Short commit hash
    pub commit: String,
    pub description: String,
    pub triggers: Vec<String>,
    pub license: LicenseTag,
}

impl SkillRecord {
    /// Path of the skill's instructions inside the composite.
    pub fn instructions_path(&self) -> String {
        format!("skills/{}/{}", self.name, crate::compose::INSTRUCTIONS_FILE)
    }
}
