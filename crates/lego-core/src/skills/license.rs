//! License family detection by keyword matching.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Files checked, in order. Only the first one found is read.
const LICENSE_FILES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE.txt"];

/// Coarse license family of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseTag {
    #[serde(rename = "MIT")]
    Mit,
    #[serde(rename = "Apache-2.0")]
    Apache2,
    #[serde(rename = "GPL")]
    Gpl,
    #[serde(rename = "BSD")]
    Bsd,
    Unknown,
}

/// Keyword (lower case) for each family, highest priority first.
const KEYWORDS: &[(&str, LicenseTag)] = &[
    ("mit", LicenseTag::Mit),
    ("apache", LicenseTag::Apache2),
    ("gpl", LicenseTag::Gpl),
    ("bsd", LicenseTag::Bsd),
];

impl LicenseTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseTag::Mit => "MIT",
            LicenseTag::Apache2 => "Apache-2.0",
            LicenseTag::Gpl => "GPL",
            LicenseTag::Bsd => "BSD",
            LicenseTag::Unknown => "Unknown",
        }
    }

    /// Classify license text.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, tag)| *tag)
            .unwrap_or(LicenseTag::Unknown)
    }
}

impl fmt::Display for LicenseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the license of a skill directory from its first license file.
pub fn detect_license(skill_dir: &Path) -> LicenseTag {
    for name in LICENSE_FILES {
        let path = skill_dir.join(name);
        if !path.is_file() {
            continue;
        }
        let tag = match std::fs::read(&path) {
            Ok(bytes) => LicenseTag::classify(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!("Failed to read {}: {}", path.display(), e);
                LicenseTag::Unknown
            }
        };
        debug!("License of {}: {} (from {})", skill_dir.display(), tag, name);
        return tag;
    }
    LicenseTag::Unknown
}
