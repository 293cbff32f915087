//! Skill location identifiers, e.g. `github.com/acme/tools/tree/dev@pdf`.
//!
//! Accepted forms (protocol and host are optional):
//! - `owner/repo`
//! - `owner/repo@skill` (skill lives in `skills/skill/`)
//! - `owner/repo/tree/branch`
//! - `owner/repo/tree/branch@skill`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LegoError, Result};

/// Forge every identifier is hosted on
pub const FORGE_HOST: &str = "github.com";

/// Branch used when the identifier names none
pub const DEFAULT_BRANCH: &str = "main";

/// Directory that holds nested skills inside a repository
const NESTED_SKILLS_DIR: &str = "skills";

/// A parsed skill location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillIdentifier {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// `skills/<name>` when a nested skill was selected with `@name`
    pub sub_path: Option<String>,
}

impl SkillIdentifier {
    /// Parse a free-form identifier. Purely lexical, no network access.
    pub fn resolve(raw: &str) -> Result<Self> {
        let mut rest = raw.trim();

        if let Some(stripped) = rest.strip_prefix("https://") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("http://") {
            rest = stripped;
        }
        if let Some(stripped) = rest.strip_prefix(FORGE_HOST).and_then(|r| r.strip_prefix('/')) {
            rest = stripped;
        }

        let sub_path = match rest.rsplit_once('@') {
            Some((left, skill)) => {
                let skill = skill.trim_matches('/');
                if skill.is_empty() {
                    return Err(LegoError::resolution(raw, "empty skill name after '@'"));
                }
                check_segment(raw, "skill name", skill)?;
                rest = left;
                Some(format!("{}/{}", NESTED_SKILLS_DIR, skill))
            }
            None => None,
        };

        let parts: Vec<&str> = rest.split('/').collect();
        let owner = parts[0].to_string();
        let repo = parts
            .get(1)
            .map(|r| r.strip_suffix(".git").unwrap_or(r).to_string())
            .unwrap_or_default();

        if owner.is_empty() {
            return Err(LegoError::resolution(raw, "missing owner segment"));
        }
        if repo.is_empty() {
            return Err(LegoError::resolution(raw, "missing repository segment"));
        }
        check_segment(raw, "owner", &owner)?;
        check_segment(raw, "repository", &repo)?;

        let branch = match (parts.get(2), parts.get(3)) {
            (Some(&"tree"), Some(branch)) if !branch.is_empty() => branch.to_string(),
            _ => DEFAULT_BRANCH.to_string(),
        };

        Ok(Self {
            owner,
            repo,
            branch,
            sub_path,
        })
    }

    /// Name of the nested skill, if one was selected.
    pub fn sub_skill(&self) -> Option<&str> {
        self.sub_path
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
    }

    /// Directory name the skill gets inside a composite.
    pub fn skill_name(&self) -> &str {
        self.sub_skill().unwrap_or(&self.repo)
    }

    /// `github.com/<owner>/<repo>`
    pub fn source(&self) -> String {
        format!("{}/{}/{}", FORGE_HOST, self.owner, self.repo)
    }

    /// HTTPS clone URL for the repository.
    pub fn clone_url(&self) -> String {
        format!("https://{}.git", self.source())
    }

    /// Browsable URL of the repository (and branch, when not the default).
    pub fn web_url(&self) -> String {
        if self.branch == DEFAULT_BRANCH {
            format!("https://{}", self.source())
        } else {
            format!("https://{}/tree/{}", self.source(), self.branch)
        }
    }
}

/// Owner, repository and skill names end up as directory names, so each must
/// be one plain path segment.
fn check_segment(raw: &str, what: &str, segment: &str) -> Result<()> {
    if segment == "." || segment == ".." || segment.contains(['/', '\\']) {
        return Err(LegoError::resolution(
            raw,
            format!("{} '{}' is not a plain name", what, segment),
        ));
    }
    Ok(())
}

impl fmt::Display for SkillIdentifier {
    /// Canonical form; resolving it again yields an equal identifier.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source())?;
        if self.branch != DEFAULT_BRANCH {
            write!(f, "/tree/{}", self.branch)?;
        }
        if let Some(skill) = self.sub_skill() {
            write!(f, "@{skill}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for SkillIdentifier {
    type Err = LegoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}
