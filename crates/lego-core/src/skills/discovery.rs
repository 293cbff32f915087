//! Locating a skill inside a fetched tree and copying it into a composite.
//!
//! A fetched repository holds its SKILL.md either:
//! 1. at a nested skill path selected by the identifier (`skills/<name>/`),
//! 2. at the repository root, or
//! 3. exactly one directory level below the root.
//!
//! Deeper nesting is not searched.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{LegoError, Result};

/// Manifest file name (case-sensitive)
pub const MANIFEST_FILE: &str = "SKILL.md";

/// Version-control metadata directories stripped while copying
const VCS_DIRS: &[&str] = &[".git"];

/// Find the SKILL.md of a fetched tree.
///
/// `sub_path` restricts the search to that directory. `origin` names the
/// source in error messages.
pub fn locate_manifest(root: &Path, sub_path: Option<&str>, origin: &str) -> Result<PathBuf> {
    if let Some(sub_path) = sub_path {
        let candidate = root.join(sub_path).join(MANIFEST_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        return Err(LegoError::ManifestMissing {
            location: format!("at {} in {}", sub_path, origin),
        });
    }

    let candidate = root.join(MANIFEST_FILE);
    if candidate.is_file() {
        return Ok(candidate);
    }

    // One level deep, in name order so the choice is deterministic
    let mut children: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && !is_hidden(p))
        .collect();
    children.sort();

    for child in children {
        let candidate = child.join(MANIFEST_FILE);
        if candidate.is_file() {
            debug!("Found {} one level deep: {}", MANIFEST_FILE, candidate.display());
            return Ok(candidate);
        }
    }

    Err(LegoError::ManifestMissing {
        location: format!("in {}", origin),
    })
}

/// Replace `dest` with a copy of `src`, leaving out version-control metadata.
///
/// Any existing directory at `dest` is removed first, not merged.
pub fn copy_skill_tree(src: &Path, dest: &Path) -> Result<usize> {
    if dest.exists() {
        debug!("Removing existing {}", dest.display());
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_vcs_dir(e.path())));

    for entry in walker {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop while copying skill"))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        } else {
            debug!("Skipping non-regular file {}", entry.path().display());
        }
    }

    Ok(copied)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn is_vcs_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| VCS_DIRS.contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            format!("---\nname: {}\ndescription: test\n---\n\nBody.", name),
        )
        .unwrap();
    }

    #[test]
    fn test_manifest_at_root() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "root-skill");
        // A nested one must not win over the root
        write_manifest(&temp.path().join("nested"), "nested-skill");

        let found = locate_manifest(temp.path(), None, "test").unwrap();
        assert_eq!(found, temp.path().join(MANIFEST_FILE));
    }

    #[test]
    fn test_manifest_one_level_deep() {
        let temp = TempDir::new().unwrap();
        write_manifest(&temp.path().join("b-skill"), "b");
        write_manifest(&temp.path().join("a-skill"), "a");

        let found = locate_manifest(temp.path(), None, "test").unwrap();
        assert_eq!(found, temp.path().join("a-skill").join(MANIFEST_FILE));
    }

    #[test]
    fn test_manifest_two_levels_deep_not_found() {
        let temp = TempDir::new().unwrap();
        write_manifest(&temp.path().join("a").join("b"), "deep");

        let err = locate_manifest(temp.path(), None, "github.com/acme/deep").unwrap_err();
        assert!(matches!(err, LegoError::ManifestMissing { .. }));
        assert!(err.to_string().contains("github.com/acme/deep"));
    }

    #[test]
    fn test_hidden_directories_skipped() {
        let temp = TempDir::new().unwrap();
        write_manifest(&temp.path().join(".github"), "hidden");

        assert!(locate_manifest(temp.path(), None, "test").is_err());
    }

    #[test]
    fn test_sub_path_only() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "root");
        write_manifest(&temp.path().join("skills").join("pdf"), "pdf");

        let found = locate_manifest(temp.path(), Some("skills/pdf"), "test").unwrap();
        assert_eq!(found, temp.path().join("skills/pdf").join(MANIFEST_FILE));

        let err = locate_manifest(temp.path(), Some("skills/xlsx"), "test").unwrap_err();
        assert!(err.to_string().contains("at skills/xlsx"));
    }

    #[test]
    fn test_copy_strips_git_and_replaces_dest() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        write_manifest(&src, "copy-me");
        fs::create_dir_all(src.join(".git/objects")).unwrap();
        fs::write(src.join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(src.join("scripts/.git")).unwrap();
        fs::write(src.join("scripts/run.sh"), "echo hi").unwrap();

        let dest = temp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.txt"), "old").unwrap();

        let copied = copy_skill_tree(&src, &dest).unwrap();
        assert_eq!(copied, 2);
        assert!(dest.join(MANIFEST_FILE).exists());
        assert!(dest.join("scripts/run.sh").exists());
        assert!(!dest.join(".git").exists());
        assert!(!dest.join("scripts/.git").exists());
        assert!(!dest.join("stale.txt").exists());
    }
}
