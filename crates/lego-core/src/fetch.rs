//! Retrieval of skill sources.
//!
//! The [`SourceFetcher`] trait is the seam between the composer and the
//! outside world. [`GitFetcher`] shells out to `git` for a shallow clone;
//! tests plug in fetchers that copy local fixtures instead.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use lego_config::FetchConfig;

use crate::error::{LegoError, Result};
use crate::skills::{SkillIdentifier, DEFAULT_BRANCH};

/// Length of the commit hash recorded in the ledger
pub const SHORT_HASH_LEN: usize = 7;

/// What a fetch produced besides the tree at `dest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    /// Branch actually checked out
    pub branch: String,
    /// Short commit hash of the checkout
    pub commit: String,
}

/// Places a checkout of `id` at `dest` (which does not exist yet).
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, id: &SkillIdentifier, dest: &Path) -> Result<FetchedSource>;
}

/// Shorten a full commit hash.
pub fn short_hash(full: &str) -> String {
    full.trim().chars().take(SHORT_HASH_LEN).collect()
}

/// Shallow-clones from the forge with the `git` command line.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    config: FetchConfig,
}

/// Outcome of one git invocation.
struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl GitFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    async fn clone_branch(&self, id: &SkillIdentifier, branch: &str, dest: &Path) -> Result<GitOutput> {
        let depth = self.config.depth.max(1).to_string();
        let dest_arg = dest.to_string_lossy().to_string();
        let clone_url = id.clone_url();
        self.run_git(
            &id.source(),
            &["clone", "--depth", &depth, "--branch", branch, &clone_url, &dest_arg],
        )
        .await
    }

    async fn run_git(&self, source: &str, args: &[&str]) -> Result<GitOutput> {
        debug!("Running {} {}", self.config.git_command, args.join(" "));

        let mut cmd = Command::new(&self.config.git_command);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            LegoError::fetch(source, format!("failed to run {}: {}", self.config.git_command, e))
        })?;

        let output = match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| LegoError::fetch(source, timeout_message(args, limit)))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| LegoError::fetch(source, e.to_string()))?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn timeout_message(args: &[&str], limit: Duration) -> String {
    format!(
        "git {} timed out after {}s",
        args.first().copied().unwrap_or_default(),
        limit.as_secs()
    )
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(&self, id: &SkillIdentifier, dest: &Path) -> Result<FetchedSource> {
        let source = id.source();
        let mut branch = id.branch.clone();

        let mut output = self.clone_branch(id, &branch, dest).await?;
        if !output.success && branch == DEFAULT_BRANCH {
            let fallback = &self.config.fallback_branch;
            info!("Branch '{}' not found for {}, trying '{}'", branch, source, fallback);
            // A failed clone can leave a partial directory behind
            if dest.exists() {
                std::fs::remove_dir_all(dest)?;
            }
            output = self.clone_branch(id, fallback, dest).await?;
            if output.success {
                branch = fallback.clone();
            }
        }
        if !output.success {
            return Err(LegoError::fetch(id.clone_url(), output.stderr));
        }

        let dest_arg = dest.to_string_lossy().to_string();
        let rev = self
            .run_git(&source, &["-C", &dest_arg, "rev-parse", "HEAD"])
            .await?;
        if !rev.success {
            return Err(LegoError::fetch(source, rev.stderr));
        }

        Ok(FetchedSource {
            branch,
            commit: short_hash(&rev.stdout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef\n"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[tokio::test]
    async fn test_missing_git_command_is_fetch_error() {
        let fetcher = GitFetcher::new(FetchConfig {
            git_command: "definitely-not-a-real-git-binary".to_string(),
            ..FetchConfig::default()
        });
        let id = SkillIdentifier::resolve("acme/toolbox").unwrap();
        let temp = TempDir::new().unwrap();

        let err = fetcher.fetch(&id, &temp.path().join("toolbox")).await.unwrap_err();
        assert!(matches!(err, LegoError::Fetch { .. }));
        assert!(err.to_string().contains("github.com/acme/toolbox"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_command_times_out() {
        let fetcher = GitFetcher::new(FetchConfig {
            git_command: "sleep".to_string(),
            timeout_secs: 1,
            ..FetchConfig::default()
        });
        let err = fetcher.run_git("github.com/acme/slow", &["5"]).await.err().unwrap();
        assert!(err.to_string().contains("timed out after 1s"));
    }

    /// Stand-in git: clone succeeds only for `good_branch`, a failed clone
    /// leaves a partial checkout behind, and every cloned branch is logged.
    #[cfg(unix)]
    fn scripted_git(dir: &Path, good_branch: &str) -> FetchConfig {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("branches.log");
        let script = format!(
            r#"#!/bin/sh
if [ "$1" = "-C" ]; then
  echo 0123456789abcdef0123456789abcdef01234567
  exit 0
fi
echo "$5" >> "{log}"
if [ "$5" = "{good}" ]; then
  [ -e "$7/partial" ] && exit 3
  mkdir -p "$7"
  exit 0
fi
mkdir -p "$7"
touch "$7/partial"
echo "fatal: Remote branch $5 not found in upstream origin" >&2
exit 128
"#,
            log = log.display(),
            good = good_branch,
        );
        let path = dir.join("fake-git");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        FetchConfig {
            git_command: path.to_string_lossy().to_string(),
            ..FetchConfig::default()
        }
    }

    #[cfg(unix)]
    fn cloned_branches(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("branches.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_default_branch_falls_back_to_master() {
        let temp = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(scripted_git(temp.path(), "master"));
        let id = SkillIdentifier::resolve("acme/toolbox").unwrap();
        let dest = temp.path().join("toolbox");

        let fetched = fetcher.fetch(&id, &dest).await.unwrap();
        assert_eq!(fetched.branch, "master");
        assert_eq!(fetched.commit, "0123456");
        assert_eq!(fetched.commit.len(), SHORT_HASH_LEN);
        assert_eq!(cloned_branches(temp.path()), vec!["main", "master"]);
        // Leftovers of the failed attempt were cleared before the retry
        assert!(dest.is_dir());
        assert!(!dest.join("partial").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_explicit_branch_is_not_retried() {
        let temp = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(scripted_git(temp.path(), "master"));
        let id = SkillIdentifier::resolve("acme/toolbox/tree/dev").unwrap();

        let err = fetcher
            .fetch(&id, &temp.path().join("toolbox"))
            .await
            .unwrap_err();
        assert!(matches!(err, LegoError::Fetch { .. }));
        assert!(err.to_string().contains("Remote branch dev not found"));
        assert_eq!(cloned_branches(temp.path()), vec!["dev"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_both_branches_missing_is_fetch_error() {
        let temp = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(scripted_git(temp.path(), "trunk"));
        let id = SkillIdentifier::resolve("acme/toolbox").unwrap();

        let err = fetcher
            .fetch(&id, &temp.path().join("toolbox"))
            .await
            .unwrap_err();
        match &err {
            LegoError::Fetch { source_url, message } => {
                assert_eq!(source_url, &id.clone_url());
                assert!(message.contains("Remote branch master not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cloned_branches(temp.path()), vec!["main", "master"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_command_reports_unsuccessful() {
        let fetcher = GitFetcher::new(FetchConfig {
            git_command: "false".to_string(),
            ..FetchConfig::default()
        });
        let output = fetcher.run_git("github.com/acme/x", &[]).await.unwrap();
        assert!(!output.success);
    }
}
