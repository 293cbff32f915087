//! Composition of several skills into one composite skill.
//!
//! Output layout:
//!
//! ```text
//! <output>/
//! ├── SKILL.md                 # generated composite manifest
//! ├── SOURCES.md               # attribution ledger
//! ├── .lego/sources.json       # sources lock
//! └── skills/
//!     └── <name>/
//!         ├── instructions.md  # skill body, paths rewritten, no header
//!         └── ...              # scripts/, references/, assets/, templates/
//! ```
//!
//! Skills are fetched and processed one at a time, in the order given. Any
//! failure aborts the run; a partially written output directory is left as is.

use chrono::Local;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use lego_config::{CollisionPolicy, ComposeConfig, Config};

use crate::error::{LegoError, Result};
use crate::fetch::{GitFetcher, SourceFetcher};
use crate::ledger::generate_ledger;
use crate::lock::SourcesLock;
use crate::merge::{default_description, generate_composite_manifest};
use crate::record::SkillRecord;
use crate::skills::{
    copy_skill_tree, detect_license, locate_manifest, rewrite_paths, SkillIdentifier,
    SkillManifest, MANIFEST_FILE,
};

/// Per-skill instructions file inside a composite
pub const INSTRUCTIONS_FILE: &str = "instructions.md";

/// Ledger file at the composite root
pub const LEDGER_FILE: &str = "SOURCES.md";

/// Directory holding the namespaced skills
pub const SKILLS_DIR: &str = "skills";

/// Inputs of one composition.
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    pub name: String,
    pub identifiers: Vec<String>,
    pub output_dir: PathBuf,
    pub workflow: String,
    /// Empty means "derive from the included skill names"
    pub description: String,
}

/// What a composition produced.
#[derive(Debug, Clone)]
pub struct ComposeOutcome {
    pub name: String,
    pub output_dir: PathBuf,
    pub description: String,
    pub records: Vec<SkillRecord>,
}

/// Receives progress while skills are processed.
pub trait ProgressReporter: Send + Sync {
    fn skill_started(&self, _id: &SkillIdentifier, _name: &str) {}
    fn skill_finished(&self, _record: &SkillRecord) {}
}

/// Reports nothing.
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Runs compositions with a given source fetcher.
pub struct Composer<F: SourceFetcher> {
    fetcher: F,
    config: ComposeConfig,
}

impl Composer<GitFetcher> {
    /// Composer that fetches with git, configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(GitFetcher::new(config.fetch.clone()), config.compose.clone())
    }
}

impl<F: SourceFetcher> Composer<F> {
    pub fn new(fetcher: F, config: ComposeConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn compose(&self, request: &ComposeRequest) -> Result<ComposeOutcome> {
        self.compose_with_progress(request, &NoProgress).await
    }

    pub async fn compose_with_progress(
        &self,
        request: &ComposeRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<ComposeOutcome> {
        let ids = request
            .identifiers
            .iter()
            .map(|raw| SkillIdentifier::resolve(raw))
            .collect::<Result<Vec<_>>>()?;
        let names = assign_names(&ids, self.config.collision)?;

        info!(
            "Composing '{}' from {} skills into {}",
            request.name,
            ids.len(),
            request.output_dir.display()
        );

        let skills_dir = request.output_dir.join(SKILLS_DIR);
        fs::create_dir_all(&skills_dir)?;

        let mut records = Vec::with_capacity(ids.len());
        for (id, name) in ids.iter().zip(&names) {
            progress.skill_started(id, name);
            let record = self.include_skill(id, name, &skills_dir).await?;
            progress.skill_finished(&record);
            records.push(record);
        }

        let description = if request.description.trim().is_empty() {
            default_description(&records)
        } else {
            request.description.clone()
        };

        let manifest = generate_composite_manifest(
            &request.name,
            &description,
            &records,
            &request.workflow,
            &self.config,
        );
        fs::write(request.output_dir.join(MANIFEST_FILE), manifest)?;

        let ledger = generate_ledger(&request.name, &records, Local::now().date_naive());
        fs::write(request.output_dir.join(LEDGER_FILE), ledger)?;

        // Caller-supplied description only; empty means derived
        SourcesLock::new(&request.name, &request.description, &request.workflow, &records)
            .save(&request.output_dir)?;

        info!("Composite '{}' written to {}", request.name, request.output_dir.display());

        Ok(ComposeOutcome {
            name: request.name.clone(),
            output_dir: request.output_dir.clone(),
            description,
            records,
        })
    }

    /// Fetch one skill into `skills_dir/<name>` and describe it.
    async fn include_skill(
        &self,
        id: &SkillIdentifier,
        name: &str,
        skills_dir: &Path,
    ) -> Result<SkillRecord> {
        // Removed on drop, on every exit path
        let temp = tempfile::Builder::new().prefix("lego-").tempdir()?;
        let checkout = temp.path().join(&id.repo);

        info!("Fetching {}", id);
        let fetched = self.fetcher.fetch(id, &checkout).await?;

        let manifest_path = locate_manifest(&checkout, id.sub_path.as_deref(), &id.to_string())?;
        let skill_root = manifest_path.parent().unwrap_or(&checkout);

        let dest = skills_dir.join(name);
        let copied = copy_skill_tree(skill_root, &dest)?;
        debug!("Copied {} files into {}", copied, dest.display());

        let manifest = SkillManifest::from_file(&dest.join(MANIFEST_FILE))?;
        let body = rewrite_paths(&manifest.body, name);
        fs::write(dest.join(INSTRUCTIONS_FILE), body)?;
        fs::remove_file(dest.join(MANIFEST_FILE))?;

        let license = detect_license(&dest);

        Ok(SkillRecord {
            name: name.to_string(),
            source: id.to_string(),
            branch: fetched.branch,
            commit: fetched.commit,
            description: manifest.description,
            triggers: manifest.triggers,
            license,
        })
    }
}

/// Pick the directory name of every skill, applying the collision policy.
pub fn assign_names(ids: &[SkillIdentifier], policy: CollisionPolicy) -> Result<Vec<String>> {
    let mut claimed: HashMap<String, &SkillIdentifier> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(ids.len());

    for id in ids {
        let base = id.skill_name().to_string();
        if !is_plain_name(&base) {
            return Err(LegoError::resolution(
                &id.to_string(),
                format!("skill name '{}' is not a plain directory name", base),
            ));
        }
        let name = match (claimed.get(&base), policy) {
            (None, _) => base.clone(),
            (Some(first), CollisionPolicy::Fail) => {
                return Err(LegoError::NameCollision {
                    name: base,
                    first: first.to_string(),
                    second: id.to_string(),
                });
            }
            (Some(_), CollisionPolicy::Suffix) => {
                let mut n = 2;
                while taken.contains(&format!("{}-{}", base, n)) {
                    n += 1;
                }
                format!("{}-{}", base, n)
            }
        };
        claimed.entry(base).or_insert(id);
        claimed.entry(name.clone()).or_insert(id);
        taken.insert(name.clone());
        names.push(name);
    }

    Ok(names)
}

/// Exactly one normal path component, so `skills/<name>` stays inside `skills/`.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
