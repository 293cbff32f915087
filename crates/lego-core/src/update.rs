//! Re-composing an existing composite from its own provenance.
//!
//! Nothing is incremental: every skill is fetched again and the composite
//! regenerated in place.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use lego_config::Config;

use crate::compose::{ComposeOutcome, ComposeRequest, Composer, ProgressReporter, LEDGER_FILE};
use crate::error::{LegoError, Result};
use crate::fetch::{GitFetcher, SourceFetcher};
use crate::ledger::extract_identifiers;
use crate::lock::SourcesLock;
use crate::merge::{DEFAULT_DESCRIPTION_PREFIX, WORKFLOW_PLACEHOLDER};
use crate::skills::{SkillManifest, MANIFEST_FILE};

/// Everything needed to rebuild a composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub name: String,
    pub description: String,
    pub workflow: String,
    pub identifiers: Vec<String>,
}

impl UpdatePlan {
    fn into_request(self, output_dir: PathBuf) -> ComposeRequest {
        ComposeRequest {
            name: self.name,
            identifiers: self.identifiers,
            output_dir,
            workflow: self.workflow,
            description: self.description,
        }
    }
}

/// Read back name, description, workflow and identifiers of a composite.
///
/// The sources lock wins when it is present and readable; otherwise the
/// identifiers come from the SOURCES.md prose and the rest from SKILL.md.
pub fn recover(composite_dir: &Path) -> Result<UpdatePlan> {
    let ledger_path = composite_dir.join(LEDGER_FILE);
    if !ledger_path.exists() {
        return Err(LegoError::LedgerMissing(composite_dir.to_path_buf()));
    }

    if let Some(lock) = SourcesLock::load(composite_dir)? {
        if !lock.skills.is_empty() {
            debug!("Using sources lock of {}", composite_dir.display());
            return Ok(UpdatePlan {
                identifiers: lock.identifiers(),
                name: lock.name,
                description: lock.description,
                workflow: lock.workflow,
            });
        }
    }

    let identifiers = extract_identifiers(&fs::read_to_string(&ledger_path)?);
    if identifiers.is_empty() {
        return Err(LegoError::NoIdentifiersFound(ledger_path));
    }

    let mut plan = UpdatePlan {
        name: composite_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        description: String::new(),
        workflow: String::new(),
        identifiers,
    };

    let manifest_path = composite_dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        let manifest = SkillManifest::from_file(&manifest_path)?;
        if !manifest.name.is_empty() {
            plan.name = manifest.name;
        }
        if !manifest.description.starts_with(DEFAULT_DESCRIPTION_PREFIX) {
            plan.description = manifest.description;
        }
        plan.workflow = workflow_section(&manifest.body);
    }

    Ok(plan)
}

/// Text of the `## Workflow` section, empty for the placeholder.
fn workflow_section(body: &str) -> String {
    static WORKFLOW: OnceLock<Regex> = OnceLock::new();
    let regex = WORKFLOW.get_or_init(|| {
        Regex::new(r"(?s)## Workflow\s*\n\n(.*?)(?:\n##|\z)").expect("workflow pattern is valid")
    });

    match regex.captures(body) {
        Some(caps) => {
            let text = caps[1].trim();
            if text == WORKFLOW_PLACEHOLDER {
                String::new()
            } else {
                text.to_string()
            }
        }
        None => String::new(),
    }
}

/// Rebuilds composites in place.
pub struct Updater<F: SourceFetcher> {
    composer: Composer<F>,
}

impl Updater<GitFetcher> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(Composer::from_config(config))
    }
}

impl<F: SourceFetcher> Updater<F> {
    pub fn new(composer: Composer<F>) -> Self {
        Self { composer }
    }

    pub async fn update(&self, composite_dir: &Path) -> Result<ComposeOutcome> {
        self.update_with_progress(composite_dir, &crate::compose::NoProgress)
            .await
    }

    pub async fn update_with_progress(
        &self,
        composite_dir: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ComposeOutcome> {
        let plan = recover(composite_dir)?;
        info!(
            "Updating '{}' ({} skills) in {}",
            plan.name,
            plan.identifiers.len(),
            composite_dir.display()
        );
        let request = plan.into_request(composite_dir.to_path_buf());
        self.composer.compose_with_progress(&request, progress).await
    }
}
