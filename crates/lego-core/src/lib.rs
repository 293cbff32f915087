//! Composition engine for Skills Lego.
//!
//! Combines several skill packages into one composite skill: each skill is
//! fetched, namespaced under `skills/<name>/`, its asset references rewritten,
//! and a composite SKILL.md plus a SOURCES.md ledger generated on top.

pub mod compose;
pub mod error;
pub mod fetch;
pub mod ledger;
pub mod lock;
pub mod merge;
pub mod package;
pub mod record;
pub mod skills;
pub mod update;

pub use compose::{
    assign_names, ComposeOutcome, ComposeRequest, Composer, NoProgress, ProgressReporter,
    INSTRUCTIONS_FILE, LEDGER_FILE, SKILLS_DIR,
};
pub use error::{LegoError, Result};
pub use fetch::{short_hash, FetchedSource, GitFetcher, SourceFetcher, SHORT_HASH_LEN};
pub use ledger::{extract_identifiers, generate_ledger};
pub use lock::{LockedSkill, SourcesLock};
pub use merge::{default_description, generate_composite_manifest, WORKFLOW_PLACEHOLDER};
pub use package::package;
pub use record::SkillRecord;
pub use skills::{LicenseTag, SkillIdentifier, SkillManifest};
pub use update::{recover, UpdatePlan, Updater};
