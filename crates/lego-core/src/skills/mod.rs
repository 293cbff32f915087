//! Per-skill processing.
//!
//! A skill is a directory containing a `SKILL.md` file with:
//! - an optional header (name, description, triggers)
//! - a markdown body with instructions
//!
//! # Directory Structure
//!
//! ```text
//! skill-name/
//! ├── SKILL.md          # Required: instructions + metadata
//! ├── scripts/          # Optional: executable code
//! ├── references/       # Optional: additional documentation
//! ├── assets/           # Optional: data files
//! └── templates/        # Optional: templates
//! ```
//!
//! Inside a composite each skill lives at `skills/<name>/`, its SKILL.md
//! becomes `instructions.md` with asset references rewritten to match.

mod discovery;
mod license;
mod parser;
mod reference;
mod rewrite;

pub use discovery::{copy_skill_tree, locate_manifest, MANIFEST_FILE};
pub use license::{detect_license, LicenseTag};
pub use parser::SkillManifest;
pub use reference::{SkillIdentifier, DEFAULT_BRANCH, FORGE_HOST};
pub use rewrite::{rewrite_paths, AssetKind, SurfaceForm, REWRITE_RULES};
