//! Relocation of asset references in a skill body.
//!
//! Once a skill is copied to `skills/<namespace>/` inside a composite, relative
//! references such as `` `scripts/run.sh` `` must point at
//! `` `skills/<namespace>/scripts/run.sh` ``. Rewriting is textual and driven by
//! [`REWRITE_RULES`], applied in table order.
//!
//! Known limitations, kept for compatibility with existing composites:
//! - markdown links into `assets/` and `templates/` are left alone;
//! - rewriting is not idempotent: a reference already under `skills/<x>/`
//!   is prefixed again, so callers must rewrite a raw body exactly once;
//! - for the same reason a raw body that already spells out
//!   `` `skills/<x>/scripts/...` `` gets nested under the new namespace
//!   rather than left alone.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Conventional asset subdirectories of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    References,
    Scripts,
    Assets,
    Templates,
}

impl AssetKind {
    pub fn dir(self) -> &'static str {
        match self {
            AssetKind::References => "references/",
            AssetKind::Scripts => "scripts/",
            AssetKind::Assets => "assets/",
            AssetKind::Templates => "templates/",
        }
    }
}

/// The textual shape a reference appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceForm {
    /// `` `scripts/run.sh` ``
    Backtick,
    /// `./scripts/run.sh`
    Relative,
    /// `[run](scripts/run.sh)`
    MarkdownLink,
}

impl SurfaceForm {
    /// Text that precedes the asset directory in this form.
    fn lead(self) -> &'static str {
        match self {
            SurfaceForm::Backtick => "`",
            SurfaceForm::Relative => "./",
            SurfaceForm::MarkdownLink => "](",
        }
    }
}

/// Ordered rewrite rules.
pub const REWRITE_RULES: &[(AssetKind, SurfaceForm)] = &[
    (AssetKind::References, SurfaceForm::Backtick),
    (AssetKind::Scripts, SurfaceForm::Backtick),
    (AssetKind::Assets, SurfaceForm::Backtick),
    (AssetKind::Templates, SurfaceForm::Backtick),
    (AssetKind::References, SurfaceForm::Relative),
    (AssetKind::Scripts, SurfaceForm::Relative),
    (AssetKind::Assets, SurfaceForm::Relative),
    (AssetKind::Templates, SurfaceForm::Relative),
    (AssetKind::References, SurfaceForm::MarkdownLink),
    (AssetKind::Scripts, SurfaceForm::MarkdownLink),
];

/// One compiled matcher per rule, in table order.
///
/// Each matcher captures any `skills/<x>/` prefixes between the lead and the
/// asset directory so they survive behind the new prefix.
fn compiled_rules() -> &'static [(AssetKind, SurfaceForm, Regex)] {
    static RULES: OnceLock<Vec<(AssetKind, SurfaceForm, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        REWRITE_RULES
            .iter()
            .map(|&(kind, form)| {
                let pattern = format!(
                    r"{}((?:skills/[^/\s`)]+/)*){}",
                    regex::escape(form.lead()),
                    regex::escape(kind.dir())
                );
                let regex = Regex::new(&pattern).expect("rewrite rule pattern is valid");
                (kind, form, regex)
            })
            .collect()
    })
}

/// Redirect asset references in `body` into `skills/<namespace>/`.
pub fn rewrite_paths(body: &str, namespace: &str) -> String {
    let mut content = body.to_string();
    for (kind, form, regex) in compiled_rules() {
        if !regex.is_match(&content) {
            continue;
        }
        content = regex
            .replace_all(&content, |caps: &Captures| {
                format!("{}skills/{}/{}{}", form.lead(), namespace, &caps[1], kind.dir())
            })
            .into_owned();
    }
    content
}
