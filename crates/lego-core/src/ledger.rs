//! SOURCES.md: attribution and provenance for a composite.
//!
//! Each skill row carries its identifier as bracketed link text,
//! `[github.com/owner/repo@skill](https://...)`. The updater relies on that
//! convention when a composite has no sources lock.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::record::SkillRecord;
use crate::skills::SkillIdentifier;

/// Binary name used in the reconstructable commands
const COMMAND: &str = "lego";

/// Build the SOURCES.md text.
pub fn generate_ledger(name: &str, records: &[SkillRecord], composed_on: NaiveDate) -> String {
    let mut lines = vec![
        "# Sources".to_string(),
        String::new(),
        format!("Last composed: {}", composed_on.format("%Y-%m-%d")),
        String::new(),
        "## Included Skills".to_string(),
        String::new(),
        "| Skill | Source | Commit | License |".to_string(),
        "|-------|--------|--------|---------|".to_string(),
    ];

    for record in records {
        lines.push(format!(
            "| {} | [{}]({}) | `{}` | {} |",
            record.name,
            record.source,
            web_url(&record.source),
            record.commit,
            record.license
        ));
    }

    lines.extend([
        String::new(),
        "## Updating".to_string(),
        String::new(),
        "To update this composite with the latest versions:".to_string(),
        String::new(),
        "```bash".to_string(),
        format!("{} update .", COMMAND),
        "```".to_string(),
        String::new(),
        "Or regenerate manually:".to_string(),
        String::new(),
        "```bash".to_string(),
        format!("{} compose \\", COMMAND),
        format!("    --name \"{}\" \\", name),
    ]);

    for record in records {
        lines.push(format!("    --skill \"{}\" \\", record.source));
    }

    lines.extend(["    --output ./updated".to_string(), "```".to_string()]);

    lines.join("\n")
}

/// Browsable link for a recorded identifier.
fn web_url(source: &str) -> String {
    SkillIdentifier::resolve(source)
        .map(|id| id.web_url())
        .unwrap_or_else(|_| format!("https://{}", source))
}

/// Recover the bracketed identifiers from ledger text, in order of appearance.
pub fn extract_identifiers(ledger: &str) -> Vec<String> {
    static BRACKETED: OnceLock<Regex> = OnceLock::new();
    let regex = BRACKETED.get_or_init(|| {
        Regex::new(r"\[(github\.com/[^\]]+)\]").expect("identifier pattern is valid")
    });

    regex
        .captures_iter(ledger)
        .map(|caps| caps[1].to_string())
        .collect()
}
