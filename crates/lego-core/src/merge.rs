//! Generate the top-level SKILL.md of a composite.
//!
//! The composite manifest is regenerated wholesale on every compose/update,
//! never patched in place.

use lego_config::ComposeConfig;

use crate::record::SkillRecord;

/// Workflow text used when none was supplied.
pub const WORKFLOW_PLACEHOLDER: &str =
    "_No orchestration defined. Skills can be used independently._";

/// Start of every derived description.
pub const DEFAULT_DESCRIPTION_PREFIX: &str = "Composite skill combining:";

/// Build the composite SKILL.md text.
pub fn generate_composite_manifest(
    name: &str,
    description: &str,
    records: &[SkillRecord],
    workflow: &str,
    config: &ComposeConfig,
) -> String {
    let triggers: Vec<&String> = records
        .iter()
        .flat_map(|r| r.triggers.iter())
        .take(config.max_triggers)
        .collect();

    let mut lines = vec![
        "---".to_string(),
        format!("name: {}", double_quoted(name)),
        format!("description: {}", double_quoted(description)),
    ];

    if !triggers.is_empty() {
        lines.push("triggers:".to_string());
        for trigger in triggers {
            lines.push(format!("  - {}", double_quoted(trigger)));
        }
    }

    lines.extend([
        "---".to_string(),
        String::new(),
        format!("# {}", name),
        String::new(),
        description.to_string(),
        String::new(),
        "## Included Skills".to_string(),
        String::new(),
        "| Skill | Description | Instructions |".to_string(),
        "|-------|-------------|--------------|".to_string(),
    ]);

    for record in records {
        let short: String = record
            .description
            .chars()
            .take(config.description_width)
            .collect();
        lines.push(format!(
            "| {} | {} | `{}` |",
            record.name,
            short,
            record.instructions_path()
        ));
    }

    let workflow = if workflow.is_empty() {
        WORKFLOW_PLACEHOLDER
    } else {
        workflow
    };

    lines.extend([
        String::new(),
        "## Workflow".to_string(),
        String::new(),
        workflow.to_string(),
        String::new(),
        "## Reference Table".to_string(),
        String::new(),
        "| Reference | When to Read |".to_string(),
        "|-----------|--------------|".to_string(),
    ]);

    for record in records {
        lines.push(format!(
            "| `{}` | When working with {} functionality |",
            record.instructions_path(),
            record.name
        ));
    }

    lines.extend([
        String::new(),
        "---".to_string(),
        String::new(),
        format!(
            "See `{}` for attribution and update information.",
            crate::compose::LEDGER_FILE
        ),
    ]);

    lines.join("\n")
}

/// Header value as a YAML double-quoted scalar, escaping what YAML would
/// otherwise read as an escape sequence or a line break.
fn double_quoted(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Description used when the caller supplied none.
pub fn default_description(records: &[SkillRecord]) -> String {
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    format!("{} {}", DEFAULT_DESCRIPTION_PREFIX, names.join(", "))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::skills::LicenseTag;

    pub(crate) fn record(name: &str, description: &str, triggers: &[&str]) -> SkillRecord {
        SkillRecord {
            name: name.to_string(),
            source: format!("github.com/acme/{}", name),
            branch: "main".to_string(),
            commit: "abc1234".to_string(),
            description: description.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            license: LicenseTag::Mit,
        }
    }

    #[test]
    fn test_trigger_cap() {
        let records: Vec<SkillRecord> = (0..11)
            .map(|i| {
                let a = format!("t{}a", i);
                let b = format!("t{}b", i);
                record(&format!("s{}", i), "d", &[a.as_str(), b.as_str()])
            })
            .collect();

        let result =
            generate_composite_manifest("big", "desc", &records, "", &ComposeConfig::default());
        let header = result.split("---").nth(1).unwrap();
        let trigger_lines = header.lines().filter(|l| l.starts_with("  - ")).count();
        assert_eq!(trigger_lines, 10);
        // Record order is preserved
        assert!(header.contains("  - \"t0a\"\n  - \"t0b\"\n  - \"t1a\""));
        assert!(!header.contains("t5a"));
    }

    #[test]
    fn test_no_triggers_no_key() {
        let records = vec![record("alpha", "First", &[])];
        let result =
            generate_composite_manifest("suite", "desc", &records, "", &ComposeConfig::default());
        assert!(!result.contains("triggers:"));
    }

    #[test]
    fn test_description_truncated_without_ellipsis() {
        let long = "x".repeat(80);
        let records = vec![record("alpha", &long, &[])];
        let result =
            generate_composite_manifest("suite", "desc", &records, "", &ComposeConfig::default());
        let expected = format!("| alpha | {} | `skills/alpha/instructions.md` |", "x".repeat(50));
        assert!(result.contains(&expected));
        assert!(!result.contains(&"x".repeat(51)));
    }

    #[test]
    fn test_section_order() {
        let records = vec![record("alpha", "First", &["build"]), record("beta", "Second", &[])];
        let result = generate_composite_manifest(
            "suite",
            "Does things",
            &records,
            "Run alpha, then beta.",
            &ComposeConfig::default(),
        );

        let positions: Vec<usize> = [
            "# suite",
            "\nDoes things\n",
            "## Included Skills",
            "## Workflow",
            "Run alpha, then beta.",
            "## Reference Table",
            "| `skills/beta/instructions.md` | When working with beta functionality |",
            "See `SOURCES.md` for attribution",
        ]
        .iter()
        .map(|needle| result.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn test_empty_workflow_placeholder() {
        let result = generate_composite_manifest("s", "d", &[], "", &ComposeConfig::default());
        assert!(result.contains(WORKFLOW_PLACEHOLDER));
    }

    #[test]
    fn test_header_values_are_escaped() {
        let records = vec![record("alpha", "", &[r#"say "hi""#])];
        let result = generate_composite_manifest(
            "suite",
            r#"Reads C:\new\table files, "quoted""#,
            &records,
            "",
            &ComposeConfig::default(),
        );
        assert!(result.contains(r#"description: "Reads C:\\new\\table files, \"quoted\"""#));
        assert!(result.contains(r#"  - "say \"hi\"""#));
    }

    #[test]
    fn test_default_description() {
        let records = vec![record("alpha", "", &[]), record("beta", "", &[])];
        assert_eq!(
            default_description(&records),
            "Composite skill combining: alpha, beta"
        );
    }
}
