//! SKILL.md parser.
//!
//! A manifest is an optional header block delimited by `---` followed by a
//! free-form markdown body. Only a handful of header keys matter here, listed
//! in [`HEADER_KEYS`]. Everything else in the header is ignored.
//!
//! Headers are read as YAML first. Hand-written headers are often not valid
//! YAML (e.g. an unquoted description containing `: `), so a line-oriented
//! scanner over the same key table takes over when YAML rejects the block.
//! Parsing never fails.

use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::error::Result;

/// Header delimiter
const DELIMITER: &str = "---";

/// How a header key's value is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Scalar,
    List,
}

/// Which manifest field a header key fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
    Triggers,
}

/// Recognized header keys. Add a row to recognize another key.
const HEADER_KEYS: &[(&str, ValueKind, Field)] = &[
    ("name", ValueKind::Scalar, Field::Name),
    ("description", ValueKind::Scalar, Field::Description),
    ("triggers", ValueKind::List, Field::Triggers),
];

fn lookup_key(key: &str) -> Option<(ValueKind, Field)> {
    HEADER_KEYS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, kind, field)| (*kind, *field))
}

/// Metadata and body extracted from a SKILL.md file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillManifest {
    pub name: String,
    pub description: String,
    pub triggers: Vec<String>,
    /// Everything after the header, trimmed
    pub body: String,
}

impl SkillManifest {
    /// Parse manifest text.
    ///
    /// Without a complete header block all fields are empty and `body` is the
    /// whole input.
    pub fn parse(content: &str) -> Self {
        let mut manifest = SkillManifest {
            body: content.to_string(),
            ..Default::default()
        };

        if !content.starts_with(DELIMITER) {
            return manifest;
        }

        let parts: Vec<&str> = content.splitn(3, DELIMITER).collect();
        if parts.len() < 3 {
            return manifest;
        }

        let header = parts[1].trim();
        manifest.body = parts[2].trim().to_string();

        match serde_yaml::from_str::<Mapping>(header) {
            Ok(mapping) => manifest.apply_mapping(&mapping),
            Err(_) => manifest.apply_lines(header),
        }
        manifest
    }

    /// Read and parse a SKILL.md file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    fn set_scalar(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Description => self.description = value,
            Field::Triggers => self.triggers = vec![value],
        }
    }

    fn push_item(&mut self, field: Field, item: String) {
        if field == Field::Triggers && !item.is_empty() {
            self.triggers.push(item);
        }
    }

    fn apply_mapping(&mut self, mapping: &Mapping) {
        for (key, value) in mapping {
            let Some((kind, field)) = key.as_str().and_then(lookup_key) else {
                continue;
            };
            match (kind, value) {
                (ValueKind::Scalar, value) => {
                    if let Some(text) = scalar_to_string(value) {
                        self.set_scalar(field, text.trim().to_string());
                    }
                }
                (ValueKind::List, Value::Sequence(items)) => {
                    for item in items.iter().filter_map(scalar_to_string) {
                        self.push_item(field, item.trim().to_string());
                    }
                }
                (ValueKind::List, value) => {
                    if let Some(text) = scalar_to_string(value) {
                        self.push_item(field, text.trim().to_string());
                    }
                }
            }
        }
    }

    fn apply_lines(&mut self, header: &str) {
        // Key whose block list items are currently being read
        let mut open_list: Option<Option<Field>> = None;

        for line in header.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let trimmed = line.trim_start();
            if let Some(item) = trimmed.strip_prefix("- ").or_else(|| {
                (trimmed == "-").then_some("")
            }) {
                if let Some(Some(field)) = open_list {
                    self.push_item(field, unquote(item.trim()).to_string());
                }
                continue;
            }

            // Indented lines are continuations of something we don't track
            if line.starts_with(char::is_whitespace) {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                open_list = None;
                continue;
            };
            let value = value.trim();
            let entry = lookup_key(key.trim());

            open_list = match entry {
                Some((ValueKind::List, field)) if value.is_empty() => Some(Some(field)),
                None if value.is_empty() => Some(None),
                _ => None,
            };

            match entry {
                Some((ValueKind::Scalar, field)) => {
                    self.set_scalar(field, unquote(value).to_string());
                }
                Some((ValueKind::List, field)) if !value.is_empty() => {
                    for item in split_flow_list(value) {
                        self.push_item(field, item);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Render a YAML scalar as text; non-scalars yield `None`.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Remove one layer of matching quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Split `[a, "b"]` (or a bare `a`) into unquoted items.
fn split_flow_list(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
