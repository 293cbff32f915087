//! User-facing progress output.
//!
//! Progress goes to stdout; tracing logs go to stderr. Each line is fitted to
//! a [`LineBudget`] so long identifiers and output paths never wrap.

use crossterm::style::Stylize;
use crossterm::terminal;
use std::path::Path;

use lego_core::{ComposeOutcome, ProgressReporter, SkillIdentifier, SkillRecord};

/// Columns left blank at the end of a progress line.
const TRAILING_COLUMNS: usize = 4;

/// Progress lines get at least this many columns, however narrow the window.
const NARROWEST: usize = 40;

/// Columns assumed when stdout is not a terminal.
const PIPED_COLUMNS: usize = 80;

/// Columns a progress line may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBudget(usize);

impl LineBudget {
    /// Budget for the current stdout.
    pub fn detect() -> Self {
        let columns = terminal::size()
            .map(|(w, _)| w as usize)
            .unwrap_or(PIPED_COLUMNS);
        Self::with_columns(columns)
    }

    pub fn with_columns(columns: usize) -> Self {
        Self(columns.saturating_sub(TRAILING_COLUMNS).max(NARROWEST))
    }

    pub fn columns(self) -> usize {
        self.0
    }

    /// What is left once a fixed label of `label` columns is printed.
    pub fn after(self, label: usize) -> usize {
        self.0.saturating_sub(label)
    }
}

/// `text` cut to `budget` characters, the cut marked with "…".
pub fn fit_text(text: &str, budget: usize) -> String {
    if text.chars().nth(budget).is_none() {
        return text.to_string();
    }
    let mut kept: String = text.chars().take(budget.saturating_sub(1)).collect();
    kept.push('…');
    kept
}

/// Output path cut from the front so the composite and skill names at the
/// end stay readable: `/home/me/composites/suite/skills/pdf` in 18 columns
/// is `…/suite/skills/pdf`. A final segment too long for the budget is cut
/// like plain text.
pub fn fit_path(path: &str, budget: usize) -> String {
    let length = path.chars().count();
    if length <= budget {
        return path.to_string();
    }

    let final_segment = path.rsplit('/').next().unwrap_or(path);
    if final_segment.chars().count() >= budget.saturating_sub(1) {
        return fit_text(final_segment, budget);
    }

    let tail: String = path.chars().skip(length - (budget - 1)).collect();
    format!("…{}", tail)
}

/// Prints one line per skill as it is fetched and included.
pub struct ConsoleProgress {
    budget: LineBudget,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            budget: LineBudget::detect(),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn skill_started(&self, id: &SkillIdentifier, _name: &str) {
        let line = format!("  Fetching {}...", id);
        println!("{}", fit_text(&line, self.budget.columns()));
    }

    fn skill_finished(&self, record: &SkillRecord) {
        let line = format!("{} ({})", record.name, record.commit);
        println!("  {} {}", "✓".green(), fit_text(&line, self.budget.after(4)));
    }
}

/// Announce the start of a composition.
pub fn print_compose_header(name: &str, count: usize) {
    println!("\nComposing '{}' from {} skills...\n", name.bold(), count);
}

/// Summary after a composite was written.
pub fn print_compose_summary(outcome: &ComposeOutcome) {
    let budget = LineBudget::detect();
    let dir = outcome.output_dir.display().to_string();
    let absolute = outcome
        .output_dir
        .canonicalize()
        .unwrap_or_else(|_| outcome.output_dir.clone());

    println!("\n  {} Generated SKILL.md", "✓".green());
    println!("  {} Generated SOURCES.md", "✓".green());
    println!(
        "\n{} Composite skill created at: {}",
        "✓".green(),
        fit_path(&dir, budget.after(32))
    );
    println!("\nTo install:");
    println!("  ln -s {} ~/.claude/skills/{}", absolute.display(), outcome.name);
}

/// Confirmation after packaging.
pub fn print_packaged(archive: &Path, count: usize) {
    let budget = LineBudget::detect();
    println!(
        "{} Packaged {} files to: {}",
        "✓".green(),
        count,
        fit_path(&archive.display().to_string(), budget.after(30))
    );
}
