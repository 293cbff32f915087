//! Command line interface for Skills Lego.

pub mod output;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use lego_config::Config;
use lego_core::{package, ComposeRequest, Composer, Updater};

use output::{print_compose_header, print_compose_summary, print_packaged, ConsoleProgress};

#[derive(Parser, Debug)]
#[command(
    name = "lego",
    version,
    about = "Combine multiple agent skills into one composite skill",
    after_help = "Examples:\n  lego compose --name document-suite \\\n      --skill github.com/acme/pdf-skill --skill github.com/acme/xlsx-skill \\\n      --workflow \"Use PDF for reading documents, XLSX for spreadsheets\" \\\n      --output ./document-suite\n  lego update ./document-suite\n  lego package ./document-suite"
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file, layered over ~/.lego/config.toml and ./.lego/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a composite skill from several skills
    Compose {
        /// Name of the composite skill
        #[arg(short, long)]
        name: String,

        /// Skill identifier, e.g. github.com/owner/repo@skill (repeatable)
        #[arg(short, long = "skill", value_name = "IDENTIFIER", required = true, num_args = 1..)]
        skills: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// How the skills work together
        #[arg(short, long, default_value = "")]
        workflow: String,

        /// Description of the composite (derived from skill names if empty)
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Re-fetch every skill of an existing composite
    Update {
        /// Composite directory containing SOURCES.md
        dir: PathBuf,
    },

    /// Package a composite as a zip archive
    Package {
        /// Composite directory
        dir: PathBuf,

        /// Archive path (default: <dir name>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Default log filter for the given verbosity flags.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,lego_core=debug",
        _ => "trace",
    }
}

fn init_logging(cli: &Cli) {
    // RUST_LOG overrides the flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose, cli.quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Archive path used when `package` gets no `--output`.
pub fn default_archive_path(dir: &Path) -> PathBuf {
    let name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "composite".to_string());
    PathBuf::from(format!("{}.zip", name))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = Config::load(cli.config.as_deref())?;
    debug!("Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Compose {
            name,
            skills,
            output,
            workflow,
            description,
        } => {
            print_compose_header(&name, skills.len());
            let request = ComposeRequest {
                name: name.clone(),
                identifiers: skills,
                output_dir: output,
                workflow,
                description,
            };
            let outcome = Composer::from_config(&config)
                .compose_with_progress(&request, &ConsoleProgress::new())
                .await
                .with_context(|| format!("Failed to compose '{}'", name))?;
            print_compose_summary(&outcome);
        }

        Commands::Update { dir } => {
            let outcome = Updater::from_config(&config)
                .update_with_progress(&dir, &ConsoleProgress::new())
                .await
                .with_context(|| format!("Failed to update {}", dir.display()))?;
            print_compose_summary(&outcome);
        }

        Commands::Package { dir, output } => {
            let archive = output.unwrap_or_else(|| default_archive_path(&dir));
            let count = package(&dir, &archive)
                .with_context(|| format!("Failed to package {}", dir.display()))?;
            print_packaged(&archive, count);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compose_arguments() {
        let cli = Cli::try_parse_from([
            "lego", "compose", "-n", "suite", "--skill", "acme/a", "-s", "acme/b@x", "-o", "out",
            "-w", "a then b",
        ])
        .unwrap();
        match cli.command {
            Commands::Compose {
                name,
                skills,
                output,
                workflow,
                description,
            } => {
                assert_eq!(name, "suite");
                assert_eq!(skills, vec!["acme/a", "acme/b@x"]);
                assert_eq!(output, PathBuf::from("out"));
                assert_eq!(workflow, "a then b");
                assert!(description.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_compose_requires_skills() {
        let result = Cli::try_parse_from(["lego", "compose", "-n", "suite", "-o", "out"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lego", "update", "dir", "-vv", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(Cli::try_parse_from(["lego", "-q", "-v", "update", "dir"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0, true), "error");
        assert_eq!(log_filter(0, false), "warn");
        assert_eq!(log_filter(1, false), "info,lego_core=debug");
        assert_eq!(log_filter(3, false), "trace");
    }

    #[test]
    fn test_default_archive_path() {
        let temp_dir = TempDir::new().unwrap();
        let composite = temp_dir.path().join("document-suite");
        std::fs::create_dir(&composite).unwrap();
        assert_eq!(default_archive_path(&composite), PathBuf::from("document-suite.zip"));
        assert_eq!(
            default_archive_path(Path::new("missing/suite")),
            PathBuf::from("suite.zip")
        );
    }
}
