//! Command-line access to a pipeline results tree.
//!
//! Lists the subjects, methods, contrasts and run groups available under a
//! results root and reports whether expected artifacts are ready, missing or
//! still pending. Every command prints one JSON document on stdout.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use explorer::core::artifact::{ArtifactKind, ArtifactStatus, ArtifactTarget};
use explorer::core::level::{Level, ViewMode};
use explorer::core::resolver::ArtifactQuery;
use explorer::error::SelectionError;
use explorer::exit_codes;
use explorer::explorer::{Explorer, RootStatus, SelectionRequest};
use explorer::io::config::{DEFAULT_CONFIG_FILE, resolve_config};
use explorer::io::fs_tree::FsTree;
use explorer::logging;

#[derive(Parser)]
#[command(
    name = "explorer",
    version,
    about = "Browse subjects, methods, contrasts and artifacts of a results tree"
)]
struct Cli {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Results root; overrides the config file and EXPLORER_RESULTS_DIR.
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List subjects under the results root.
    Subjects,
    /// List the options of one level given the shallower selections.
    Options {
        /// subject, method, contrast or run_group.
        level: Level,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Run-group view: aggregate or per_run.
        #[arg(long)]
        view: Option<ViewMode>,
    },
    /// Resolve one artifact: exit 0 ready, 2 missing, 3 pending.
    Resolve {
        #[command(flatten)]
        contrast: ContrastArgs,
        /// Aggregate map: beta, variance, tstat or zmap_fdr.
        #[arg(long, conflicts_with = "run", required_unless_present = "run")]
        kind: Option<ArtifactKind>,
        /// Run directory for the per-run visualization.
        #[arg(long)]
        run: Option<String>,
    },
    /// Resolve every aggregate map of a contrast.
    Gallery {
        #[command(flatten)]
        contrast: ContrastArgs,
    },
    /// List the runs of a contrast with their visualization status.
    Runs {
        #[command(flatten)]
        contrast: ContrastArgs,
    },
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    contrast: Option<String>,
}

#[derive(Args)]
struct ContrastArgs {
    #[arg(long)]
    subject: String,
    #[arg(long)]
    method: String,
    #[arg(long)]
    contrast: String,
}

impl ContrastArgs {
    fn path(&self) -> [&str; 3] {
        [
            self.subject.as_str(),
            self.method.as_str(),
            self.contrast.as_str(),
        ]
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let cfg = resolve_config(&cli.config, cli.results_dir)?;
    let explorer = Explorer::from_config(&cfg)?;
    let root = explorer.root_status();

    let code = match cli.command {
        Command::Subjects => {
            let subjects = explorer.get_subjects();
            print_json(&json!({ "root": root, "subjects": subjects }))?;
            exit_codes::OK
        }
        Command::Options {
            level,
            selection,
            view,
        } => cmd_options(&explorer, level, selection, view)?,
        Command::Resolve {
            contrast,
            kind,
            run,
        } => {
            let target = match (kind, run) {
                (Some(kind), _) => ArtifactTarget::Aggregate(kind),
                (None, Some(run)) => ArtifactTarget::Run(run),
                (None, None) => anyhow::bail!("one of --kind or --run is required"),
            };
            let query = ArtifactQuery {
                subject: contrast.subject,
                method: contrast.method,
                contrast: contrast.contrast,
                target,
            };
            match explorer.resolve_query(&query) {
                Ok(status) => {
                    print_json(&json!({ "query": query, "artifact": status }))?;
                    status_code(&status)
                }
                Err(err) => invalid(&err),
            }
        }
        Command::Gallery { contrast } => match explorer.aggregate_gallery_at(contrast.path()) {
            Ok(artifacts) => {
                print_json(&json!({ "root": root, "artifacts": artifacts }))?;
                exit_codes::OK
            }
            Err(err) => invalid(&err),
        },
        Command::Runs { contrast } => match explorer.run_gallery_at(contrast.path()) {
            Ok(runs) => {
                print_json(&json!({ "root": root, "runs": runs }))?;
                exit_codes::OK
            }
            Err(err) => invalid(&err),
        },
    };

    // Malformed input stays invalid whether or not the root exists yet.
    if code != exit_codes::INVALID && root == RootStatus::NotFound {
        eprintln!("results root not found: {}", cfg.results_dir.display());
        return Ok(exit_codes::ROOT_NOT_FOUND);
    }
    Ok(code)
}

fn cmd_options(
    explorer: &Explorer<FsTree>,
    level: Level,
    selection: SelectionArgs,
    view: Option<ViewMode>,
) -> Result<i32> {
    let request = SelectionRequest {
        subject: selection.subject,
        method: selection.method,
        contrast: selection.contrast,
        run_group: None,
        view,
    };
    match explorer.get_options(level, &request) {
        Ok(options) => {
            print_json(&options)?;
            Ok(exit_codes::OK)
        }
        Err(err) => Ok(invalid(&err)),
    }
}

fn invalid(err: &SelectionError) -> i32 {
    eprintln!("{err}");
    exit_codes::INVALID
}

fn status_code(status: &ArtifactStatus) -> i32 {
    match status {
        ArtifactStatus::Ready { .. } => exit_codes::OK,
        ArtifactStatus::Missing => exit_codes::MISSING,
        ArtifactStatus::Pending => exit_codes::PENDING,
    }
}

/// Print `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolve_with_kind() {
        let cli = Cli::parse_from([
            "explorer",
            "resolve",
            "--subject",
            "sub-01",
            "--method",
            "methodA",
            "--contrast",
            "contrastX",
            "--kind",
            "zmap_fdr",
        ]);
        assert!(matches!(
            cli.command,
            Command::Resolve {
                kind: Some(ArtifactKind::ZmapFdr),
                run: None,
                ..
            }
        ));
    }

    #[test]
    fn resolve_rejects_kind_and_run_together() {
        let parsed = Cli::try_parse_from([
            "explorer",
            "resolve",
            "--subject",
            "s",
            "--method",
            "m",
            "--contrast",
            "c",
            "--kind",
            "beta",
            "--run",
            "run-01",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_options_level_and_view() {
        let cli = Cli::parse_from([
            "explorer",
            "options",
            "run_group",
            "--subject",
            "sub-01",
            "--view",
            "per_run",
        ]);
        match cli.command {
            Command::Options {
                level,
                selection,
                view,
            } => {
                assert_eq!(level, Level::RunGroup);
                assert_eq!(selection.subject.as_deref(), Some("sub-01"));
                assert_eq!(view, Some(ViewMode::PerRun));
            }
            _ => panic!("expected options command"),
        }
    }

    #[test]
    fn status_codes_distinguish_missing_from_pending() {
        assert_eq!(status_code(&ArtifactStatus::Missing), exit_codes::MISSING);
        assert_eq!(status_code(&ArtifactStatus::Pending), exit_codes::PENDING);
        assert_ne!(exit_codes::MISSING, exit_codes::PENDING);
    }
}
