//! # Chanmap CLI
//!
//! Assign instrument points to PLC channels and plan their addresses.
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::Result;
use chanmap_engine::EngineConfig;
use chanmap_store::StoreBackend;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Channel assignment and address planning for PLC I/O.
#[derive(Parser, Debug)]
#[command(name = "chanmap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file.
    #[arg(short, long, global = true, env = "CHANMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Store backend, overriding the configuration.
    #[arg(long, global = true, value_parser = parse_backend)]
    store: Option<StoreBackend>,

    /// Store file path, overriding the configuration.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn parse_backend(raw: &str) -> Result<StoreBackend, String> {
    raw.parse().map_err(|e: chanmap_store::StoreError| e.to_string())
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Project management.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Point catalog management.
    Points {
        #[command(subcommand)]
        command: PointsCommand,
    },
    /// Assignment scheme management.
    Scheme {
        #[command(subcommand)]
        command: SchemeCommand,
    },
    /// List configured channels, optionally with availability in a scheme.
    Channels {
        /// Only this channel type.
        #[arg(long = "type")]
        signal_type: Option<String>,
        /// Project for availability.
        #[arg(long, requires = "scheme")]
        project: Option<String>,
        /// Scheme for availability.
        #[arg(long, requires = "project")]
        scheme: Option<String>,
    },
    /// Assign a point to a channel.
    Assign {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
        /// Point id.
        point: String,
        /// Channel id, e.g. AI-01.
        channel: String,
    },
    /// Remove a point's assignment.
    Unassign {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
        /// Point id.
        point: String,
    },
    /// Assign every unassigned point to free channels of its type.
    AutoAssign {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
        /// Only points of this signal type.
        #[arg(long = "type")]
        signal_type: Option<String>,
        /// Skip channels below this one for its type.
        #[arg(long)]
        start: Option<String>,
    },
    /// Points without an assignment.
    Unassigned {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
        /// Only points of this signal type.
        #[arg(long = "type")]
        signal_type: Option<String>,
    },
    /// Scheme progress summary.
    Overview {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
    },
    /// Check a scheme for conflicts and drift.
    Validate {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
    },
    /// Suggest channels for all unassigned points.
    Suggest {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
    },
    /// Assignment counts of a scheme.
    Stats {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
    },
    /// Plan internal and external addresses for a scheme.
    Plan {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
        /// Auxiliary rule preset instead of the configured table.
        #[arg(long, value_enum)]
        rules: Option<RulePreset>,
    },
    /// Translate internal address tokens to external bus addresses.
    Translate {
        /// Tokens such as %MD320 or %MX20.0.
        #[arg(required = true)]
        addresses: Vec<String>,
    },
}

/// Project subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum ProjectCommand {
    /// Create a project.
    Create {
        /// Project name.
        name: String,
        /// Description.
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List projects.
    List,
    /// Delete a project and all its schemes.
    Delete {
        /// Project id.
        project: String,
    },
}

/// Point catalog subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum PointsCommand {
    /// Replace a project's points with a JSON array of points.
    Import {
        /// Project id.
        project: String,
        /// JSON file.
        file: PathBuf,
    },
}

/// Scheme subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum SchemeCommand {
    /// Create a scheme.
    Create {
        /// Project id.
        project: String,
        /// Scheme name.
        name: String,
        /// Description.
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List a project's schemes.
    List {
        /// Project id.
        project: String,
    },
    /// Delete a scheme.
    Delete {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
    },
    /// Remove every assignment of a scheme.
    Clear {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
    },
    /// Replace all assignments from a JSON object of point id to channel id.
    Replace {
        /// Project id.
        project: String,
        /// Scheme id.
        scheme: String,
        /// JSON file.
        file: PathBuf,
    },
}

/// Built-in auxiliary rule tables.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RulePreset {
    /// Analog inputs get setpoints, alarms, and maintenance addresses.
    Standard,
    /// Standard plus maintenance addresses on analog outputs.
    OutputMaintenance,
    /// No auxiliary addresses.
    Empty,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::from_env()?,
    };
    if let Some(backend) = args.store {
        config.store.backend = backend;
    }
    if let Some(path) = &args.db_path {
        config.store.path.clone_from(path);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.store.backend,
        "Starting chanmap"
    );

    commands::run(args.command, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_auto_assign_with_options() {
        let args = Args::try_parse_from([
            "chanmap",
            "--store",
            "memory",
            "auto-assign",
            "proj",
            "scheme",
            "--type",
            "AI",
            "--start",
            "AI-05",
        ])
        .unwrap();

        assert_eq!(args.store, Some(StoreBackend::Memory));
        match args.command {
            Command::AutoAssign {
                signal_type, start, ..
            } => {
                assert_eq!(signal_type.as_deref(), Some("AI"));
                assert_eq!(start.as_deref(), Some("AI-05"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Args::try_parse_from(["chanmap", "--store", "redis", "project", "list"]).is_err());
    }

    #[test]
    fn plan_rule_presets() {
        let args = Args::try_parse_from([
            "chanmap",
            "plan",
            "proj",
            "scheme",
            "--rules",
            "output-maintenance",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Plan {
                rules: Some(RulePreset::OutputMaintenance),
                ..
            }
        ));
    }
}
