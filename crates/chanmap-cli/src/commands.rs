//! Command execution.

use crate::{Command, PointsCommand, ProjectCommand, RulePreset, SchemeCommand};
use anyhow::{bail, Context, Result};
use chanmap_core::{AddressTranslator, ChannelId, Point, RuleTable, SignalType};
use chanmap_engine::{AssignmentEngine, EngineConfig};
use chanmap_store::{open_store, AnyStore};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{json}");
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn open_engine(config: &EngineConfig) -> Result<AssignmentEngine<AnyStore>> {
    let store = open_store(&config.store).context("Failed to open store")?;
    Ok(AssignmentEngine::new(store, config.channel_catalog()))
}

#[derive(Serialize)]
struct Created {
    id: String,
}

#[derive(Serialize)]
struct Count {
    count: usize,
}

#[derive(Serialize)]
struct Removed {
    removed: bool,
}

#[derive(Serialize)]
struct Translation {
    internal: String,
    external: String,
}

/// Run one command against the configured store.
pub(crate) fn run(command: Command, config: &EngineConfig) -> Result<()> {
    match command {
        Command::Project { command } => run_project(command, config),
        Command::Points { command } => run_points(command, config),
        Command::Scheme { command } => run_scheme(command, config),
        Command::Channels {
            signal_type,
            project,
            scheme,
        } => {
            let engine = open_engine(config)?;
            let used: HashSet<ChannelId> = match (project, scheme) {
                (Some(project), Some(scheme)) => engine
                    .get_used_channels(&project, &scheme)?
                    .into_iter()
                    .collect(),
                _ => HashSet::new(),
            };
            let catalog = engine.catalog();
            match signal_type {
                Some(raw) => print_json(&catalog.get_channels(&SignalType::from(raw), &used)),
                None => {
                    let all: BTreeMap<String, _> = catalog
                        .get_all_channels(&used)
                        .into_iter()
                        .map(|(t, channels)| (t.to_string(), channels))
                        .collect();
                    print_json(&all)
                }
            }
        }
        Command::Assign {
            project,
            scheme,
            point,
            channel,
        } => {
            let engine = open_engine(config)?;
            print_json(&engine.assign(&project, &scheme, &point, &channel)?)
        }
        Command::Unassign {
            project,
            scheme,
            point,
        } => {
            let engine = open_engine(config)?;
            let removed = engine.unassign(&project, &scheme, &point)?;
            print_json(&Removed { removed })
        }
        Command::AutoAssign {
            project,
            scheme,
            signal_type,
            start,
        } => {
            let engine = open_engine(config)?;
            let signal_type = signal_type.map(SignalType::from);
            let summary =
                engine.auto_assign(&project, &scheme, signal_type.as_ref(), start.as_deref())?;
            print_json(&summary)
        }
        Command::Unassigned {
            project,
            scheme,
            signal_type,
        } => {
            let engine = open_engine(config)?;
            let signal_type = signal_type.map(SignalType::from);
            print_json(&engine.get_unassigned(&project, &scheme, signal_type.as_ref())?)
        }
        Command::Overview { project, scheme } => {
            let engine = open_engine(config)?;
            let Some(overview) = engine.get_overview(&project, &scheme)? else {
                bail!("Scheme {scheme} not found in project {project}");
            };
            print_json(&overview)
        }
        Command::Validate { project, scheme } => {
            let engine = open_engine(config)?;
            print_json(&engine.validate_scheme(&project, &scheme)?)
        }
        Command::Suggest { project, scheme } => {
            let engine = open_engine(config)?;
            print_json(&engine.suggest_optimal(&project, &scheme)?)
        }
        Command::Stats { project, scheme } => {
            let engine = open_engine(config)?;
            print_json(&engine.statistics(&project, &scheme)?)
        }
        Command::Plan {
            project,
            scheme,
            rules,
        } => {
            let engine = open_engine(config)?;
            let mut config = config.clone();
            match rules {
                Some(RulePreset::Standard) => config.rules = RuleTable::standard(),
                Some(RulePreset::OutputMaintenance) => {
                    config.rules = RuleTable::with_output_maintenance();
                }
                Some(RulePreset::Empty) => config.rules = RuleTable::empty(),
                None => {}
            }
            print_json(&engine.plan_addresses(&project, &scheme, config.planner())?)
        }
        Command::Translate { addresses } => {
            let translator = AddressTranslator::new(config.translator);
            let translations: Vec<Translation> = addresses
                .into_iter()
                .map(|internal| Translation {
                    external: translator.translate(&internal),
                    internal,
                })
                .collect();
            print_json(&translations)
        }
    }
}

fn run_project(command: ProjectCommand, config: &EngineConfig) -> Result<()> {
    let engine = open_engine(config)?;
    match command {
        ProjectCommand::Create { name, description } => {
            let id = engine.create_project(&name, &description)?;
            print_json(&Created { id })
        }
        ProjectCommand::List => print_json(&engine.list_projects()?),
        ProjectCommand::Delete { project } => {
            engine.delete_project(&project)?;
            print_json(&Removed { removed: true })
        }
    }
}

fn run_points(command: PointsCommand, config: &EngineConfig) -> Result<()> {
    let engine = open_engine(config)?;
    match command {
        PointsCommand::Import { project, file } => {
            let points: Vec<Point> = read_json(&file)?;
            let count = engine.import_points(&project, points)?;
            print_json(&Count { count })
        }
    }
}

fn run_scheme(command: SchemeCommand, config: &EngineConfig) -> Result<()> {
    let engine = open_engine(config)?;
    match command {
        SchemeCommand::Create {
            project,
            name,
            description,
        } => {
            let id = engine.create_scheme(&project, &name, &description)?;
            print_json(&Created { id })
        }
        SchemeCommand::List { project } => print_json(&engine.list_schemes(&project)?),
        SchemeCommand::Delete { project, scheme } => {
            engine.delete_scheme(&project, &scheme)?;
            print_json(&Removed { removed: true })
        }
        SchemeCommand::Clear { project, scheme } => {
            let count = engine.clear_assignments(&project, &scheme)?;
            print_json(&Count { count })
        }
        SchemeCommand::Replace {
            project,
            scheme,
            file,
        } => {
            let assignments: BTreeMap<String, String> = read_json(&file)?;
            let count = engine.replace_assignments(&project, &scheme, &assignments)?;
            print_json(&Count { count })
        }
    }
}
