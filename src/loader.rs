//! Builds a validated [`CommandTree`] from a [`Schema`]

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::commands::command::{Command, CommandBuilder};
use crate::commands::option::{CommandOption, OptionBuilder};
use crate::commands::parameter::{Parameter, ParameterBuilder};
use crate::commands::tree::CommandTree;
use crate::config_file::{Schema, SchemaCommand, SchemaError, SchemaOption, SchemaParameter};

/// Build a command tree from a schema. Nothing is returned unless every record
/// is valid and attached.
///
/// # Errors
///
/// Returns `SchemaError` for an empty schema, duplicate ids, a missing or repeated
/// root, a parent cycle, orphaned records, or any entity that fails validation.
pub fn load(schema: Schema) -> Result<CommandTree, SchemaError> {
    let Schema {
        title,
        version,
        commands,
    } = schema;
    if commands.is_empty() {
        return Err(SchemaError::Empty);
    }
    check_duplicates(&commands)?;
    let root = find_root(&commands)?;
    let parents = resolve_parents(&commands);
    check_cycles(&commands, &parents)?;

    let mut tree = CommandTree::new(build_command(root)?);
    attach_children(&mut tree, &commands, &parents, &root.id)?;
    check_orphans(&tree, &commands)?;

    debug!(
        "Loaded schema {} with {} commands",
        title.as_deref().unwrap_or("(untitled)"),
        tree.len()
    );
    tree.title = title;
    tree.version = version;
    Ok(tree)
}

fn check_duplicates(records: &[SchemaCommand]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for record in records {
        if !seen.insert(record.id.as_str()) && !duplicates.contains(&record.id) {
            duplicates.push(record.id.clone());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::DuplicateIds(duplicates))
    }
}

fn find_root(records: &[SchemaCommand]) -> Result<&SchemaCommand, SchemaError> {
    let roots: Vec<&SchemaCommand> = records.iter().filter(|r| r.root).collect();
    match roots.as_slice() {
        [] => Err(SchemaError::NoRoot),
        [root] => Ok(*root),
        _ => Err(SchemaError::MultipleRoots(
            roots.iter().map(|r| r.id.clone()).collect(),
        )),
    }
}

/// Map each non-root record to its parent id: the explicit `parent`, or the id
/// without its last segment.
fn resolve_parents(records: &[SchemaCommand]) -> HashMap<&str, &str> {
    let mut parents = HashMap::new();
    for record in records {
        if record.root {
            if let Some(parent) = &record.parent {
                warn!("Ignoring parent '{parent}' of root command '{}'", record.id);
            }
            continue;
        }
        let parent = record
            .parent
            .as_deref()
            .or_else(|| record.id.rsplit_once('.').map(|(parent, _)| parent));
        if let Some(parent) = parent {
            parents.insert(record.id.as_str(), parent);
        }
    }
    parents
}

fn check_cycles(
    records: &[SchemaCommand],
    parents: &HashMap<&str, &str>,
) -> Result<(), SchemaError> {
    for record in records {
        let start = record.id.as_str();
        let mut seen = HashSet::new();
        let mut current = parents.get(start).copied();
        while let Some(id) = current {
            if id == start {
                return Err(SchemaError::Cycle(start.to_string()));
            }
            if !seen.insert(id) {
                break;
            }
            current = parents.get(id).copied();
        }
    }
    Ok(())
}

fn attach_children(
    tree: &mut CommandTree,
    records: &[SchemaCommand],
    parents: &HashMap<&str, &str>,
    parent: &str,
) -> Result<(), SchemaError> {
    for record in records
        .iter()
        .filter(|r| parents.get(r.id.as_str()) == Some(&parent))
    {
        let command = build_command(record)?;
        tree.insert_subcommand(parent, command).map_err(|e| SchemaError::Tree {
            context: format!("subcommand '{}' of '{parent}'", record.id),
            source: e,
        })?;
        attach_children(tree, records, parents, &record.id)?;
    }
    Ok(())
}

fn check_orphans(tree: &CommandTree, records: &[SchemaCommand]) -> Result<(), SchemaError> {
    let orphans: Vec<String> = records
        .iter()
        .filter(|r| !tree.contains(&r.id))
        .map(|r| r.id.clone())
        .collect();
    if orphans.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Orphans(orphans))
    }
}

fn build_command(record: &SchemaCommand) -> Result<Command, SchemaError> {
    let mut builder =
        CommandBuilder::new(&record.id).requires_subcommand(record.require_subcommand);
    if let Some(description) = &record.description {
        builder = builder.description(description);
    }
    for group in &record.groups {
        builder = builder.group(group);
    }
    for option in &record.options {
        builder = builder.option(build_option(&record.id, option)?);
    }
    builder.build().map_err(|e| SchemaError::Invalid {
        context: format!("command '{}'", record.id),
        source: e,
    })
}

fn build_option(command: &str, record: &SchemaOption) -> Result<CommandOption, SchemaError> {
    let context = format!("option '{}' of command '{command}'", record.id);
    let mut builder = OptionBuilder::new(&record.id);
    if let Some(description) = &record.description {
        builder = builder.description(description);
    }
    if let Some(shortcut) = &record.shortcut {
        builder = builder.shortcut_str(shortcut);
    }
    if let Some(group) = &record.group {
        builder = builder.group(group);
    }
    let mut parameters: Vec<&SchemaParameter> = record.parameters.iter().collect();
    parameters.sort_by_key(|p| p.order);
    for parameter in parameters {
        builder = builder.parameter(build_parameter(&context, parameter)?);
    }
    builder
        .build()
        .map_err(|e| SchemaError::Invalid { context, source: e })
}

fn build_parameter(
    option_context: &str,
    record: &SchemaParameter,
) -> Result<Parameter, SchemaError> {
    let mut builder = ParameterBuilder::new(&record.id)
        .order(record.order)
        .required(record.required)
        .length(record.min_length, record.max_length);
    if let Some(pattern) = &record.pattern {
        builder = builder.pattern(pattern);
    }
    builder.build().map_err(|e| SchemaError::Invalid {
        context: format!("parameter '{}' of {option_context}", record.id),
        source: e,
    })
}
