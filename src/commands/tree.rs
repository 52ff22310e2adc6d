use std::collections::BTreeMap;

use log::debug;
use thiserror::Error;

use crate::commands::command::{Action, ActionError, Command, local_name};
use crate::console::Console;
use crate::engine::Invocation;

/// Errors raised while assembling a command tree
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Duplicate command id: {0}")]
    DuplicateCommand(String),
    #[error("Command '{0}' cannot be its own ancestor")]
    Cycle(String),
    #[error("The root command '{0}' cannot be attached to a parent")]
    RootAttach(String),
    #[error("Command '{parent}' already has a subcommand named '{name}'")]
    DuplicateName { parent: String, name: String },
}

/// Owns every command of a CLI, keyed by id. Parent and child links are ids.
#[derive(Debug, Clone)]
pub struct CommandTree {
    pub title: Option<String>,
    pub version: Option<String>,
    root: String,
    commands: BTreeMap<String, Command>,
}

impl CommandTree {
    #[must_use]
    pub fn new(mut root: Command) -> Self {
        root.parent = None;
        root.subcommands.clear();
        let id = root.id.clone();
        CommandTree {
            title: None,
            version: None,
            root: id.clone(),
            commands: BTreeMap::from([(id, root)]),
        }
    }

    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn root(&self) -> &Command {
        &self.commands[&self.root]
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Command> {
        self.commands.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Command> {
        self.commands.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    /// All commands in id order
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub(crate) fn commands_mut(&mut self) -> impl Iterator<Item = &mut Command> {
        self.commands.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Direct subcommands of a command, in insertion order
    pub fn subcommands(&self, id: &str) -> impl Iterator<Item = &Command> {
        self.commands
            .get(id)
            .into_iter()
            .flat_map(|c| c.subcommands.iter())
            .filter_map(|child| self.commands.get(child))
    }

    /// Ids of the ancestors of a command, nearest first
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Vec<&str> {
        let mut ancestors = Vec::new();
        let mut current = self.commands.get(id).and_then(Command::parent);
        while let Some(parent) = current {
            // A corrupt parent chain must not loop forever
            if ancestors.contains(&parent) || parent == id {
                break;
            }
            ancestors.push(parent);
            current = self.commands.get(parent).and_then(Command::parent);
        }
        ancestors
    }

    /// Local names from the root down to the command, as typed on the command line
    #[must_use]
    pub fn path(&self, id: &str) -> Vec<&str> {
        let mut path: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .map(|a| if a == self.root { a } else { local_name(a) })
            .collect();
        if let Some(command) = self.commands.get(id) {
            path.push(if command.id == self.root {
                command.id.as_str()
            } else {
                command.name()
            });
        }
        path
    }

    /// Find a direct subcommand of `parent` by local name or full id
    #[must_use]
    pub fn find_subcommand(&self, parent: &str, token: &str) -> Option<&Command> {
        self.subcommands(parent)
            .find(|child| child.id == token || child.name() == token)
    }

    fn check_sibling_name(&self, parent: &str, child: &str) -> Result<(), TreeError> {
        let name = local_name(child);
        if self
            .subcommands(parent)
            .any(|sibling| sibling.id != child && sibling.name() == name)
        {
            return Err(TreeError::DuplicateName {
                parent: parent.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: &str, id: &str) -> bool {
        candidate == id || self.ancestors(id).contains(&candidate)
    }

    /// Insert a new command below `parent`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownCommand` if the parent does not exist,
    /// `TreeError::Cycle` if the command is the parent or one of its ancestors,
    /// `TreeError::DuplicateCommand` if the id is already used elsewhere, or
    /// `TreeError::DuplicateName` if a sibling already has the same local name.
    pub fn insert_subcommand(
        &mut self,
        parent: &str,
        mut command: Command,
    ) -> Result<(), TreeError> {
        if !self.commands.contains_key(parent) {
            return Err(TreeError::UnknownCommand(parent.to_string()));
        }
        if self.commands.contains_key(&command.id) {
            if self.is_ancestor_or_self(&command.id, parent) {
                return Err(TreeError::Cycle(command.id));
            }
            return Err(TreeError::DuplicateCommand(command.id));
        }
        self.check_sibling_name(parent, &command.id)?;
        debug!("Adding subcommand '{}' to '{parent}'", command.id);
        command.parent = Some(parent.to_string());
        command.subcommands.clear();
        let id = command.id.clone();
        self.commands.insert(id.clone(), command);
        if let Some(p) = self.commands.get_mut(parent) {
            p.subcommands.push(id);
        }
        Ok(())
    }

    /// Move an existing command (and its subtree) below another parent.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownCommand` if either command does not exist,
    /// `TreeError::RootAttach` for the root, or `TreeError::Cycle` if the new
    /// parent is the command itself or one of its descendants, or
    /// `TreeError::DuplicateName` if the new parent already has a subcommand with
    /// the same local name.
    pub fn attach(&mut self, parent: &str, child: &str) -> Result<(), TreeError> {
        for id in [parent, child] {
            if !self.commands.contains_key(id) {
                return Err(TreeError::UnknownCommand(id.to_string()));
            }
        }
        if child == self.root {
            return Err(TreeError::RootAttach(child.to_string()));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle(child.to_string()));
        }
        self.check_sibling_name(parent, child)?;
        let old_parent = self.commands.get(child).and_then(|c| c.parent.clone());
        if let Some(old) = old_parent.and_then(|p| self.commands.get_mut(&p)) {
            old.subcommands.retain(|s| s != child);
        }
        if let Some(c) = self.commands.get_mut(child) {
            c.parent = Some(parent.to_string());
        }
        if let Some(p) = self.commands.get_mut(parent) {
            p.subcommands.push(child.to_string());
        }
        Ok(())
    }

    /// Bind an action to a command.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownCommand` if no command has this id.
    pub fn bind<F>(&mut self, id: &str, action: F) -> Result<(), TreeError>
    where
        F: Fn(&Invocation<'_>, &mut dyn Console) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.bind_action(id, Action::new(action))
    }

    /// Bind an already wrapped action, e.g. one shared across several commands.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownCommand` if no command has this id.
    pub fn bind_action(&mut self, id: &str, action: Action) -> Result<(), TreeError> {
        let command = self
            .commands
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownCommand(id.to_string()))?;
        command.action = Some(action);
        Ok(())
    }
}
