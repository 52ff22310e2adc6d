use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::commands::group::Group;
use crate::commands::option::CommandOption;
use crate::commands::validate::{EntityKind, ValidationError, validate_description, validate_id};
use crate::console::Console;
use crate::engine::Invocation;

/// Error type returned by command actions
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

type ActionFn = dyn Fn(&Invocation<'_>, &mut dyn Console) -> Result<(), ActionError> + Send + Sync;

/// The callback run when a command is invoked
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl Action {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&Invocation<'_>, &mut dyn Console) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Action(Arc::new(action))
    }

    pub(crate) fn call(
        &self,
        invocation: &Invocation<'_>,
        console: &mut dyn Console,
    ) -> Result<(), ActionError> {
        (self.0)(invocation, console)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// A node of the command tree
#[derive(Debug, Clone)]
pub struct Command {
    pub id: String,
    pub description: String,
    pub requires_subcommand: bool,
    options: BTreeMap<String, CommandOption>,
    groups: BTreeMap<String, Group>,
    pub(crate) parent: Option<String>,
    pub(crate) subcommands: Vec<String>,
    pub(crate) action: Option<Action>,
    pub(crate) execution_order: Option<usize>,
}

impl Command {
    /// The last segment of the id, which is what users type to reach this command
    #[must_use]
    pub fn name(&self) -> &str {
        local_name(&self.id)
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Ids of direct subcommands, in insertion order
    #[must_use]
    pub fn subcommands(&self) -> &[String] {
        &self.subcommands
    }

    pub fn options(&self) -> impl Iterator<Item = &CommandOption> {
        self.options.values()
    }

    #[must_use]
    pub fn option(&self, id: &str) -> Option<&CommandOption> {
        self.options.get(id)
    }

    pub(crate) fn option_mut(&mut self, id: &str) -> Option<&mut CommandOption> {
        self.options.get_mut(id)
    }

    #[must_use]
    pub fn option_by_shortcut(&self, shortcut: char) -> Option<&CommandOption> {
        self.options.values().find(|o| o.shortcut == Some(shortcut))
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn selected_options(&self) -> impl Iterator<Item = &CommandOption> {
        self.options.values().filter(|o| o.is_selected())
    }

    #[must_use]
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Position in the current invocation chain, set while parsing
    #[must_use]
    pub fn execution_order(&self) -> Option<usize> {
        self.execution_order
    }

    /// Mark an option selected, clearing whichever option of the same group was
    /// selected before it.
    pub(crate) fn select(&mut self, option: &str) {
        let siblings: Vec<String> = self
            .options
            .get(option)
            .and_then(|o| o.group.as_deref())
            .and_then(|g| self.groups.get(g))
            .map(|g| g.members().to_vec())
            .unwrap_or_default();
        for sibling in siblings.iter().filter(|s| s.as_str() != option) {
            if let Some(o) = self.options.get_mut(sibling) {
                o.selected = false;
            }
        }
        if let Some(o) = self.options.get_mut(option) {
            o.selected = true;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.execution_order = None;
        for option in self.options.values_mut() {
            option.reset();
        }
    }
}

/// The last dot-separated segment of a command id
#[must_use]
pub fn local_name(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

/// Consuming builder for [`Command`]. Every built command owns the reserved
/// `help` option unless a user-defined `help` option replaces it.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    id: String,
    description: Option<String>,
    requires_subcommand: bool,
    options: Vec<CommandOption>,
    groups: Vec<String>,
    action: Option<Action>,
}

impl CommandBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn requires_subcommand(mut self, requires: bool) -> Self {
        self.requires_subcommand = requires;
        self
    }

    #[must_use]
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    #[must_use]
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Invocation<'_>, &mut dyn Console) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.action = Some(Action::new(action));
        self
    }

    /// Validate the accumulated fields and produce the command.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an invalid id or description, an invalid or
    /// duplicated group, or options that share an id or a shortcut.
    pub fn build(self) -> Result<Command, ValidationError> {
        validate_id(EntityKind::Command, &self.id)?;
        let description =
            validate_description(EntityKind::Command, &self.id, self.description.as_deref())?;

        let mut groups = BTreeMap::new();
        for id in self.groups {
            let group = Group::new(id)?;
            if groups.contains_key(&group.id) {
                return Err(ValidationError::DuplicateGroup {
                    command: self.id,
                    group: group.id,
                });
            }
            groups.insert(group.id.clone(), group);
        }

        let mut options = BTreeMap::new();
        if !self.options.iter().any(CommandOption::is_help) {
            let help = CommandOption::help();
            options.insert(help.id.clone(), help);
        }
        for option in self.options {
            if options.contains_key(&option.id) {
                return Err(ValidationError::DuplicateOption {
                    command: self.id,
                    option: option.id,
                });
            }
            if let Some(shortcut) = option.shortcut
                && options.values().any(|o: &CommandOption| o.shortcut == Some(shortcut))
            {
                return Err(ValidationError::DuplicateShortcut {
                    command: self.id,
                    shortcut,
                });
            }
            if let Some(group) = option.group.as_deref().and_then(|g| groups.get_mut(g)) {
                group.add_member(&option.id);
            }
            options.insert(option.id.clone(), option);
        }

        Ok(Command {
            id: self.id,
            description,
            requires_subcommand: self.requires_subcommand,
            options,
            groups,
            parent: None,
            subcommands: Vec::new(),
            action: self.action,
            execution_order: None,
        })
    }
}
