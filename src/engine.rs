//! Argument parsing and action dispatch
//!
//! [`CommandTree::execute`] walks an argument vector token by token. Option tokens
//! (`--id` or `-s`) select options on the current command, bare tokens fill the
//! selected option's parameters in declared order, `id:value` tokens fill them by
//! name, and a token naming a subcommand descends the tree. Once the arguments are
//! consumed, the actions of every command on the descent path run parent first.
//!
//! Parse and action failures never escape `execute`: they are written to the console
//! together with the help of the command being parsed when the failure happened, and
//! returned in the [`ExecutionReport`].
//!
//! Parsing mutates the tree (option selection, parameter values, execution order), so
//! a tree serves one invocation at a time. Clone the tree for concurrent use.

use log::{debug, warn};
use thiserror::Error;

use crate::audit::audit;
use crate::commands::command::{ActionError, Command};
use crate::commands::option::{CommandOption, HELP_OPTION_ID};
use crate::commands::parameter::ValueError;
use crate::commands::tree::CommandTree;
use crate::console::Console;
use crate::help;

/// Separates a parameter id from its value in named form
pub const PARAMETER_DELIMITER: char = ':';

/// Errors caused by the argument vector
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid option '{token}' for command: {command}")]
    InvalidOption { command: String, token: String },
    #[error("Invalid parameter '{parameter}' for option: {option}")]
    InvalidParameter { option: String, parameter: String },
    #[error("Parameter value '{value}' is out of bound for option: {option}")]
    OutOfBound { option: String, value: String },
    #[error("Parameter '{parameter}' is already set for option: {option}")]
    ParameterAlreadySet { option: String, parameter: String },
    #[error("Required parameters [{}] is missing for option: {option}", .parameters.join(", "))]
    MissingParameters {
        option: String,
        parameters: Vec<String>,
    },
    #[error("Parameters cannot appear without a preceding option: {token}")]
    ParameterWithoutOption { token: String },
    #[error("Invalid value for parameter '{parameter}' of option {option}: {source}")]
    InvalidValue {
        option: String,
        parameter: String,
        #[source]
        source: ValueError,
    },
    #[error("Command '{0}' requires a subcommand")]
    SubcommandRequired(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Anything that aborts an invocation
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Command '{command}' failed: {source}")]
    Action {
        command: String,
        #[source]
        source: ActionError,
    },
}

/// Settings for a single invocation
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Report audit findings before parsing
    pub audit: bool,
    /// Start parsing at this command instead of the root
    pub entry: Option<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            audit: true,
            entry: None,
        }
    }
}

/// What an invocation did
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Ids of commands whose actions ran, in order
    pub executed: Vec<String>,
    /// The command whose help was written, on `--help` or after an error
    pub help_for: Option<String>,
    pub error: Option<ExecutionError>,
    pub audit: Vec<String>,
}

impl ExecutionReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The view of a command handed to its action
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    tree: &'a CommandTree,
    command: &'a Command,
}

impl<'a> Invocation<'a> {
    #[must_use]
    pub fn new(tree: &'a CommandTree, command: &'a Command) -> Self {
        Self { tree, command }
    }

    #[must_use]
    pub fn command(&self) -> &'a Command {
        self.command
    }

    #[must_use]
    pub fn id(&self) -> &'a str {
        &self.command.id
    }

    #[must_use]
    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    #[must_use]
    pub fn is_selected(&self, option: &str) -> bool {
        self.command.option(option).is_some_and(CommandOption::is_selected)
    }

    /// The value bound to a parameter of a selected option
    #[must_use]
    pub fn value(&self, option: &str, parameter: &str) -> Option<&'a str> {
        self.command
            .option(option)
            .filter(|o| o.is_selected())
            .and_then(|o| o.value(parameter))
    }

    pub fn selected_options(&self) -> impl Iterator<Item = &'a CommandOption> + use<'a> {
        self.command.selected_options()
    }
}

struct ParseState {
    last_command: String,
    last_option: Option<String>,
    to_execute: Vec<String>,
    help: bool,
}

impl ParseState {
    fn new(entry: &str) -> Self {
        ParseState {
            last_command: entry.to_string(),
            last_option: None,
            to_execute: vec![entry.to_string()],
            help: false,
        }
    }
}

impl CommandTree {
    /// Parse `args` from the root command and run the resulting actions.
    pub fn execute<S: AsRef<str>>(
        &mut self,
        args: &[S],
        console: &mut dyn Console,
    ) -> ExecutionReport {
        self.execute_with(args, console, &RunSettings::default())
    }

    /// Parse `args` and run the resulting actions with explicit settings.
    pub fn execute_with<S: AsRef<str>>(
        &mut self,
        args: &[S],
        console: &mut dyn Console,
        settings: &RunSettings,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        if settings.audit {
            report.audit = audit(self);
            for message in &report.audit {
                warn!("{message}");
                console.write_line(&format!("Warning: {message}"));
            }
        }

        self.reset_state();
        let entry = settings
            .entry
            .clone()
            .unwrap_or_else(|| self.root_id().to_string());
        let (state, result) = if let Some(command) = self.get_mut(&entry) {
            command.execution_order = Some(0);
            let mut state = ParseState::new(&entry);
            let result = self.parse(&mut state, args).map_err(ExecutionError::from);
            (state, result)
        } else {
            (
                ParseState::new(self.root_id()),
                Err(ParseError::UnknownCommand(entry).into()),
            )
        };

        let result = match result {
            Ok(()) if state.help => {
                debug!("Help requested for '{}'", state.last_command);
                console.write_line(&help::render(self, &state.last_command));
                report.help_for = Some(state.last_command.clone());
                return report;
            }
            Ok(()) => self.run(&state, console, &mut report.executed),
            Err(e) => Err(e),
        };

        if let Err(error) = result {
            debug!("Invocation failed at '{}': {error}", state.last_command);
            console.write_line(&help::render_error(
                &error.to_string(),
                console.supports_color(),
            ));
            console.write_line("");
            console.write_line(&help::render(self, &state.last_command));
            report.help_for = Some(state.last_command);
            report.error = Some(error);
        }
        report
    }

    fn reset_state(&mut self) {
        for command in self.commands_mut() {
            command.reset();
        }
    }

    fn option_mut(&mut self, command: &str, option: &str) -> Option<&mut CommandOption> {
        self.get_mut(command).and_then(|c| c.option_mut(option))
    }

    fn parse<S: AsRef<str>>(
        &mut self,
        state: &mut ParseState,
        args: &[S],
    ) -> Result<(), ParseError> {
        for arg in args {
            let token = arg.as_ref();
            if token.starts_with('-') {
                let option = self.resolve_option(&state.last_command, token)?;
                self.check_required(state)?;
                if let Some(command) = self.get_mut(&state.last_command) {
                    command.select(&option);
                }
                debug!("Selected option '{option}' of '{}'", state.last_command);
                let is_help = option == HELP_OPTION_ID;
                state.last_option = Some(option);
                if is_help {
                    state.help = true;
                    return Ok(());
                }
            } else if let Some(sub) = self
                .find_subcommand(&state.last_command, token)
                .map(|c| c.id.clone())
            {
                self.check_required(state)?;
                state.last_option = None;
                let order = self
                    .get(&state.last_command)
                    .and_then(Command::execution_order)
                    .unwrap_or(0)
                    + 1;
                if let Some(command) = self.get_mut(&sub) {
                    command.execution_order = Some(order);
                }
                debug!("Descending into '{sub}' (order {order})");
                state.to_execute.push(sub.clone());
                state.last_command = sub;
            } else if token.trim().is_empty() {
                continue;
            } else if let Some((name, value)) = token.split_once(PARAMETER_DELIMITER) {
                self.bind_named(state, token, name, value)?;
            } else {
                self.bind_positional(state, token)?;
            }
        }

        self.check_required(state)?;
        if self
            .get(&state.last_command)
            .is_some_and(|c| c.requires_subcommand)
        {
            return Err(ParseError::SubcommandRequired(state.last_command.clone()));
        }
        Ok(())
    }

    fn resolve_option(&self, command: &str, token: &str) -> Result<String, ParseError> {
        let Some(cmd) = self.get(command) else {
            return Err(ParseError::UnknownCommand(command.to_string()));
        };
        let found = if let Some(id) = token.strip_prefix("--") {
            cmd.option(id)
        } else {
            let mut chars = token[1..].chars();
            match (chars.next(), chars.next()) {
                (Some(shortcut), None) => cmd.option_by_shortcut(shortcut),
                _ => None,
            }
        };
        found
            .map(|o| o.id.clone())
            .ok_or_else(|| ParseError::InvalidOption {
                command: command.to_string(),
                token: token.to_string(),
            })
    }

    /// Fail if the pending option still has unbound required parameters
    fn check_required(&self, state: &ParseState) -> Result<(), ParseError> {
        let Some(option) = &state.last_option else {
            return Ok(());
        };
        let missing: Vec<String> = self
            .get(&state.last_command)
            .and_then(|c| c.option(option))
            .map(|o| o.missing_required().into_iter().map(String::from).collect())
            .unwrap_or_default();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ParseError::MissingParameters {
                option: option.clone(),
                parameters: missing,
            })
        }
    }

    fn bind_named(
        &mut self,
        state: &ParseState,
        token: &str,
        name: &str,
        value: &str,
    ) -> Result<(), ParseError> {
        let Some(option_id) = &state.last_option else {
            return Err(ParseError::ParameterWithoutOption {
                token: token.to_string(),
            });
        };
        let parameter = self
            .option_mut(&state.last_command, option_id)
            .and_then(|o| o.parameter_mut(name))
            .ok_or_else(|| ParseError::InvalidParameter {
                option: option_id.clone(),
                parameter: name.to_string(),
            })?;
        if parameter.is_set() {
            return Err(ParseError::ParameterAlreadySet {
                option: option_id.clone(),
                parameter: name.to_string(),
            });
        }
        parameter
            .set_data(value)
            .map_err(|source| ParseError::InvalidValue {
                option: option_id.clone(),
                parameter: name.to_string(),
                source,
            })
    }

    fn bind_positional(&mut self, state: &ParseState, token: &str) -> Result<(), ParseError> {
        let Some(option_id) = &state.last_option else {
            return Err(ParseError::ParameterWithoutOption {
                token: token.to_string(),
            });
        };
        let parameter = self
            .option_mut(&state.last_command, option_id)
            .and_then(CommandOption::next_unset_parameter)
            .ok_or_else(|| ParseError::OutOfBound {
                option: option_id.clone(),
                value: token.to_string(),
            })?;
        let parameter_id = parameter.id.clone();
        parameter
            .set_data(token)
            .map_err(|source| ParseError::InvalidValue {
                option: option_id.clone(),
                parameter: parameter_id,
                source,
            })
    }

    fn run(
        &self,
        state: &ParseState,
        console: &mut dyn Console,
        executed: &mut Vec<String>,
    ) -> Result<(), ExecutionError> {
        let mut chain: Vec<&Command> = state
            .to_execute
            .iter()
            .filter_map(|id| self.get(id))
            .collect();
        chain.sort_by_key(|c| c.execution_order.unwrap_or(0));
        for command in chain {
            let Some(action) = &command.action else {
                debug!("Command '{}' has no action", command.id);
                continue;
            };
            debug!("Running action of '{}'", command.id);
            action
                .call(&Invocation::new(self, command), console)
                .map_err(|source| ExecutionError::Action {
                    command: command.id.clone(),
                    source,
                })?;
            executed.push(command.id.clone());
        }
        Ok(())
    }
}
