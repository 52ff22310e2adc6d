use std::collections::HashSet;

use crate::commands::parameter::Parameter;
use crate::commands::validate::{EntityKind, ValidationError, validate_description, validate_id};

pub const HELP_OPTION_ID: &str = "help";
pub const HELP_SHORTCUT: char = 'h';
pub const HELP_DESCRIPTION: &str = "Show help for this command";

/// A flag accepted by a command, optionally carrying parameters
#[derive(Debug, Clone)]
pub struct CommandOption {
    pub id: String,
    pub description: String,
    pub shortcut: Option<char>,
    pub group: Option<String>,
    parameters: Vec<Parameter>,
    pub(crate) selected: bool,
}

impl CommandOption {
    /// The reserved option every command owns
    #[must_use]
    pub fn help() -> Self {
        CommandOption {
            id: HELP_OPTION_ID.to_string(),
            description: HELP_DESCRIPTION.to_string(),
            shortcut: Some(HELP_SHORTCUT),
            group: None,
            parameters: Vec::new(),
            selected: false,
        }
    }

    #[must_use]
    pub fn is_help(&self) -> bool {
        self.id == HELP_OPTION_ID
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Parameters in declared order
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub(crate) fn parameter_mut(&mut self, id: &str) -> Option<&mut Parameter> {
        self.parameters.iter_mut().find(|p| p.id == id)
    }

    /// The first parameter that has no value yet
    pub(crate) fn next_unset_parameter(&mut self) -> Option<&mut Parameter> {
        self.parameters.iter_mut().find(|p| !p.is_set())
    }

    /// The bound value of a parameter
    #[must_use]
    pub fn value(&self, parameter: &str) -> Option<&str> {
        self.parameter(parameter).and_then(Parameter::data)
    }

    /// Ids of required parameters that have not been bound
    #[must_use]
    pub fn missing_required(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required && !p.is_set())
            .map(|p| p.id.as_str())
            .collect()
    }

    pub(crate) fn reset(&mut self) {
        self.selected = false;
        for parameter in &mut self.parameters {
            parameter.clear();
        }
    }
}

/// Consuming builder for [`CommandOption`]
#[derive(Debug, Clone, Default)]
pub struct OptionBuilder {
    id: String,
    description: Option<String>,
    shortcut: Option<String>,
    group: Option<String>,
    parameters: Vec<Parameter>,
}

impl OptionBuilder {
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
    pub fn shortcut(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut.to_string());
        self
    }

    /// Set the shortcut from text, as found in schema files. Anything other than
    /// one letter is rejected by `build`.
    #[must_use]
    pub fn shortcut_str(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attach a built parameter. Parameters must be added in ascending order.
    #[must_use]
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Validate the accumulated fields and produce the option.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an invalid id or description, a malformed or
    /// reserved shortcut, an invalid group id, or parameters that are out of order,
    /// duplicated, or required after an optional one.
    pub fn build(self) -> Result<CommandOption, ValidationError> {
        validate_id(EntityKind::Option, &self.id)?;
        let description =
            validate_description(EntityKind::Option, &self.id, self.description.as_deref())?;
        let shortcut = self
            .shortcut
            .map(|s| parse_shortcut(&self.id, &s))
            .transpose()?;
        if let Some(group) = &self.group {
            validate_id(EntityKind::Group, group)?;
        }
        check_parameters(&self.id, &self.parameters)?;
        Ok(CommandOption {
            id: self.id,
            description,
            shortcut,
            group: self.group,
            parameters: self.parameters,
            selected: false,
        })
    }
}

fn parse_shortcut(option: &str, shortcut: &str) -> Result<char, ValidationError> {
    let mut chars = shortcut.chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => c,
        _ => {
            return Err(ValidationError::InvalidShortcut {
                option: option.to_string(),
                shortcut: shortcut.to_string(),
            });
        }
    };
    if letter == HELP_SHORTCUT && option != HELP_OPTION_ID {
        return Err(ValidationError::ReservedShortcut {
            option: option.to_string(),
            shortcut: letter,
        });
    }
    Ok(letter)
}

fn check_parameters(option: &str, parameters: &[Parameter]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    let mut previous: Option<&Parameter> = None;
    for parameter in parameters {
        if !seen.insert(parameter.id.as_str()) {
            return Err(ValidationError::DuplicateParameter {
                option: option.to_string(),
                parameter: parameter.id.clone(),
            });
        }
        if let Some(prev) = previous {
            if parameter.order <= prev.order {
                return Err(ValidationError::ParameterOrder {
                    option: option.to_string(),
                    parameter: parameter.id.clone(),
                    order: parameter.order,
                    previous: prev.order,
                });
            }
            if parameter.required && !prev.required {
                return Err(ValidationError::RequiredAfterOptional {
                    option: option.to_string(),
                    parameter: parameter.id.clone(),
                });
            }
        }
        previous = Some(parameter);
    }
    Ok(())
}
