//! Identifier and description rules shared by every named entity

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub const MIN_DESCRIPTION_LENGTH: usize = 3;
pub const MAX_DESCRIPTION_LENGTH: usize = 300;

static COMMAND_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*(?:\.[a-z][a-z0-9]*(?:-[a-z0-9]+)*)*$")
        .expect("command id pattern is valid")
});
static KEBAB_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$").expect("kebab id pattern is valid")
});
static PARAMETER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("parameter id pattern is valid")
});

/// The kind of entity an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Command,
    Option,
    Group,
    Parameter,
}

impl EntityKind {
    fn pattern(self) -> &'static Regex {
        match self {
            EntityKind::Command => &COMMAND_ID,
            EntityKind::Option | EntityKind::Group => &KEBAB_ID,
            EntityKind::Parameter => &PARAMETER_ID,
        }
    }

    #[must_use]
    pub fn max_id_length(self) -> usize {
        match self {
            EntityKind::Command => 128,
            EntityKind::Option | EntityKind::Group | EntityKind::Parameter => 48,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Command => "command",
            EntityKind::Option => "option",
            EntityKind::Group => "group",
            EntityKind::Parameter => "parameter",
        };
        f.write_str(name)
    }
}

/// Errors raised while building commands, options, groups and parameters
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid {kind} id '{id}': must match {pattern}")]
    InvalidId {
        kind: EntityKind,
        id: String,
        pattern: String,
    },
    #[error("The {kind} id '{id}' is longer than {max} characters")]
    IdTooLong {
        kind: EntityKind,
        id: String,
        max: usize,
    },
    #[error("The {kind} '{id}' has no description")]
    MissingDescription { kind: EntityKind, id: String },
    #[error("The description of {kind} '{id}' must be between {min} and {max} characters (got {len})")]
    DescriptionLength {
        kind: EntityKind,
        id: String,
        min: usize,
        max: usize,
        len: usize,
    },
    #[error("Parameter '{parameter}' has an invalid length range {min}..={max}")]
    LengthRange {
        parameter: String,
        min: usize,
        max: usize,
    },
    #[error("Invalid pattern `{pattern}` for parameter '{parameter}': {source}")]
    Pattern {
        parameter: String,
        pattern: String,
        source: regex::Error,
    },
    #[error(
        "Parameter '{parameter}' of option '{option}' has order {order}, which does not follow {previous}"
    )]
    ParameterOrder {
        option: String,
        parameter: String,
        order: u32,
        previous: u32,
    },
    #[error("Required parameter '{parameter}' of option '{option}' is declared after an optional one")]
    RequiredAfterOptional { option: String, parameter: String },
    #[error("Option '{option}' declares parameter '{parameter}' twice")]
    DuplicateParameter { option: String, parameter: String },
    #[error("Invalid shortcut '{shortcut}' for option '{option}': must be a single letter")]
    InvalidShortcut { option: String, shortcut: String },
    #[error("Shortcut '{shortcut}' is reserved for help and cannot be used by option '{option}'")]
    ReservedShortcut { option: String, shortcut: char },
    #[error("Command '{command}' has more than one option with shortcut '{shortcut}'")]
    DuplicateShortcut { command: String, shortcut: char },
    #[error("Command '{command}' declares option '{option}' twice")]
    DuplicateOption { command: String, option: String },
    #[error("Command '{command}' declares group '{group}' twice")]
    DuplicateGroup { command: String, group: String },
}

/// Check an identifier against the pattern and length limit of its entity kind.
///
/// # Errors
///
/// Returns `ValidationError::InvalidId` or `ValidationError::IdTooLong`.
pub fn validate_id(kind: EntityKind, id: &str) -> Result<(), ValidationError> {
    if id.chars().count() > kind.max_id_length() {
        return Err(ValidationError::IdTooLong {
            kind,
            id: id.to_string(),
            max: kind.max_id_length(),
        });
    }
    let pattern = kind.pattern();
    if !pattern.is_match(id) {
        return Err(ValidationError::InvalidId {
            kind,
            id: id.to_string(),
            pattern: pattern.as_str().to_string(),
        });
    }
    Ok(())
}

/// Check a description for presence and length, returning it trimmed.
///
/// # Errors
///
/// Returns `ValidationError::MissingDescription` for an absent or blank description,
/// or `ValidationError::DescriptionLength` when it is too short or too long.
pub fn validate_description(
    kind: EntityKind,
    id: &str,
    description: Option<&str>,
) -> Result<String, ValidationError> {
    let description = description.map(str::trim).unwrap_or_default();
    if description.is_empty() {
        return Err(ValidationError::MissingDescription {
            kind,
            id: id.to_string(),
        });
    }
    let len = description.chars().count();
    if !(MIN_DESCRIPTION_LENGTH..=MAX_DESCRIPTION_LENGTH).contains(&len) {
        return Err(ValidationError::DescriptionLength {
            kind,
            id: id.to_string(),
            min: MIN_DESCRIPTION_LENGTH,
            max: MAX_DESCRIPTION_LENGTH,
            len,
        });
    }
    Ok(description.to_string())
}
