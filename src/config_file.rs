//! Declarative schema files
//!
//! A schema file lists every command of a CLI as a flat record. The hierarchy is not
//! written down explicitly: `calc.add` is a subcommand of `calc` because of its id.

use std::path::{Path, PathBuf};

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commands::parameter::DEFAULT_MAX_LENGTH;
use crate::commands::tree::TreeError;
use crate::commands::validate::ValidationError;

/// Errors that can occur while reading a schema or building a tree from it
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("No schema file found in current directory or its parents: {0}")]
    SchemaNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unsupported schema format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("Unable to parse YAML schema file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON schema file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("The schema does not define any commands")]
    Empty,
    #[error("Duplicate command ids in schema: {}", .0.join(", "))]
    DuplicateIds(Vec<String>),
    #[error("The schema has no root command")]
    NoRoot,
    #[error("The schema has more than one root command: {}", .0.join(", "))]
    MultipleRoots(Vec<String>),
    #[error("Command '{0}' is its own ancestor")]
    Cycle(String),
    #[error("Commands without a parent in the schema: {}", .0.join(", "))]
    Orphans(Vec<String>),
    #[error("Invalid {context}: {source}")]
    Invalid {
        context: String,
        #[source]
        source: ValidationError,
    },
    #[error("Unable to attach {context}: {source}")]
    Tree {
        context: String,
        #[source]
        source: TreeError,
    },
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

/// A value slot of an option
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SchemaParameter {
    pub id: String,
    pub pattern: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    pub order: u32,
}

/// A flag of a command
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SchemaOption {
    pub id: String,
    pub description: Option<String>,
    pub shortcut: Option<String>,
    pub group: Option<String>,
    #[serde(default)]
    pub parameters: Vec<SchemaParameter>,
}

/// One command record
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SchemaCommand {
    pub id: String,
    pub description: Option<String>,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub require_subcommand: bool,
    /// Explicit parent id, for commands whose id does not extend their parent's
    pub parent: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub options: Vec<SchemaOption>,
}

/// Root structure of a schema file
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Schema {
    pub title: Option<String>,
    pub version: Option<String>,
    pub commands: Vec<SchemaCommand>,
}

/// List of schema file names searched for, in order
const FILENAMES: [&str; 3] = [".cmdtree.json", ".cmdtree.yaml", ".cmdtree.yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yaml" | "yml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

impl Schema {
    /// Loads and parses a schema file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnsupportedFormat` for an unknown extension,
    /// `SchemaError::SchemaNotFound` if the file cannot be read, or
    /// `SchemaError::Yaml`/`SchemaError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Schema, SchemaError> {
        let format = Format::from_path(file)
            .ok_or_else(|| SchemaError::UnsupportedFormat(file.to_path_buf()))?;
        let contents = std::fs::read_to_string(file)
            .map_err(|_| SchemaError::SchemaNotFound(file.to_path_buf()))?;
        debug!("Parsing {format:?} schema {}", file.display());
        let schema = match format {
            Format::Json => serde_json::from_str(&contents).map_err(|e| SchemaError::Json {
                source: e,
                path: file.to_path_buf(),
            })?,
            Format::Yaml => serde_yaml::from_str(&contents).map_err(|e| SchemaError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?,
        };
        Ok(schema)
    }

    /// Searches for a schema file in the current directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownWorkingDirectory` if the cwd cannot be determined,
    /// or `SchemaError::SchemaNotFound` if no schema file is found.
    pub fn find_schema() -> Result<PathBuf, SchemaError> {
        let cwd = std::env::current_dir()
            .map_err(|e| SchemaError::UnknownWorkingDirectory(e.to_string()))?;
        Self::find_schema_from(&cwd)
    }

    /// Searches for a schema file in `start` and its parents.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::SchemaNotFound` if no schema file is found.
    pub fn find_schema_from(start: &Path) -> Result<PathBuf, SchemaError> {
        let mut path = start.to_path_buf();
        debug!("Searching for schema file in {}", start.display());
        loop {
            for file in &FILENAMES {
                let schema_path = path.join(file);
                if schema_path.exists() {
                    info!("Found schema file: {}", schema_path.display());
                    return Ok(schema_path);
                }
            }
            if !path.pop() {
                return Err(SchemaError::SchemaNotFound(start.to_path_buf()));
            }
        }
    }

    /// JSON Schema describing the schema file format
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Schema)
    }
}
