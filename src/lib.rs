//! Core implementation of cmdtree
//!
//! cmdtree defines hierarchical command-line interfaces: a tree of named commands, each
//! exposing options with optional parameters, optionally grouped into mutually exclusive
//! sets. A tree is built either directly with the builders in [`commands`] or from a
//! declarative YAML/JSON schema file, and an argument vector is then executed against it
//! with [`commands::tree::CommandTree::execute`].

use std::path::PathBuf;

use log::debug;

use crate::commands::tree::CommandTree;
use crate::config_file::{Schema, SchemaError};

pub mod audit;
pub mod commands;
pub mod config_file;
pub mod console;
pub mod engine;
pub mod help;
pub mod loader;
pub mod logger;

/// Load a schema from a file (or auto-detect one), returning the command tree and the
/// schema file path.
///
/// # Errors
///
/// Returns `SchemaError` if the schema file is not found, cannot be parsed, or does
/// not describe a valid command tree.
pub fn load_schema(schema_file: Option<&str>) -> Result<(CommandTree, PathBuf), SchemaError> {
    let schema_path = match schema_file {
        Some(file) => {
            let schema_path = PathBuf::from(file);
            if !schema_path.exists() {
                return Err(SchemaError::SchemaNotFound(schema_path));
            }
            schema_path
        }
        None => Schema::find_schema()?,
    };
    debug!("Creating command tree from schema file: {}", schema_path.display());
    let schema = Schema::from_file(&schema_path)?;
    let tree = loader::load(schema)?;
    Ok((tree, schema_path))
}
