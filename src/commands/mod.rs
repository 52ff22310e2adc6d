//! Command tree data model
//!
//! A CLI is a tree of commands. Each command owns a set of options (flags), each option
//! owns an ordered list of parameters (value slots), and options can be bound to groups
//! that make them mutually exclusive. Entities are produced by consuming builders that
//! validate identifiers, descriptions and cross-field rules before anything is handed out.
//!
//! Commands live in a [`tree::CommandTree`] arena keyed by id, so parent links are plain
//! ids rather than references.

pub mod command;
pub mod group;
pub mod option;
pub mod parameter;
pub mod tree;
pub mod validate;
