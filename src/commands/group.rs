use crate::commands::validate::{EntityKind, ValidationError, validate_id};

/// A set of mutually exclusive options within one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    members: Vec<String>,
}

impl Group {
    /// # Errors
    ///
    /// Returns `ValidationError` if the id is not a valid group id.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        validate_id(EntityKind::Group, &id)?;
        Ok(Group {
            id,
            members: Vec::new(),
        })
    }

    /// Ids of the options bound to this group, in declaration order
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    #[must_use]
    pub fn contains(&self, option: &str) -> bool {
        self.members.iter().any(|m| m == option)
    }

    pub(crate) fn add_member(&mut self, option: &str) {
        if !self.contains(option) {
            self.members.push(option.to_string());
        }
    }
}
