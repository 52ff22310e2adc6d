use regex_cache::LazyRegex;
use thiserror::Error;

use crate::commands::validate::{EntityKind, ValidationError, validate_id};

pub const DEFAULT_MAX_LENGTH: usize = 1024;

/// Reasons a value cannot be bound to a parameter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("value '{value}' is shorter than {min} characters")]
    TooShort { value: String, min: usize },
    #[error("value '{value}' is longer than {max} characters")]
    TooLong { value: String, max: usize },
    #[error("value '{value}' does not match pattern `{pattern}`")]
    PatternMismatch { value: String, pattern: String },
}

/// A named, ordered value slot of an option
#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: String,
    pub order: u32,
    pub required: bool,
    pub min_length: usize,
    pub max_length: usize,
    pattern: Option<(String, LazyRegex)>,
    data: Option<String>,
}

impl Parameter {
    /// The source of the value pattern, if any
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(|(source, _)| source.as_str())
    }

    /// The bound value, if the parser has set one
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.data.is_some()
    }

    /// Check a value against the length bounds and pattern without binding it.
    ///
    /// # Errors
    ///
    /// Returns the first `ValueError` the value violates.
    pub fn check(&self, value: &str) -> Result<(), ValueError> {
        let len = value.chars().count();
        if len < self.min_length {
            return Err(ValueError::TooShort {
                value: value.to_string(),
                min: self.min_length,
            });
        }
        if len > self.max_length {
            return Err(ValueError::TooLong {
                value: value.to_string(),
                max: self.max_length,
            });
        }
        if let Some((source, regex)) = &self.pattern
            && !regex.is_match(value)
        {
            return Err(ValueError::PatternMismatch {
                value: value.to_string(),
                pattern: source.clone(),
            });
        }
        Ok(())
    }

    /// Validate and bind a value. Rebinding is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns a `ValueError` if the value violates the length bounds or the pattern.
    pub fn set_data(&mut self, value: &str) -> Result<(), ValueError> {
        self.check(value)?;
        self.data = Some(value.to_string());
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.data = None;
    }
}

/// Consuming builder for [`Parameter`]
#[derive(Debug, Clone)]
pub struct ParameterBuilder {
    id: String,
    order: u32,
    required: bool,
    min_length: usize,
    max_length: usize,
    pattern: Option<String>,
}

impl ParameterBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order: 0,
            required: false,
            min_length: 0,
            max_length: DEFAULT_MAX_LENGTH,
            pattern: None,
        }
    }

    #[must_use]
    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = max;
        self
    }

    #[must_use]
    pub fn length(self, min: usize, max: usize) -> Self {
        self.min_length(min).max_length(max)
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Validate the accumulated fields and produce the parameter.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an invalid id, an empty or inverted length range,
    /// or a pattern that does not compile.
    pub fn build(self) -> Result<Parameter, ValidationError> {
        validate_id(EntityKind::Parameter, &self.id)?;
        if self.max_length == 0 || self.min_length > self.max_length {
            return Err(ValidationError::LengthRange {
                parameter: self.id,
                min: self.min_length,
                max: self.max_length,
            });
        }
        let pattern = match self.pattern {
            Some(source) => {
                let regex = LazyRegex::new(&source).map_err(|e| ValidationError::Pattern {
                    parameter: self.id.clone(),
                    pattern: source.clone(),
                    source: e,
                })?;
                Some((source, regex))
            }
            None => None,
        };
        Ok(Parameter {
            id: self.id,
            order: self.order,
            required: self.required,
            min_length: self.min_length,
            max_length: self.max_length,
            pattern,
            data: None,
        })
    }
}
