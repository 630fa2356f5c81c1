use crate::error::{Error, Result};

/// Represents an issue found while building a task or workflow descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A hard error: the descriptor cannot be built.
    Error(String),
    /// A warning: the descriptor is usable but probably not what was meant.
    Warning(String),
}

/// Every issue found for one descriptor, so all of them can be reported at once.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Error(msg.into()));
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Warning(msg.into()));
    }

    pub fn is_safe(&self) -> bool {
        !self.issues.iter().any(|i| matches!(i, ValidationIssue::Error(_)))
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().filter_map(|i| match i {
            ValidationIssue::Error(msg) => Some(msg.as_str()),
            ValidationIssue::Warning(_) => None,
        })
    }

    /// Logs warnings and turns any errors into a single [`Error::Validation`].
    pub fn into_result(self, subject: &str) -> Result<()> {
        for issue in &self.issues {
            if let ValidationIssue::Warning(msg) = issue {
                log::warn!("{}: {}", subject, msg);
            }
        }
        if self.is_safe() {
            return Ok(());
        }
        Err(Error::Validation {
            subject: subject.to_string(),
            issues: self.errors().map(str::to_string).collect(),
        })
    }
}
