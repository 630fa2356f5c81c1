use thiserror::Error;

use crate::core::types::LiteralType;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Functions must be named: {0}")]
    Naming(String),

    #[error("invalid {subject}: {}", .issues.join("; "))]
    Validation { subject: String, issues: Vec<String> },

    #[error("wrong inputs for {target}: {reason}")]
    ArityMismatch { target: String, reason: String },

    #[error("argument for parameter `{param}` of {target} is not a task output or workflow input: {source}")]
    InvalidArgument {
        target: String,
        param: String,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("value {value} does not match declared type {expected}")]
    TypeMismatch {
        expected: LiteralType,
        value: serde_json::Value,
    },

    #[error("missing reference {id}: {detail}")]
    MissingReference { id: String, detail: String },

    #[error("Workflow `{0}` contains no tasks or references")]
    EmptyWorkflow(String),

    #[error("error while registering {kind}: {}", .failures.join("; "))]
    Registration { kind: String, failures: Vec<String> },

    #[error("secret {0} does not exist")]
    SecretNotFound(String),

    #[error("task runtime error: {0}")]
    Runtime(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "remote")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn validation(subject: impl Into<String>, issue: impl Into<String>) -> Self {
        Error::Validation {
            subject: subject.into(),
            issues: vec![issue.into()],
        }
    }
}
