//! Registration settings supplied by the caller.

use crate::core::identifier::Scope;
use crate::error::{Error, Result};

pub const DEFAULT_INPUT_DIR: &str = "/var/inputs";
pub const DEFAULT_OUTPUT_DIR: &str = "/var/outputs";
pub const DEFAULT_TASK_TYPE: &str = "rust-task";

/// How task containers are launched. The runner arguments
/// (`--task`, `--inputdir`, `--outputdir`) are appended per task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerTemplate {
    pub image: String,
    /// Program and leading arguments of the in-container runner.
    pub command: Vec<String>,
    pub input_dir: String,
    pub output_dir: String,
    pub task_type: String,
}

impl Default for ContainerTemplate {
    fn default() -> Self {
        Self {
            image: String::new(),
            command: Vec::new(),
            input_dir: DEFAULT_INPUT_DIR.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
        }
    }
}

impl ContainerTemplate {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn mount_paths(mut self, input_dir: impl Into<String>, output_dir: impl Into<String>) -> Self {
        self.input_dir = input_dir.into();
        self.output_dir = output_dir.into();
        self
    }

    /// Full argument vector for one task.
    pub fn args_for(&self, task_name: &str) -> Vec<String> {
        let mut args = self.command.clone();
        args.extend([
            "--task".to_string(),
            task_name.to_string(),
            "--inputdir".to_string(),
            self.input_dir.clone(),
            "--outputdir".to_string(),
            self.output_dir.clone(),
        ]);
        args
    }
}

/// Everything needed to compile and register one unit.
#[derive(Clone, Debug, Default)]
pub struct RegistrationConfig {
    pub endpoint: String,
    pub scope: Scope,
    pub container: ContainerTemplate,
}

impl RegistrationConfig {
    pub fn new(
        project: impl Into<String>,
        domain: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            scope: Scope::new(project, domain, version),
            ..Default::default()
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn container(mut self, container: ContainerTemplate) -> Self {
        self.container = container;
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.container.image = image.into();
        self
    }

    /// Checks that every required setting is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("endpoint", &self.endpoint),
            ("project", &self.scope.project),
            ("domain", &self.scope.domain),
            ("version", &self.scope.version),
            ("image", &self.container.image),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!("missing {}", missing.join(", "))))
        }
    }
}

/// Prefixes `http://` when the endpoint carries no scheme and drops a trailing slash.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
