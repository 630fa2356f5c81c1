use std::path::{Path, PathBuf};

use crate::core::task::{Secret, SecretMountType};
use crate::error::{Error, Result};

pub const SECRETS_ENV_PREFIX_VAR: &str = "FLYTE_SECRETS_ENV_PREFIX";
pub const SECRETS_DIR_VAR: &str = "FLYTE_SECRETS_DEFAULT_DIR";

/// Where the orchestrator mounts secrets inside a task container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretStore {
    env_prefix: String,
    secrets_dir: PathBuf,
}

impl SecretStore {
    pub fn new(env_prefix: impl Into<String>, secrets_dir: impl Into<PathBuf>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
            secrets_dir: secrets_dir.into(),
        }
    }

    /// Reads the prefix and directory the orchestrator exports; both default to empty.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(SECRETS_ENV_PREFIX_VAR).unwrap_or_default(),
            std::env::var(SECRETS_DIR_VAR).unwrap_or_default(),
        )
    }

    pub fn secrets_dir(&self) -> &Path {
        &self.secrets_dir
    }

    /// `{PREFIX}{GROUP}_{KEY}`, upper-cased.
    pub fn env_var_name(&self, secret: &Secret) -> String {
        let name = match &secret.key {
            Some(key) => format!("{}_{}", secret.group, key),
            None => secret.group.clone(),
        };
        format!("{}{}", self.env_prefix, name.to_uppercase())
    }

    /// `{dir}/{group}/{key}`.
    pub fn file_path(&self, secret: &Secret) -> PathBuf {
        let group = self.secrets_dir.join(&secret.group);
        match &secret.key {
            Some(key) => group.join(key),
            None => group,
        }
    }

    /// Looks the secret up in the environment, then on disk, as its mount kind allows.
    pub fn get(&self, secret: &Secret) -> Result<String> {
        let mount = secret.mount_requirement.unwrap_or(SecretMountType::Any);

        if mount != SecretMountType::File {
            if let Ok(value) = std::env::var(self.env_var_name(secret)) {
                return Ok(value);
            }
        }
        if mount != SecretMountType::EnvVar {
            match std::fs::read_to_string(self.file_path(secret)) {
                Ok(value) => return Ok(value),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::Io(err)),
            }
        }
        Err(Error::SecretNotFound(secret.to_string()))
    }
}
