//! Task descriptors: the registrable form of a single unit of work.

use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::ContainerTemplate;
use crate::core::identifier::{Identifier, ResourceType, Scope};
use crate::core::interface::{Interface, InterfaceOptions, Signature, WorkflowOptions, build_interface};
use crate::core::types::TypeRef;
use crate::core::validation::ValidationResult;
use crate::error::Result;

/// Where a secret must be made available inside the task container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SecretMountType {
    #[serde(rename = "ANY")]
    Any = 0,
    #[serde(rename = "ENV_VAR")]
    EnvVar = 1,
    #[serde(rename = "FILE")]
    File = 2,
}

impl Serialize for SecretMountType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// A secret a task needs at run time. `group` is mandatory; `key` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_requirement: Option<SecretMountType>,
}

impl Secret {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            key: None,
            mount_requirement: None,
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn mount_requirement(mut self, mount: SecretMountType) -> Self {
        self.mount_requirement = Some(mount);
        self
    }

    pub(crate) fn check(&self, report: &mut ValidationResult) {
        if self.group.trim().is_empty() {
            report.add_error(format!("{self} is not a valid secret, group must be non-empty"));
        }
        match &self.key {
            Some(key) if key.trim().is_empty() => {
                report.add_error(format!("{self} is not a valid secret, key must be non-empty when given"));
            }
            None => report.add_warning(format!("secret {self} has no key; the whole group is requested")),
            Some(_) => {}
        }
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.group),
        }
    }
}

/// Options accepted when declaring a task.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    pub interface: InterfaceOptions,
    pub cache_version: Option<String>,
    pub secrets: Vec<Secret>,
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interface = self.interface.param_names(names);
        self
    }

    pub fn param_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeRef>,
    {
        self.interface = self.interface.param_types(types);
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.interface = self.interface.output_name(name);
        self
    }

    pub fn output_type(mut self, ty: impl Into<TypeRef>) -> Self {
        self.interface = self.interface.output_type(ty);
        self
    }

    pub fn cache_version(mut self, version: impl ToString) -> Self {
        self.cache_version = Some(version.to_string());
        self
    }

    pub fn secret(mut self, secret: Secret) -> Self {
        self.secrets.push(secret);
        self
    }
}

/// The container the orchestrator launches for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub args: Vec<String>,
    pub input_path: String,
    pub output_path: String,
}

impl ContainerSpec {
    fn to_wire(&self) -> Value {
        json!({
            "image": self.image,
            "args": self.args,
            "resources": {},
            "env": [],
            "data_config": {
                "enabled": true,
                "input_path": self.input_path,
                "output_path": self.output_path,
            },
        })
    }
}

/// A fully validated task, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    pub id: Identifier,
    pub interface: Interface,
    pub container: ContainerSpec,
    pub task_type: String,
    pub cache_version: Option<String>,
    pub secrets: Vec<Secret>,
}

impl TaskDescriptor {
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Parameter names in positional order.
    pub fn input_order(&self) -> Vec<&str> {
        self.interface.input_names()
    }

    pub fn to_wire(&self) -> Value {
        let mut metadata = json!({
            "runtime": {
                "type": "OTHER",
                "version": crate::VERSION,
                "flavor": crate::NAME,
            },
            "retries": {},
        });
        if let Some(version) = &self.cache_version {
            metadata["discoverable"] = json!(true);
            metadata["discovery_version"] = json!(version);
        }

        let mut template = json!({
            "type": self.task_type,
            "metadata": metadata,
            "interface": self.interface.to_wire(),
            "container": self.container.to_wire(),
            "config": self.interface.config(),
        });
        if !self.secrets.is_empty() {
            template["security_context"] = json!({ "secrets": self.secrets });
        }

        json!({
            "id": self.id,
            "spec": { "template": template },
        })
    }
}

/// Turns a declared signature plus options into a task descriptor.
///
/// Every option problem is collected and reported together. The descriptor is
/// not inserted anywhere; that is the caller's job.
pub fn build_task(
    signature: &Signature,
    options: &TaskOptions,
    scope: &Scope,
    container: &ContainerTemplate,
) -> Result<TaskDescriptor> {
    let name = signature.checked_name()?;

    let mut report = ValidationResult::new();
    let interface = build_interface(signature.arity(), &options.interface, &mut report);
    if let Some(version) = &options.cache_version {
        if version.trim().is_empty() {
            report.add_error("cache_version cannot be empty");
        }
    }
    for secret in &options.secrets {
        secret.check(&mut report);
    }
    report.into_result(&format!("task `{name}`"))?;

    Ok(TaskDescriptor {
        id: scope.identifier(ResourceType::Task, name),
        interface,
        container: ContainerSpec {
            image: container.image.clone(),
            args: container.args_for(name),
            input_path: container.input_dir.clone(),
            output_path: container.output_dir.clone(),
        },
        task_type: container.task_type.clone(),
        cache_version: options.cache_version.clone(),
        secrets: options.secrets.clone(),
    })
}

/// A workflow's identity and interface; its body lives in a [`Workflow`](crate::core::trace::Workflow).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDescriptor {
    pub id: Identifier,
    pub interface: Interface,
}

impl WorkflowDescriptor {
    pub fn name(&self) -> &str {
        &self.id.name
    }
}

/// Applies the task interface rules to a workflow declaration.
pub fn build_workflow(
    signature: &Signature,
    options: &WorkflowOptions,
    scope: &Scope,
) -> Result<WorkflowDescriptor> {
    let name = signature.checked_name()?;
    let mut report = ValidationResult::new();
    let interface = build_interface(signature.arity(), options, &mut report);
    report.into_result(&format!("workflow `{name}`"))?;
    Ok(WorkflowDescriptor {
        id: scope.identifier(ResourceType::Workflow, name),
        interface,
    })
}

type SyncTaskFn = dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync;
type AsyncTaskFn = dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// The business logic behind a task, run only by the task runner.
#[derive(Clone)]
pub enum TaskBody {
    Sync(Arc<SyncTaskFn>),
    Async(Arc<AsyncTaskFn>),
}

impl TaskBody {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        TaskBody::Sync(Arc::new(body))
    }

    pub fn new_async<F, Fut>(body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        TaskBody::Async(Arc::new(move |inputs| Box::pin(body(inputs))))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, TaskBody::Async(_))
    }

    /// Runs the body; synchronous bodies are normalized to a ready future.
    pub fn invoke(&self, inputs: Vec<Value>) -> BoxFuture<'static, Result<Value>> {
        match self {
            TaskBody::Sync(f) => Box::pin(future::ready(f(inputs))),
            TaskBody::Async(f) => f(inputs),
        }
    }
}

impl fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskBody::Sync(_) => f.write_str("TaskBody::Sync"),
            TaskBody::Async(_) => f.write_str("TaskBody::Async"),
        }
    }
}
