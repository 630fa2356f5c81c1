//! The compile-and-register pipeline for one unit of tasks, references and workflows.
//!
//! ```text
//! declare tasks/references/workflows -> resolve references -> trace each workflow
//!   -> assemble graph + launch plan -> upload tasks, workflows, launch plans
//! ```

use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::config::RegistrationConfig;
use crate::core::assemble::{GraphSpec, LaunchPlan, assemble, launch_plan};
use crate::core::binding::{Argument, Binding};
use crate::core::interface::{Signature, WorkflowOptions};
use crate::core::proxy::{AsyncTaskHandle, ReferenceHandle, TaskHandle};
use crate::core::reference::{ReferenceDescriptor, ReferenceKind};
use crate::core::registry::Registry;
use crate::core::task::{TaskBody, TaskDescriptor, TaskOptions, build_task, build_workflow};
use crate::core::trace::{CallLog, TraceContext, Workflow, trace};
use crate::error::{Error, Result};
use crate::remote::AdminApi;
#[cfg(feature = "remote")]
use crate::remote::AdminClient;
use crate::remote::resolver::resolve_all;
use crate::remote::upload::{Collection, UploadStatus, upload};

/// Everything ready to upload, in dependency order.
#[derive(Debug, Clone, Default)]
pub struct CompiledUnit {
    pub tasks: Vec<TaskDescriptor>,
    pub workflows: Vec<GraphSpec>,
    pub launch_plans: Vec<LaunchPlan>,
}

impl CompiledUnit {
    pub fn workflow(&self, name: &str) -> Option<&GraphSpec> {
        self.workflows.iter().find(|graph| graph.name() == name)
    }
}

/// Per-object outcomes of a registration run.
#[derive(Debug, Clone, Default)]
pub struct RegistrationReport {
    pub tasks: Vec<UploadStatus>,
    pub workflows: Vec<UploadStatus>,
    pub launch_plans: Vec<UploadStatus>,
}

impl RegistrationReport {
    pub fn statuses(&self) -> impl Iterator<Item = &UploadStatus> {
        self.tasks
            .iter()
            .chain(&self.workflows)
            .chain(&self.launch_plans)
    }
}

/// One registration run. Owns its registry and workflows; nothing is shared
/// between compilations.
pub struct Compilation {
    config: RegistrationConfig,
    registry: Registry,
    workflows: Vec<Workflow>,
}

impl Compilation {
    pub fn new(config: RegistrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Registry::new(),
            workflows: Vec::new(),
        })
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// An admin client for the configured endpoint.
    #[cfg(feature = "remote")]
    pub fn client(&self) -> AdminClient {
        AdminClient::new(&self.config.endpoint)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    fn declare_task(&mut self, signature: &Signature, options: &TaskOptions, body: TaskBody) -> Result<String> {
        let descriptor = build_task(signature, options, &self.config.scope, &self.config.container)?;
        let name = descriptor.name().to_string();
        self.registry.register_task(descriptor, body)?;
        log::debug!("declared task {}", name);
        Ok(name)
    }

    /// Declares a synchronous task and returns the handle workflows call it through.
    pub fn task<F>(&mut self, signature: Signature, options: TaskOptions, body: F) -> Result<TaskHandle>
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        let name = self.declare_task(&signature, &options, TaskBody::new(body))?;
        Ok(TaskHandle::new(name))
    }

    /// Declares an asynchronous task. Calls on its handle must be awaited.
    pub fn async_task<F, Fut>(&mut self, signature: Signature, options: TaskOptions, body: F) -> Result<AsyncTaskHandle>
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let name = self.declare_task(&signature, &options, TaskBody::new_async(body))?;
        Ok(AsyncTaskHandle::new(name))
    }

    pub fn task_reference(
        &mut self,
        project: &str,
        domain: &str,
        name: &str,
        version: &str,
    ) -> Result<ReferenceHandle> {
        let reference = ReferenceDescriptor::new(ReferenceKind::Task, project, domain, name, version)?;
        Ok(ReferenceHandle::new(self.registry.register_reference(reference)?))
    }

    pub fn launch_plan_reference(
        &mut self,
        project: &str,
        domain: &str,
        name: &str,
        version: &str,
    ) -> Result<ReferenceHandle> {
        let reference = ReferenceDescriptor::new(ReferenceKind::LaunchPlan, project, domain, name, version)?;
        Ok(ReferenceHandle::new(self.registry.register_reference(reference)?))
    }

    fn add_workflow(&mut self, workflow: Workflow) -> Result<()> {
        if self.workflows.iter().any(|w| w.name() == workflow.name()) {
            return Err(Error::validation(
                format!("workflow `{}`", workflow.name()),
                "a workflow with this name is already declared",
            ));
        }
        self.workflows.push(workflow);
        Ok(())
    }

    /// Declares a workflow whose body runs synchronously during the trace.
    pub fn workflow<F>(&mut self, signature: Signature, options: WorkflowOptions, body: F) -> Result<()>
    where
        F: Fn(&mut TraceContext, Vec<Binding>) -> Result<Argument> + Send + Sync + 'static,
    {
        let descriptor = build_workflow(&signature, &options, &self.config.scope)?;
        self.add_workflow(Workflow::new(descriptor, body))
    }

    pub fn workflow_async<F>(&mut self, signature: Signature, options: WorkflowOptions, body: F) -> Result<()>
    where
        F: for<'a> Fn(&'a mut TraceContext, Vec<Binding>) -> BoxFuture<'a, Result<Argument>>
            + Send
            + Sync
            + 'static,
    {
        let descriptor = build_workflow(&signature, &options, &self.config.scope)?;
        self.add_workflow(Workflow::new_async(descriptor, body))
    }

    /// Fetches every declared reference's interface. Must complete before [`compile`](Self::compile).
    pub async fn resolve_references<A>(&mut self, api: &A) -> Result<usize>
    where
        A: AdminApi + ?Sized,
    {
        resolve_all(api, &mut self.registry).await
    }

    /// Traces every workflow once and assembles its graph and launch plan.
    pub async fn compile(&self) -> Result<CompiledUnit> {
        let unresolved = self.registry.unresolved_references();
        if !unresolved.is_empty() {
            return Err(Error::MissingReference {
                id: unresolved.join(", "),
                detail: "references must be resolved before tracing".to_string(),
            });
        }

        let targets = Arc::new(self.registry.call_targets());
        let mut unit = CompiledUnit {
            tasks: self.registry.tasks().map(|t| t.descriptor.clone()).collect(),
            ..Default::default()
        };
        let mut calls = CallLog::new();
        for workflow in &self.workflows {
            let (result, traced) = trace(workflow, Arc::clone(&targets), calls).await?;
            let graph = assemble(&self.registry, &traced, result, &workflow.descriptor)?;
            unit.launch_plans.push(launch_plan(&graph));
            unit.workflows.push(graph);
            calls = traced;
        }
        Ok(unit)
    }

    /// Resolves references, compiles, then uploads tasks, workflows and launch
    /// plans, each kind only after the previous one succeeded.
    pub async fn register<A>(&mut self, api: &A) -> Result<RegistrationReport>
    where
        A: AdminApi + ?Sized,
    {
        self.resolve_references(api).await?;
        let unit = self.compile().await?;
        log::info!(
            "registering {} tasks, {} workflows to {}",
            unit.tasks.len(),
            unit.workflows.len(),
            self.config.endpoint
        );

        let tasks = upload(api, Collection::Tasks, &unit.tasks).await?;
        let workflows = upload(api, Collection::Workflows, &unit.workflows).await?;
        let launch_plans = upload(api, Collection::LaunchPlans, &unit.launch_plans).await?;
        Ok(RegistrationReport {
            tasks,
            workflows,
            launch_plans,
        })
    }
}
