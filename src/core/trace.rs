//! The single controlled run of a workflow body that recovers its call graph.

use futures::future::{self, BoxFuture};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::core::binding::{Argument, Binding, START_NODE, as_binding};
use crate::core::proxy::{CallArgs, CallTargets};
use crate::core::task::WorkflowDescriptor;
use crate::error::{Error, Result};

/// One captured invocation: the target and its bound inputs, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub target: String,
    pub inputs: Vec<(String, Binding)>,
}

/// Captured calls grouped by target; a record's position is its node suffix.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: IndexMap<String, Vec<CallRecord>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its index among calls to the same target.
    pub fn record(&mut self, target: &str, inputs: Vec<(String, Binding)>) -> usize {
        let calls = self.calls.entry(target.to_string()).or_default();
        calls.push(CallRecord {
            target: target.to_string(),
            inputs,
        });
        calls.len() - 1
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn calls_to(&self, target: &str) -> &[CallRecord] {
        self.calls.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of records across all targets.
    pub fn len(&self) -> usize {
        self.calls.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(node id, record)` pairs, grouped by target in first-call order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &CallRecord)> {
        self.calls.iter().flat_map(|(target, records)| {
            records
                .iter()
                .enumerate()
                .map(move |(index, record)| (format!("{target}-{index}"), record))
        })
    }
}

/// State threaded through a workflow body while it is being traced.
#[derive(Debug)]
pub struct TraceContext {
    targets: Arc<CallTargets>,
    inputs: Vec<String>,
    calls: CallLog,
}

impl TraceContext {
    pub fn new(targets: Arc<CallTargets>, calls: CallLog) -> Self {
        Self {
            targets,
            inputs: Vec::new(),
            calls,
        }
    }

    /// Declares the workflow inputs that start-node promises may name.
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Accepts literals, declared workflow inputs and outputs of calls already
    /// captured; anything else would dangle or close a cycle.
    fn check_edge(&self, binding: &Binding) -> Result<()> {
        let Some(promise) = binding.as_promise() else {
            return Ok(());
        };
        let known = if promise.node_id() == START_NODE {
            self.inputs.iter().any(|name| name == promise.var())
        } else {
            promise.node_id().rsplit_once('-').is_some_and(|(target, index)| {
                let captured = index
                    .parse::<usize>()
                    .is_ok_and(|i| i.to_string() == index && i < self.calls.calls_to(target).len());
                captured
                    && self
                        .targets
                        .get(target)
                        .is_some_and(|t| t.interface.output.name == promise.var())
            })
        };
        if known {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "{}.{} is neither a workflow input nor the output of an earlier call",
                promise.node_id(),
                promise.var()
            )))
        }
    }

    /// Binds `args` against `target`, records the call and returns a promise
    /// for the target's output.
    pub fn capture(&mut self, target: &str, args: CallArgs) -> Result<Binding> {
        let Some(call_target) = self.targets.get(target) else {
            return Err(Error::MissingReference {
                id: target.to_string(),
                detail: "not registered or not resolved before tracing".to_string(),
            });
        };
        let inputs = call_target.bind(args)?;
        for (param, binding) in &inputs {
            self.check_edge(binding).map_err(|source| Error::InvalidArgument {
                target: call_target.label(),
                param: param.clone(),
                source: Box::new(source),
            })?;
        }
        let output = call_target.interface.output.name.clone();
        let index = self.calls.record(target, inputs);
        log::debug!("captured call {}-{}", target, index);
        Ok(Binding::promise(format!("{target}-{index}"), output))
    }

    pub fn calls(&self) -> &CallLog {
        &self.calls
    }

    pub fn into_calls(self) -> CallLog {
        self.calls
    }
}

type SyncWorkflowFn = dyn Fn(&mut TraceContext, Vec<Binding>) -> Result<Argument> + Send + Sync;
type AsyncWorkflowFn =
    dyn for<'a> Fn(&'a mut TraceContext, Vec<Binding>) -> BoxFuture<'a, Result<Argument>> + Send + Sync;

/// A workflow body. It receives one start-node promise per declared input.
pub enum WorkflowBody {
    Sync(Box<SyncWorkflowFn>),
    Async(Box<AsyncWorkflowFn>),
}

impl WorkflowBody {
    pub fn invoke<'a>(
        &'a self,
        cx: &'a mut TraceContext,
        inputs: Vec<Binding>,
    ) -> BoxFuture<'a, Result<Argument>> {
        match self {
            WorkflowBody::Sync(f) => Box::pin(future::ready(f(cx, inputs))),
            WorkflowBody::Async(f) => f(cx, inputs),
        }
    }
}

impl fmt::Debug for WorkflowBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowBody::Sync(_) => f.write_str("WorkflowBody::Sync"),
            WorkflowBody::Async(_) => f.write_str("WorkflowBody::Async"),
        }
    }
}

#[derive(Debug)]
pub struct Workflow {
    pub descriptor: WorkflowDescriptor,
    pub body: WorkflowBody,
}

impl Workflow {
    pub fn new<F>(descriptor: WorkflowDescriptor, body: F) -> Self
    where
        F: Fn(&mut TraceContext, Vec<Binding>) -> Result<Argument> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            body: WorkflowBody::Sync(Box::new(body)),
        }
    }

    pub fn new_async<F>(descriptor: WorkflowDescriptor, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut TraceContext, Vec<Binding>) -> BoxFuture<'a, Result<Argument>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            descriptor,
            body: WorkflowBody::Async(Box::new(body)),
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

/// Runs `workflow` once and returns its result binding with every captured call.
///
/// `calls` is cleared first so records from an earlier trace never leak in.
pub async fn trace(
    workflow: &Workflow,
    targets: Arc<CallTargets>,
    mut calls: CallLog,
) -> Result<(Binding, CallLog)> {
    calls.clear();
    let interface = &workflow.descriptor.interface;
    let inputs = interface
        .inputs
        .iter()
        .map(|input| Binding::promise(START_NODE, input.name.clone()))
        .collect();

    let mut cx = TraceContext::new(targets, calls).with_inputs(interface.inputs.iter().map(|input| input.name.clone()));
    let returned = workflow.body.invoke(&mut cx, inputs).await?;
    if cx.calls().is_empty() {
        return Err(Error::EmptyWorkflow(workflow.name().to_string()));
    }

    let result = as_binding(returned, &interface.output.ty)
        .and_then(|binding| cx.check_edge(&binding).map(|()| binding))
        .map_err(|source| Error::InvalidArgument {
            target: format!("workflow `{}`", workflow.name()),
            param: interface.output.name.clone(),
            source: Box::new(source),
        })?;
    let calls = cx.into_calls();
    log::debug!("traced workflow {} with {} calls", workflow.name(), calls.len());
    Ok((result, calls))
}
