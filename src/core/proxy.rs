//! Graph-node handles and the argument binding done at each call site.
//!
//! A handle is what `Compilation` gives back in place of a task or reference.
//! Calling it against a [`TraceContext`] is the only way to produce a promise
//! binding for that target.

use futures::future::{self, Ready};
use indexmap::IndexMap;
use std::collections::HashSet;

use crate::core::binding::{Argument, Binding, as_binding};
use crate::core::interface::Interface;
use crate::core::trace::TraceContext;
use crate::error::{Error, Result};

/// Arguments handed to a handle, either in order or by parameter name.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    Positional(Vec<Argument>),
    Keyword(Vec<(String, Argument)>),
}

impl CallArgs {
    pub fn none() -> Self {
        CallArgs::Positional(Vec::new())
    }

    pub fn positional<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        CallArgs::Positional(args.into_iter().map(Into::into).collect())
    }

    pub fn keyword<I, K, A>(args: I) -> Self
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
        A: Into<Argument>,
    {
        CallArgs::Keyword(args.into_iter().map(|(k, a)| (k.into(), a.into())).collect())
    }

    fn is_empty(&self) -> bool {
        match self {
            CallArgs::Positional(args) => args.is_empty(),
            CallArgs::Keyword(args) => args.is_empty(),
        }
    }
}

impl<A: Into<Argument>, const N: usize> From<[A; N]> for CallArgs {
    fn from(args: [A; N]) -> Self {
        CallArgs::positional(args)
    }
}

impl From<Vec<Argument>> for CallArgs {
    fn from(args: Vec<Argument>) -> Self {
        CallArgs::Positional(args)
    }
}

impl From<()> for CallArgs {
    fn from(_: ()) -> Self {
        CallArgs::none()
    }
}

/// Which argument shapes a target accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConvention {
    /// Local tasks: exactly as many positional arguments as inputs.
    Positional,
    /// Task references registered with an `inputOrder`.
    PositionalOrKeyword,
    /// Everything else: one keyword set naming every input.
    Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Task,
    TaskReference,
    LaunchPlanReference,
}

impl TargetKind {
    fn describe(self) -> &'static str {
        match self {
            TargetKind::Task => "task",
            TargetKind::TaskReference => "task reference",
            TargetKind::LaunchPlanReference => "launch plan reference",
        }
    }
}

/// Everything the capture step needs to know about one callable target.
#[derive(Debug, Clone, PartialEq)]
pub struct CallTarget {
    pub name: String,
    pub kind: TargetKind,
    pub interface: Interface,
    pub convention: CallConvention,
}

impl CallTarget {
    pub(crate) fn label(&self) -> String {
        format!("{} `{}`", self.kind.describe(), self.name)
    }

    /// Pairs every declared input with its argument, in declared order.
    pub fn bind(&self, args: CallArgs) -> Result<Vec<(String, Binding)>> {
        let ordered = self.order_arguments(args)?;
        ordered
            .into_iter()
            .zip(&self.interface.inputs)
            .map(|(argument, input)| {
                as_binding(argument, &input.ty)
                    .map(|binding| (input.name.clone(), binding))
                    .map_err(|source| Error::InvalidArgument {
                        target: self.label(),
                        param: input.name.clone(),
                        source: Box::new(source),
                    })
            })
            .collect()
    }

    fn order_arguments(&self, args: CallArgs) -> Result<Vec<Argument>> {
        let expected = self.interface.input_names();
        if expected.is_empty() {
            return if args.is_empty() {
                Ok(Vec::new())
            } else {
                Err(self.arity_error("takes no inputs".to_string()))
            };
        }

        match (args, self.convention) {
            (CallArgs::Positional(args), CallConvention::Positional | CallConvention::PositionalOrKeyword) => {
                if args.len() != expected.len() {
                    return Err(self.arity_error(format!(
                        "takes {}, received {}",
                        expected.len(),
                        args.len()
                    )));
                }
                Ok(args)
            }
            (CallArgs::Keyword(args), CallConvention::Keyword | CallConvention::PositionalOrKeyword) => {
                let mut by_name: IndexMap<String, Argument> = IndexMap::with_capacity(args.len());
                for (name, argument) in args {
                    if by_name.insert(name.clone(), argument).is_some() {
                        return Err(self.arity_error(format!("`{name}` was passed twice")));
                    }
                }
                let passed: HashSet<&str> = by_name.keys().map(String::as_str).collect();
                let wanted: HashSet<&str> = expected.iter().copied().collect();
                if passed != wanted {
                    return Err(self.arity_error(format!(
                        "expected keyword arguments {}",
                        expected.join(", ")
                    )));
                }
                Ok(expected
                    .iter()
                    .filter_map(|name| by_name.shift_remove(*name))
                    .collect())
            }
            (CallArgs::Positional(_), CallConvention::Keyword) => Err(self.arity_error(format!(
                "takes keyword arguments {}",
                expected.join(", ")
            ))),
            (CallArgs::Keyword(_), CallConvention::Positional) => Err(self.arity_error(format!(
                "takes {} positional arguments",
                expected.len()
            ))),
        }
    }

    fn arity_error(&self, reason: String) -> Error {
        Error::ArityMismatch {
            target: self.label(),
            reason,
        }
    }
}

/// Every target callable during one compilation, by node name.
#[derive(Debug, Clone, Default)]
pub struct CallTargets {
    targets: IndexMap<String, CallTarget>,
}

impl CallTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: CallTarget) {
        self.targets.insert(target.name.clone(), target);
    }

    pub fn get(&self, name: &str) -> Option<&CallTarget> {
        self.targets.get(name)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Handle to a synchronous local task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    name: String,
}

impl TaskHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, cx: &mut TraceContext, args: impl Into<CallArgs>) -> Result<Binding> {
        cx.capture(&self.name, args.into())
    }
}

/// Handle to an asynchronous local task. The call is recorded when `call`
/// runs; the returned future only hands the binding over and must be awaited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncTaskHandle {
    name: String,
}

impl AsyncTaskHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, cx: &mut TraceContext, args: impl Into<CallArgs>) -> Ready<Result<Binding>> {
        future::ready(cx.capture(&self.name, args.into()))
    }
}

/// Handle to a task or launch plan registered elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHandle {
    key: String,
}

impl ReferenceHandle {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The node name, `project-domain-name-version`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn call(&self, cx: &mut TraceContext, args: impl Into<CallArgs>) -> Result<Binding> {
        cx.capture(&self.key, args.into())
    }
}
