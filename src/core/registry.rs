use indexmap::IndexMap;

use crate::core::assemble::NodeTarget;
use crate::core::proxy::{CallConvention, CallTarget, CallTargets, TargetKind};
use crate::core::reference::{ReferenceDescriptor, ReferenceKind};
use crate::core::task::{TaskBody, TaskDescriptor};
use crate::error::{Error, Result};

/// A locally declared task: what gets registered plus what the runner executes.
#[derive(Debug, Clone)]
pub struct RegisteredTask {
    pub descriptor: TaskDescriptor,
    pub body: TaskBody,
}

/// Per-compilation store of tasks and references, keyed by node name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tasks: IndexMap<String, RegisteredTask>,
    references: IndexMap<String, ReferenceDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_task(&mut self, descriptor: TaskDescriptor, body: TaskBody) -> Result<()> {
        let name = descriptor.name().to_string();
        if self.tasks.contains_key(&name) || self.references.contains_key(&name) {
            return Err(Error::validation(
                format!("task `{name}`"),
                "a task with this name is already registered",
            ));
        }
        self.tasks.insert(name, RegisteredTask { descriptor, body });
        Ok(())
    }

    /// Declaring the same reference twice yields the same node name.
    ///
    /// A task reference and a launch-plan reference sharing one identity would
    /// share a node name too, so the second kind is rejected.
    pub fn register_reference(&mut self, reference: ReferenceDescriptor) -> Result<String> {
        let key = reference.key();
        if self.tasks.contains_key(&key) {
            return Err(Error::validation(
                format!("reference `{key}`"),
                "a local task with this name is already registered",
            ));
        }
        if let Some(existing) = self.references.get(&key) {
            if existing.kind != reference.kind {
                return Err(Error::validation(
                    format!("reference `{key}`"),
                    format!("already declared as a {}", existing.id.resource_type.as_str()),
                ));
            }
            log::debug!("reference {} already declared", key);
            return Ok(key);
        }
        self.references.insert(key.clone(), reference);
        Ok(key)
    }

    pub fn task(&self, name: &str) -> Option<&RegisteredTask> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &RegisteredTask> {
        self.tasks.values()
    }

    pub fn reference(&self, key: &str) -> Option<&ReferenceDescriptor> {
        self.references.get(key)
    }

    pub fn references(&self) -> impl Iterator<Item = &ReferenceDescriptor> {
        self.references.values()
    }

    pub fn unresolved_references_mut(&mut self) -> impl Iterator<Item = &mut ReferenceDescriptor> {
        self.references.values_mut().filter(|r| !r.is_resolved())
    }

    pub fn unresolved_references(&self) -> Vec<String> {
        self.references
            .values()
            .filter(|r| !r.is_resolved())
            .map(ReferenceDescriptor::key)
            .collect()
    }

    /// Snapshot of every callable target. Unresolved references are left out,
    /// so calling one during a trace fails as missing.
    pub fn call_targets(&self) -> CallTargets {
        let mut targets = CallTargets::new();
        for (name, task) in &self.tasks {
            targets.insert(CallTarget {
                name: name.clone(),
                kind: TargetKind::Task,
                interface: task.descriptor.interface.clone(),
                convention: CallConvention::Positional,
            });
        }
        for (key, reference) in &self.references {
            let Some(resolved) = reference.interface() else {
                continue;
            };
            let (kind, convention) = match (reference.kind, &resolved.input_order) {
                (ReferenceKind::Task, Some(_)) => (TargetKind::TaskReference, CallConvention::PositionalOrKeyword),
                (ReferenceKind::Task, None) => (TargetKind::TaskReference, CallConvention::Keyword),
                (ReferenceKind::LaunchPlan, _) => (TargetKind::LaunchPlanReference, CallConvention::Keyword),
            };
            targets.insert(CallTarget {
                name: key.clone(),
                kind,
                interface: resolved.interface.clone(),
                convention,
            });
        }
        targets
    }

    /// What a graph node named `name` points at.
    pub fn node_target(&self, name: &str) -> Option<NodeTarget> {
        if let Some(task) = self.tasks.get(name) {
            return Some(NodeTarget::Task(task.descriptor.id.clone()));
        }
        self.references.get(name).map(|reference| match reference.kind {
            ReferenceKind::Task => NodeTarget::Task(reference.id.clone()),
            ReferenceKind::LaunchPlan => NodeTarget::LaunchPlan(reference.id.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerTemplate;
    use crate::core::identifier::Scope;
    use crate::core::interface::Signature;
    use crate::core::reference::ReferenceInterface;
    use crate::core::task::{TaskOptions, build_task};
    use serde_json::json;

    fn task(name: &str) -> TaskDescriptor {
        build_task(
            &Signature::new(name, 1),
            &TaskOptions::new(),
            &Scope::new("p", "d", "v"),
            &ContainerTemplate::new("image"),
        )
        .unwrap()
    }

    fn body() -> TaskBody {
        TaskBody::new(|inputs| Ok(inputs[0].clone()))
    }

    #[test]
    fn test_duplicate_task_names_rejected() {
        let mut registry = Registry::new();
        registry.register_task(task("square"), body()).unwrap();
        let err = registry.register_task(task("square"), body()).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_reference_declared_twice_is_one_entry() {
        let mut registry = Registry::new();
        let first = registry
            .register_reference(ReferenceDescriptor::new(ReferenceKind::Task, "p", "d", "n", "v").unwrap())
            .unwrap();
        let second = registry
            .register_reference(ReferenceDescriptor::new(ReferenceKind::Task, "p", "d", "n", "v").unwrap())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.references().count(), 1);
        assert_eq!(registry.unresolved_references(), vec!["p-d-n-v".to_string()]);
    }

    #[test]
    fn test_reference_kind_clash_rejected() {
        let mut registry = Registry::new();
        registry
            .register_reference(ReferenceDescriptor::new(ReferenceKind::Task, "shared", "dev", "normalize", "v3").unwrap())
            .unwrap();
        let err = registry
            .register_reference(ReferenceDescriptor::new(ReferenceKind::LaunchPlan, "shared", "dev", "normalize", "v3").unwrap())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid reference `shared-dev-normalize-v3`: already declared as a TASK"
        );
        assert_eq!(registry.references().count(), 1);
        assert!(matches!(
            registry.node_target("shared-dev-normalize-v3"),
            Some(NodeTarget::Task(_))
        ));
    }

    #[test]
    fn test_reference_cannot_shadow_local_task() {
        let mut registry = Registry::new();
        registry.register_task(task("p-d-n-v"), body()).unwrap();
        let err = registry
            .register_reference(ReferenceDescriptor::new(ReferenceKind::Task, "p", "d", "n", "v").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(registry.references().count(), 0);
    }

    #[test]
    fn test_call_targets_skip_unresolved_references() {
        let mut registry = Registry::new();
        registry.register_task(task("square"), body()).unwrap();
        let key = registry
            .register_reference(ReferenceDescriptor::new(ReferenceKind::LaunchPlan, "p", "d", "lp", "v").unwrap())
            .unwrap();
        assert!(registry.call_targets().get(&key).is_none());

        let closure = json!({
            "expected_inputs": { "parameters": { "x": { "var": { "type": { "simple": "INTEGER" } } } } },
            "expected_outputs": { "variables": { "o0": { "type": { "simple": "INTEGER" } } } },
        });
        for reference in registry.unresolved_references_mut() {
            reference
                .populate(ReferenceInterface::from_launch_plan_closure(&closure).unwrap())
                .unwrap();
        }
        let targets = registry.call_targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets.get(&key).unwrap().convention, CallConvention::Keyword);
        assert_eq!(targets.get("square").unwrap().convention, CallConvention::Positional);
        assert!(matches!(registry.node_target(&key), Some(NodeTarget::LaunchPlan(_))));
        assert!(matches!(registry.node_target("square"), Some(NodeTarget::Task(_))));
    }
}
