//! Tasks and launch plans defined outside the current compilation, known by identity.

use serde_json::{Map, Value};

use crate::core::identifier::{Identifier, ResourceType};
use crate::core::interface::{Interface, Variable};
use crate::core::types::{DeclaredType, LiteralType};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Task,
    LaunchPlan,
}

impl ReferenceKind {
    pub fn resource_type(self) -> ResourceType {
        match self {
            ReferenceKind::Task => ResourceType::Task,
            ReferenceKind::LaunchPlan => ResourceType::LaunchPlan,
        }
    }

    /// Collection segment of the metadata read path.
    pub fn collection(self) -> &'static str {
        match self {
            ReferenceKind::Task => "tasks",
            ReferenceKind::LaunchPlan => "launch_plans",
        }
    }
}

/// The interface of a remote object as fetched from the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInterface {
    pub interface: Interface,
    /// Present when the remote task was registered with an `inputOrder`
    /// config, in which case positional calls are accepted too.
    pub input_order: Option<Vec<String>>,
}

impl ReferenceInterface {
    /// Reads a task's `closure.compiled_task.template`.
    pub fn from_task_template(template: &Value) -> Result<Self> {
        let config = template.get("config").and_then(Value::as_object);
        let declared_tag = |name: &str| {
            config
                .and_then(|c| c.get(&format!("input-{name}")))
                .and_then(Value::as_str)
        };

        let variables = template
            .pointer("/interface/inputs/variables")
            .and_then(Value::as_object);
        let input_order = config
            .and_then(|c| c.get("inputOrder"))
            .and_then(Value::as_str)
            .map(split_input_order);

        let mut inputs = Vec::new();
        if let Some(variables) = variables {
            let names: Vec<String> = match &input_order {
                Some(order) => {
                    if order.len() != variables.len() {
                        return Err(Error::InvalidInput(format!(
                            "inputOrder lists {} inputs but the task interface declares {}",
                            order.len(),
                            variables.len()
                        )));
                    }
                    order.clone()
                }
                None => variables.keys().cloned().collect(),
            };
            for name in names {
                let Some(variable) = variables.get(&name) else {
                    return Err(Error::InvalidInput(format!(
                        "inputOrder names `{name}` which the task interface does not declare"
                    )));
                };
                let ty = match declared_tag(&name) {
                    Some("untyped") => DeclaredType::Untyped,
                    _ => wire_declared_type(variable),
                };
                inputs.push(Variable::new(name, ty));
            }
        }

        let output = single_output(template.pointer("/interface/outputs/variables"))?;
        Ok(Self {
            interface: Interface { inputs, output },
            input_order,
        })
    }

    /// Reads a launch plan's `closure`.
    pub fn from_launch_plan_closure(closure: &Value) -> Result<Self> {
        let inputs = closure
            .pointer("/expected_inputs/parameters")
            .and_then(Value::as_object)
            .map(|parameters| {
                parameters
                    .iter()
                    .map(|(name, parameter)| {
                        let ty = parameter
                            .get("var")
                            .map(wire_declared_type)
                            .unwrap_or_default();
                        Variable::new(name.clone(), ty)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let output = single_output(closure.pointer("/expected_outputs/variables"))?;
        Ok(Self {
            interface: Interface { inputs, output },
            input_order: None,
        })
    }
}

fn split_input_order(order: &str) -> Vec<String> {
    if order.is_empty() {
        return Vec::new();
    }
    order.split(',').map(str::to_string).collect()
}

/// `{"type": {"simple": "INTEGER"}}` to a declared type; unknown shapes are untyped.
fn wire_declared_type(variable: &Value) -> DeclaredType {
    variable
        .pointer("/type/simple")
        .and_then(Value::as_str)
        .and_then(LiteralType::lookup_by_wire_name)
        .map(DeclaredType::Typed)
        .unwrap_or_default()
}

fn single_output(variables: Option<&Value>) -> Result<Variable> {
    let empty = Map::new();
    let variables = variables.and_then(Value::as_object).unwrap_or(&empty);
    let mut iter = variables.iter();
    match (iter.next(), iter.next()) {
        (Some((name, variable)), None) => Ok(Variable::new(name.clone(), wire_declared_type(variable))),
        _ => Err(Error::InvalidInput(format!(
            "expected exactly one output, found {}",
            variables.len()
        ))),
    }
}

/// A remote object used by identity; its interface is filled in exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDescriptor {
    pub id: Identifier,
    pub kind: ReferenceKind,
    interface: Option<ReferenceInterface>,
}

impl ReferenceDescriptor {
    pub fn new(
        kind: ReferenceKind,
        project: impl Into<String>,
        domain: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let id = Identifier {
            resource_type: kind.resource_type(),
            project: project.into(),
            domain: domain.into(),
            name: name.into(),
            version: version.into(),
        };
        let missing: Vec<String> = [
            ("project", &id.project),
            ("domain", &id.domain),
            ("name", &id.name),
            ("version", &id.version),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| format!("{field} must be non-empty"))
        .collect();
        if !missing.is_empty() {
            return Err(Error::Validation {
                subject: format!("reference to {id}"),
                issues: missing,
            });
        }
        Ok(Self {
            id,
            kind,
            interface: None,
        })
    }

    /// The node-name key: `project-domain-name-version`.
    pub fn key(&self) -> String {
        [
            self.id.project.as_str(),
            self.id.domain.as_str(),
            self.id.name.as_str(),
            self.id.version.as_str(),
        ]
        .join("-")
    }

    /// Metadata read path, relative to the endpoint.
    pub fn metadata_path(&self) -> String {
        format!(
            "api/v1/{}/{}/{}/{}/{}",
            self.kind.collection(),
            self.id.project,
            self.id.domain,
            self.id.name,
            self.id.version
        )
    }

    pub fn is_resolved(&self) -> bool {
        self.interface.is_some()
    }

    pub fn interface(&self) -> Option<&ReferenceInterface> {
        self.interface.as_ref()
    }

    pub fn populate(&mut self, interface: ReferenceInterface) -> Result<()> {
        if self.interface.is_some() {
            return Err(Error::validation(
                format!("reference {}", self.key()),
                "interface was already resolved",
            ));
        }
        self.interface = Some(interface);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_template() -> Value {
        json!({
            "interface": {
                "inputs": { "variables": {
                    "b": { "type": { "simple": "INTEGER" } },
                    "a": { "type": { "simple": "STRING" } },
                }},
                "outputs": { "variables": { "total": { "type": { "simple": "INTEGER" } } } },
            },
            "config": { "inputOrder": "a,b", "input-a": "untyped", "input-b": "integer" },
        })
    }

    #[test]
    fn test_task_template_interface() {
        let resolved = ReferenceInterface::from_task_template(&task_template()).unwrap();
        assert_eq!(resolved.input_order, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(resolved.interface.input_names(), vec!["a", "b"]);
        assert_eq!(resolved.interface.inputs[0].ty, DeclaredType::Untyped);
        assert_eq!(resolved.interface.inputs[1].ty, DeclaredType::Typed(LiteralType::Integer));
        assert_eq!(resolved.interface.output.name, "total");
    }

    #[test]
    fn test_launch_plan_closure_interface() {
        let closure = json!({
            "expected_inputs": { "parameters": {
                "left": { "var": { "type": { "simple": "FLOAT" } }, "required": true },
            }},
            "expected_outputs": { "variables": { "o0": { "type": { "simple": "FLOAT" } } } },
        });
        let resolved = ReferenceInterface::from_launch_plan_closure(&closure).unwrap();
        assert_eq!(resolved.input_order, None);
        assert_eq!(resolved.interface.inputs[0].ty, DeclaredType::Typed(LiteralType::Float));
        assert_eq!(resolved.interface.output.name, "o0");
    }

    #[test]
    fn test_exactly_one_output_required() {
        let closure = json!({ "expected_outputs": { "variables": {} } });
        assert!(ReferenceInterface::from_launch_plan_closure(&closure).is_err());
    }

    #[test]
    fn test_descriptor_key_and_path() {
        let reference = ReferenceDescriptor::new(ReferenceKind::LaunchPlan, "p", "d", "sum", "v2").unwrap();
        assert_eq!(reference.key(), "p-d-sum-v2");
        assert_eq!(reference.metadata_path(), "api/v1/launch_plans/p/d/sum/v2");
        assert_eq!(reference.id.resource_type, ResourceType::LaunchPlan);
    }

    #[test]
    fn test_descriptor_requires_full_identity() {
        match ReferenceDescriptor::new(ReferenceKind::Task, "p", "", "sum", " ") {
            Err(Error::Validation { issues, .. }) => assert_eq!(issues.len(), 2),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_populated_exactly_once() {
        let mut reference = ReferenceDescriptor::new(ReferenceKind::Task, "p", "d", "n", "v").unwrap();
        let interface = ReferenceInterface::from_task_template(&task_template()).unwrap();
        assert!(!reference.is_resolved());
        reference.populate(interface.clone()).unwrap();
        assert!(reference.is_resolved());
        assert!(reference.populate(interface).is_err());
    }
}
