//! Turns a traced call log into a workflow graph and its launch plan.

use serde_json::{Map, Value, json};

use crate::core::binding::{Binding, END_NODE, START_NODE};
use crate::core::identifier::{Identifier, ResourceType};
use crate::core::interface::Interface;
use crate::core::registry::Registry;
use crate::core::task::WorkflowDescriptor;
use crate::core::trace::CallLog;
use crate::error::{Error, Result};

/// What a graph node executes. Launch-plan references become workflow nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTarget {
    Task(Identifier),
    LaunchPlan(Identifier),
}

impl NodeTarget {
    fn to_wire(&self) -> (&'static str, Value) {
        match self {
            NodeTarget::Task(id) => ("task_node", json!({ "reference_id": id })),
            NodeTarget::LaunchPlan(id) => ("workflow_node", json!({ "launchplan_ref": id })),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeInput {
    pub var: String,
    pub binding: Binding,
}

impl NodeInput {
    pub fn to_wire(&self) -> Value {
        json!({
            "var": self.var,
            "binding": self.binding.to_wire(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// `target-index`.
    pub id: String,
    /// The target's node name.
    pub name: String,
    pub target: NodeTarget,
    pub inputs: Vec<NodeInput>,
}

impl GraphNode {
    /// Ids of the nodes this one reads from.
    pub fn upstream(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter_map(|input| input.binding.node_id())
    }

    pub fn to_wire(&self) -> Value {
        let (kind, target) = self.target.to_wire();
        let mut node = json!({
            "id": self.id,
            "metadata": {
                "name": self.name,
                "retries": {},
            },
            "inputs": self.inputs.iter().map(NodeInput::to_wire).collect::<Vec<_>>(),
        });
        node[kind] = target;
        node
    }
}

/// An assembled workflow: the traced nodes plus the synthetic start and end nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSpec {
    pub id: Identifier,
    pub interface: Interface,
    pub nodes: Vec<GraphNode>,
    /// Bound to the traced result; feeds both the end node and the workflow outputs.
    pub output: NodeInput,
}

impl GraphSpec {
    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn to_wire(&self) -> Value {
        let mut nodes = vec![
            json!({ "id": START_NODE }),
            json!({ "id": END_NODE, "inputs": [self.output.to_wire()] }),
        ];
        nodes.extend(self.nodes.iter().map(GraphNode::to_wire));
        json!({
            "id": self.id,
            "spec": {
                "template": {
                    "id": self.id,
                    "interface": self.interface.to_wire(),
                    "nodes": nodes,
                    "outputs": [self.output.to_wire()],
                },
            },
        })
    }
}

/// Builds the graph for one traced workflow.
pub fn assemble(
    registry: &Registry,
    calls: &CallLog,
    result: Binding,
    workflow: &WorkflowDescriptor,
) -> Result<GraphSpec> {
    let nodes = calls
        .iter()
        .map(|(id, record)| {
            let target = registry
                .node_target(&record.target)
                .ok_or_else(|| Error::MissingReference {
                    id: record.target.clone(),
                    detail: format!("node {id} targets nothing registered"),
                })?;
            Ok(GraphNode {
                id,
                name: record.target.clone(),
                target,
                inputs: record
                    .inputs
                    .iter()
                    .map(|(var, binding)| NodeInput {
                        var: var.clone(),
                        binding: binding.clone(),
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GraphSpec {
        id: workflow.id.clone(),
        interface: workflow.interface.clone(),
        nodes,
        output: NodeInput {
            var: workflow.interface.output.name.clone(),
            binding: result,
        },
    })
}

/// One required default parameter per workflow input.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchPlan {
    pub id: Identifier,
    pub workflow_id: Identifier,
    pub interface: Interface,
}

impl LaunchPlan {
    pub fn to_wire(&self) -> Value {
        let parameters: Map<String, Value> = self
            .interface
            .inputs
            .iter()
            .map(|input| {
                (
                    input.name.clone(),
                    json!({ "var": input.to_wire(), "required": true }),
                )
            })
            .collect();
        json!({
            "id": self.id,
            "spec": {
                "workflow_id": self.workflow_id,
                "default_inputs": { "parameters": parameters },
            },
        })
    }
}

pub fn launch_plan(graph: &GraphSpec) -> LaunchPlan {
    LaunchPlan {
        id: graph.id.with_resource_type(ResourceType::LaunchPlan),
        workflow_id: graph.id.clone(),
        interface: graph.interface.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerTemplate;
    use crate::core::identifier::Scope;
    use crate::core::interface::{Signature, WorkflowOptions};
    use crate::core::reference::{ReferenceDescriptor, ReferenceInterface, ReferenceKind};
    use crate::core::task::{TaskBody, TaskOptions, build_task, build_workflow};
    use crate::core::types::DeclaredType;

    fn scope() -> Scope {
        Scope::new("flytesnacks", "development", "v1")
    }

    fn registry() -> (Registry, String) {
        let mut registry = Registry::new();
        let task = build_task(
            &Signature::new("square", 1),
            &TaskOptions::new(),
            &scope(),
            &ContainerTemplate::new("image"),
        )
        .unwrap();
        registry
            .register_task(task, TaskBody::new(|inputs| Ok(inputs[0].clone())))
            .unwrap();

        let mut reference = ReferenceDescriptor::new(ReferenceKind::LaunchPlan, "other", "development", "lp", "v3").unwrap();
        let closure = json!({
            "expected_inputs": { "parameters": { "x": { "var": { "type": { "simple": "STRING" } } } } },
            "expected_outputs": { "variables": { "o0": { "type": { "simple": "STRING" } } } },
        });
        reference
            .populate(ReferenceInterface::from_launch_plan_closure(&closure).unwrap())
            .unwrap();
        let key = registry.register_reference(reference).unwrap();
        (registry, key)
    }

    fn workflow() -> WorkflowDescriptor {
        build_workflow(
            &Signature::new("wf", 1),
            &WorkflowOptions::new().param_names(["value"]),
            &scope(),
        )
        .unwrap()
    }

    #[test]
    fn test_node_shapes() {
        let (registry, key) = registry();
        let mut calls = CallLog::new();
        calls.record("square", vec![("input0".into(), Binding::promise(START_NODE, "value"))]);
        calls.record(&key, vec![("x".into(), Binding::promise("square-0", "output0"))]);

        let graph = assemble(&registry, &calls, Binding::promise(format!("{key}-0"), "o0"), &workflow()).unwrap();
        assert_eq!(graph.nodes.len(), 2);

        let wire = graph.to_wire();
        let nodes = wire["spec"]["template"]["nodes"].as_array().unwrap();
        assert_eq!(nodes[0], json!({ "id": "start-node" }));
        assert_eq!(nodes[1]["id"], "end-node");
        assert_eq!(nodes[1]["inputs"][0]["binding"]["promise"]["node_id"], "other-development-lp-v3-0");
        assert_eq!(nodes[2]["task_node"]["reference_id"]["resource_type"], "TASK");
        assert_eq!(nodes[3]["workflow_node"]["launchplan_ref"]["name"], "lp");
        assert_eq!(nodes[3]["metadata"]["name"], "other-development-lp-v3");
        assert_eq!(wire["spec"]["template"]["outputs"][0]["var"], "output0");

        let upstream: Vec<&str> = graph.node("other-development-lp-v3-0").unwrap().upstream().collect();
        assert_eq!(upstream, vec!["square-0"]);
    }

    #[test]
    fn test_unknown_target_fails() {
        let (registry, _) = registry();
        let mut calls = CallLog::new();
        calls.record("ghost", Vec::new());
        let result = Binding::primitive(json!(1), DeclaredType::Untyped);
        assert!(matches!(
            assemble(&registry, &calls, result, &workflow()),
            Err(Error::MissingReference { .. })
        ));
    }

    #[test]
    fn test_launch_plan_parameters() {
        let (registry, _) = registry();
        let mut calls = CallLog::new();
        calls.record("square", vec![("input0".into(), Binding::promise(START_NODE, "value"))]);
        let graph = assemble(&registry, &calls, Binding::promise("square-0", "output0"), &workflow()).unwrap();

        let plan = launch_plan(&graph);
        assert_eq!(plan.id.resource_type, ResourceType::LaunchPlan);
        assert_eq!(plan.id.name, "wf");
        let wire = plan.to_wire();
        assert_eq!(wire["spec"]["workflow_id"]["resource_type"], "WORKFLOW");
        assert_eq!(wire["spec"]["default_inputs"]["parameters"]["value"]["required"], true);
        assert_eq!(
            wire["spec"]["default_inputs"]["parameters"]["value"]["var"]["type"],
            json!({ "simple": "STRING" })
        );
    }
}
