use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of object an [`Identifier`] names on the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Task,
    Workflow,
    LaunchPlan,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Task => "TASK",
            ResourceType::Workflow => "WORKFLOW",
            ResourceType::LaunchPlan => "LAUNCH_PLAN",
        }
    }
}

/// Identity of every registrable object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub resource_type: ResourceType,
    pub project: String,
    pub domain: String,
    pub name: String,
    pub version: String,
}

impl Identifier {
    /// The same object under another resource type, e.g. a workflow's launch plan.
    pub fn with_resource_type(&self, resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            ..self.clone()
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}/{}@{}",
            self.resource_type.as_str(),
            self.project,
            self.domain,
            self.name,
            self.version
        )
    }
}

/// The project, domain and version shared by everything in one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    pub project: String,
    pub domain: String,
    pub version: String,
}

impl Scope {
    pub fn new(
        project: impl Into<String>,
        domain: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            domain: domain.into(),
            version: version.into(),
        }
    }

    pub fn identifier(&self, resource_type: ResourceType, name: impl Into<String>) -> Identifier {
        Identifier {
            resource_type,
            project: self.project.clone(),
            domain: self.domain.clone(),
            name: name.into(),
            version: self.version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_wire_shape() {
        let id = Scope::new("flytesnacks", "development", "v1").identifier(ResourceType::LaunchPlan, "sum");
        assert_eq!(
            serde_json::to_value(&id).unwrap(),
            json!({
                "resource_type": "LAUNCH_PLAN",
                "project": "flytesnacks",
                "domain": "development",
                "name": "sum",
                "version": "v1",
            })
        );
        assert_eq!(id.to_string(), "LAUNCH_PLAN flytesnacks/development/sum@v1");
    }
}
