//! Named, typed inputs and the single output shared by tasks and workflows.

use serde_json::{Map, Value, json};
use std::collections::HashSet;

use crate::core::types::{DeclaredType, TypeRef};
use crate::core::validation::ValidationResult;
use crate::error::{Error, Result};

/// The declared shape of a function: its stable name and how many parameters it takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    arity: usize,
}

impl Signature {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Names are graph identifiers, so an unnamed function cannot be compiled.
    pub(crate) fn checked_name(&self) -> Result<&str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Naming(format!(
                "a function of arity {} was declared without a name",
                self.arity
            )));
        }
        Ok(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: DeclaredType,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn to_wire(&self) -> Value {
        json!({
            "type": self.ty.wire_type(),
            "description": self.name,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub inputs: Vec<Variable>,
    pub output: Variable,
}

impl Interface {
    pub fn input(&self, name: &str) -> Option<&Variable> {
        self.inputs.iter().find(|v| v.name == name)
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn to_wire(&self) -> Value {
        let inputs: Map<String, Value> = self
            .inputs
            .iter()
            .map(|v| (v.name.clone(), v.to_wire()))
            .collect();
        let mut outputs = Map::new();
        outputs.insert(self.output.name.clone(), self.output.to_wire());
        json!({
            "inputs": { "variables": inputs },
            "outputs": { "variables": outputs },
        })
    }

    /// The `config` map entries: `inputOrder` plus a type tag per variable.
    pub fn config(&self) -> Map<String, Value> {
        let mut config = Map::new();
        config.insert("inputOrder".into(), self.input_names().join(",").into());
        for input in &self.inputs {
            config.insert(format!("input-{}", input.name), input.ty.config_tag().into());
        }
        config.insert(
            format!("output-{}", self.output.name),
            self.output.ty.config_tag().into(),
        );
        config
    }
}

/// Naming and typing options common to tasks and workflows.
#[derive(Debug, Clone, Default)]
pub struct InterfaceOptions {
    pub param_names: Option<Vec<String>>,
    pub param_types: Option<Vec<TypeRef>>,
    pub output_name: Option<String>,
    pub output_type: Option<TypeRef>,
}

/// Workflows take only the interface options.
pub type WorkflowOptions = InterfaceOptions;

impl InterfaceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn param_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeRef>,
    {
        self.param_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn output_type(mut self, ty: impl Into<TypeRef>) -> Self {
        self.output_type = Some(ty.into());
        self
    }
}

pub(crate) fn check_param_names(names: &[String], arity: usize, report: &mut ValidationResult) {
    if names.len() != arity {
        report.add_error(format!(
            "provided paramNames do not match the parameter count; function has {} parameters, provided {} paramNames",
            arity,
            names.len()
        ));
    }
    if names.iter().any(|n| n.contains(',')) {
        report.add_error("paramNames entries cannot include commas");
    }
    if names.iter().any(|n| n.is_empty()) {
        report.add_error("paramNames entries cannot be empty");
    }
    let mut seen = HashSet::new();
    if names.iter().any(|n| !seen.insert(n.as_str())) {
        report.add_error("paramNames entries cannot be duplicates");
    }
}

fn resolve_type(ty: Option<&TypeRef>, what: &str, report: &mut ValidationResult) -> DeclaredType {
    match ty {
        None => DeclaredType::Untyped,
        Some(t) => match t.resolve() {
            Some(literal) => DeclaredType::Typed(literal),
            None => {
                report.add_error(format!("{t} is not a valid type for {what}"));
                DeclaredType::Untyped
            }
        },
    }
}

/// Builds an interface, recording every problem in `report` instead of stopping at the first.
pub(crate) fn build_interface(
    arity: usize,
    options: &InterfaceOptions,
    report: &mut ValidationResult,
) -> Interface {
    if let Some(names) = &options.param_names {
        check_param_names(names, arity, report);
    }
    if let Some(types) = &options.param_types {
        if types.len() != arity {
            report.add_error(format!(
                "provided paramTypes do not match the parameter count; function has {} parameters, provided {} paramTypes",
                arity,
                types.len()
            ));
        }
    }

    let inputs = (0..arity)
        .map(|i| {
            let name = options
                .param_names
                .as_ref()
                .and_then(|names| names.get(i).cloned())
                .unwrap_or_else(|| format!("input{i}"));
            let ty = options.param_types.as_ref().and_then(|types| types.get(i));
            let ty = resolve_type(ty, &format!("parameter `{name}`"), report);
            Variable::new(name, ty)
        })
        .collect();

    let output_name = match &options.output_name {
        Some(name) if name.trim().is_empty() => {
            report.add_error("outputName cannot be empty");
            "output0".to_string()
        }
        Some(name) => name.clone(),
        None => "output0".to_string(),
    };
    let output_ty = resolve_type(options.output_type.as_ref(), "the output", report);

    Interface {
        inputs,
        output: Variable::new(output_name, output_ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LiteralType;

    fn errors_for(arity: usize, options: InterfaceOptions) -> Vec<String> {
        let mut report = ValidationResult::new();
        build_interface(arity, &options, &mut report);
        report.errors().map(str::to_string).collect()
    }

    #[test]
    fn test_default_names() {
        let mut report = ValidationResult::new();
        let iface = build_interface(2, &InterfaceOptions::new(), &mut report);
        assert!(report.is_safe());
        assert_eq!(iface.input_names(), vec!["input0", "input1"]);
        assert_eq!(iface.output.name, "output0");
        assert_eq!(iface.output.ty, DeclaredType::Untyped);
    }

    #[test]
    fn test_param_name_rules() {
        assert_eq!(
            errors_for(2, InterfaceOptions::new().param_names(["a"])).len(),
            1
        );
        assert_eq!(
            errors_for(1, InterfaceOptions::new().param_names(["a,b"])),
            vec!["paramNames entries cannot include commas"]
        );
        assert_eq!(
            errors_for(1, InterfaceOptions::new().param_names([""])),
            vec!["paramNames entries cannot be empty"]
        );
        assert_eq!(
            errors_for(2, InterfaceOptions::new().param_names(["x", "x"])),
            vec!["paramNames entries cannot be duplicates"]
        );
    }

    #[test]
    fn test_all_problems_are_reported() {
        let errors = errors_for(
            3,
            InterfaceOptions::new()
                .param_names(["a", "a"])
                .param_types(["Double"])
                .output_name(""),
        );
        // count, duplicate, type count, unknown type, empty output
        assert_eq!(errors.len(), 5, "{errors:?}");
    }

    #[test]
    fn test_config_tags() {
        let mut report = ValidationResult::new();
        let iface = build_interface(
            2,
            &InterfaceOptions::new()
                .param_names(["a", "b"])
                .param_types([LiteralType::Integer, LiteralType::Integer])
                .output_type("integer"),
            &mut report,
        );
        let config = iface.config();
        assert_eq!(config["inputOrder"], "a,b");
        assert_eq!(config["input-a"], "integer");
        assert_eq!(config["output-output0"], "integer");
        assert_eq!(
            iface.to_wire()["inputs"]["variables"]["b"]["type"],
            json!({ "simple": "INTEGER" })
        );
    }
}
