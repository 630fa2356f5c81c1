//! Edge values flowing through a traced graph.
//!
//! A [`Binding`] either points at an output of a node that already exists or
//! carries a literal constant. Call sites and workflow bodies hand in
//! [`Argument`]s, which [`as_binding`] turns into bindings. A pending future
//! has no `Argument` conversion, so an un-awaited task call cannot become an
//! edge.

use serde::Serialize;
use serde_json::{Value, json};

use crate::core::types::DeclaredType;
use crate::error::{Error, Result};

/// The id of the synthetic node whose outputs are the workflow inputs.
pub const START_NODE: &str = "start-node";
/// The id of the synthetic node whose single input is the workflow result.
pub const END_NODE: &str = "end-node";

/// A reference to the named output of a node recorded earlier in the trace.
///
/// Only the tracer mints these, so every promise names a workflow input or the
/// output of a call captured before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromiseBinding {
    pub(crate) node_id: String,
    pub(crate) var: String,
}

impl PromiseBinding {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

/// A literal constant together with the type it was validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveBinding {
    pub value: Value,
    pub ty: DeclaredType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Promise(PromiseBinding),
    Primitive(PrimitiveBinding),
}

impl Binding {
    pub(crate) fn promise(node_id: impl Into<String>, var: impl Into<String>) -> Self {
        Binding::Promise(PromiseBinding {
            node_id: node_id.into(),
            var: var.into(),
        })
    }

    pub fn primitive(value: Value, ty: DeclaredType) -> Self {
        Binding::Primitive(PrimitiveBinding { value, ty })
    }

    pub fn as_promise(&self) -> Option<&PromiseBinding> {
        match self {
            Binding::Promise(p) => Some(p),
            Binding::Primitive(_) => None,
        }
    }

    /// The upstream node this binding depends on, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Binding::Promise(p) => Some(&p.node_id),
            Binding::Primitive(_) => None,
        }
    }

    pub fn to_wire(&self) -> Value {
        match self {
            Binding::Promise(p) => json!({
                "promise": {
                    "node_id": p.node_id,
                    "var": p.var,
                }
            }),
            Binding::Primitive(p) => {
                let primitive = match p.ty.literal() {
                    Some(literal) => literal.primitive(&p.value),
                    None => json!({ "string_value": p.value.to_string() }),
                };
                json!({ "scalar": { "primitive": primitive } })
            }
        }
    }
}

/// Anything a task call or a workflow body can hand to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Bound(Binding),
    Literal(Value),
}

impl Argument {
    /// Serializes an arbitrary value into a literal argument.
    pub fn literal<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Argument::Literal(serde_json::to_value(value)?))
    }
}

impl From<Binding> for Argument {
    fn from(value: Binding) -> Self {
        Argument::Bound(value)
    }
}

impl From<&Binding> for Argument {
    fn from(value: &Binding) -> Self {
        Argument::Bound(value.clone())
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Literal(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Literal(Value::from(value))
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Literal(Value::from(value))
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Argument::Literal(Value::from(value))
    }
}

impl From<i32> for Argument {
    fn from(value: i32) -> Self {
        Argument::Literal(Value::from(value))
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Literal(Value::from(value))
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Argument::Literal(Value::from(value))
    }
}

/// Strings, booleans, numbers, and arrays or objects built only from those.
pub fn is_serializable(value: &Value) -> bool {
    match value {
        Value::String(_) | Value::Bool(_) | Value::Number(_) => true,
        Value::Array(items) => items.iter().all(is_serializable),
        Value::Object(map) => map.values().all(is_serializable),
        Value::Null => false,
    }
}

/// Turns an argument into a graph edge, validating literals against `expected`.
pub fn as_binding(argument: Argument, expected: &DeclaredType) -> Result<Binding> {
    match argument {
        Argument::Bound(Binding::Primitive(p)) => {
            expected.validate(&p.value)?;
            let ty = match expected {
                DeclaredType::Untyped => p.ty,
                typed => *typed,
            };
            Ok(Binding::primitive(p.value, ty))
        }
        Argument::Bound(binding) => Ok(binding),
        Argument::Literal(value) => {
            if !is_serializable(&value) {
                return Err(Error::InvalidInput(format!(
                    "{value} is not a serializable literal"
                )));
            }
            expected.validate(&value)?;
            Ok(Binding::primitive(value, *expected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LiteralType;

    #[test]
    fn test_is_serializable() {
        assert!(is_serializable(&json!("hello world")));
        assert!(is_serializable(&json!(true)));
        assert!(is_serializable(&json!(10)));
        assert!(is_serializable(&json!([1, "hi", false])));
        assert!(is_serializable(&json!({ "x": 10 })));

        assert!(!is_serializable(&Value::Null));
        assert!(!is_serializable(&json!([1, null])));
        assert!(!is_serializable(&json!({ "x": null })));
    }

    #[test]
    fn test_promise_passes_through() {
        let promise = Binding::promise("square-0", "squared");
        let bound = as_binding(promise.clone().into(), &LiteralType::Integer.into()).unwrap();
        assert_eq!(bound, promise);
    }

    #[test]
    fn test_literal_is_wrapped_and_validated() {
        let bound = as_binding(42.into(), &LiteralType::Integer.into()).unwrap();
        assert_eq!(
            bound,
            Binding::primitive(json!(42), DeclaredType::Typed(LiteralType::Integer))
        );

        let err = as_binding("42".into(), &LiteralType::Integer.into()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let err = as_binding(json!(1e30).into(), &LiteralType::Integer.into()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let err = as_binding(Value::Null.into(), &DeclaredType::Untyped).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_primitive_is_revalidated() {
        let loose = Binding::primitive(json!("text"), DeclaredType::Untyped);
        assert!(as_binding(loose.clone().into(), &LiteralType::Integer.into()).is_err());

        let retyped = as_binding(loose.into(), &LiteralType::Text.into()).unwrap();
        assert_eq!(
            retyped,
            Binding::primitive(json!("text"), DeclaredType::Typed(LiteralType::Text))
        );
    }

    #[test]
    fn test_wire_rendering() {
        let integer = Binding::primitive(json!(42), LiteralType::Integer.into());
        assert_eq!(
            integer.to_wire(),
            json!({ "scalar": { "primitive": { "integer": 42 } } })
        );

        let text = Binding::primitive(json!("hi"), LiteralType::Text.into());
        assert_eq!(
            text.to_wire(),
            json!({ "scalar": { "primitive": { "string_value": "hi" } } })
        );

        let loose = Binding::primitive(json!("hi"), DeclaredType::Untyped);
        assert_eq!(
            loose.to_wire(),
            json!({ "scalar": { "primitive": { "string_value": "\"hi\"" } } })
        );

        let promise = Binding::promise(START_NODE, "left");
        assert_eq!(
            promise.to_wire(),
            json!({ "promise": { "node_id": "start-node", "var": "left" } })
        );
    }
}
