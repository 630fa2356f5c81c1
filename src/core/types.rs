//! The closed set of literal types a task interface can declare.
//!
//! Every entry pairs a logical name with the orchestrator's wire name and a
//! validator. Interfaces that declare nothing stay [`DeclaredType::Untyped`]:
//! they travel as `STRING` on the wire and skip validation entirely.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use crate::error::{Error, Result};

/// A logical literal type known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralType {
    Float,
    Text,
    Boolean,
    Integer,
}

/// One row of the type table.
pub struct TypeEntry {
    pub literal: LiteralType,
    pub name: &'static str,
    pub wire_name: &'static str,
    pub validator: fn(&Value) -> bool,
}

fn is_float(value: &Value) -> bool {
    value.is_number()
}

fn is_text(value: &Value) -> bool {
    value.is_string()
}

fn is_boolean(value: &Value) -> bool {
    value.is_boolean()
}

/// The value as a signed 64-bit integer, when it is one exactly.
fn exact_i64(value: &Value) -> Option<i64> {
    // -2^63 and 2^63 are exact in f64; anything at or past 2^63 would saturate.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= -LIMIT && *f < LIMIT)
            .map(|f| f as i64)
    })
}

fn is_integer(value: &Value) -> bool {
    exact_i64(value).is_some()
}

pub static TYPE_TABLE: [TypeEntry; 4] = [
    TypeEntry {
        literal: LiteralType::Float,
        name: "float",
        wire_name: "FLOAT",
        validator: is_float,
    },
    TypeEntry {
        literal: LiteralType::Text,
        name: "text",
        wire_name: "STRING",
        validator: is_text,
    },
    TypeEntry {
        literal: LiteralType::Boolean,
        name: "boolean",
        wire_name: "BOOLEAN",
        validator: is_boolean,
    },
    TypeEntry {
        literal: LiteralType::Integer,
        name: "integer",
        wire_name: "INTEGER",
        validator: is_integer,
    },
];

impl LiteralType {
    pub fn entry(self) -> &'static TypeEntry {
        match self {
            LiteralType::Float => &TYPE_TABLE[0],
            LiteralType::Text => &TYPE_TABLE[1],
            LiteralType::Boolean => &TYPE_TABLE[2],
            LiteralType::Integer => &TYPE_TABLE[3],
        }
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn wire_name(self) -> &'static str {
        self.entry().wire_name
    }

    /// Looks a type up by its logical name (case-insensitive) or its wire name.
    pub fn lookup(name: &str) -> Option<Self> {
        TYPE_TABLE
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name) || e.wire_name == name)
            .map(|e| e.literal)
    }

    /// Inverse of [`LiteralType::wire_name`], used on remote interface metadata.
    pub fn lookup_by_wire_name(wire_name: &str) -> Option<Self> {
        TYPE_TABLE
            .iter()
            .find(|e| e.wire_name == wire_name)
            .map(|e| e.literal)
    }

    pub fn validate(self, value: &Value) -> Result<()> {
        if (self.entry().validator)(value) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: self,
                value: value.clone(),
            })
        }
    }

    /// Renders an already-validated value as a wire primitive.
    pub fn primitive(self, value: &Value) -> Value {
        match self {
            LiteralType::Float => json!({ "float_value": value }),
            LiteralType::Text => json!({ "string_value": value }),
            LiteralType::Boolean => json!({ "boolean": value }),
            LiteralType::Integer => match exact_i64(value) {
                Some(i) => json!({ "integer": i }),
                None => json!({ "integer": value }),
            },
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The type an interface variable declares; `Untyped` is the loose legacy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclaredType {
    #[default]
    Untyped,
    Typed(LiteralType),
}

impl DeclaredType {
    pub fn literal(&self) -> Option<LiteralType> {
        match self {
            DeclaredType::Untyped => None,
            DeclaredType::Typed(t) => Some(*t),
        }
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        match self {
            DeclaredType::Untyped => Ok(()),
            DeclaredType::Typed(t) => t.validate(value),
        }
    }

    pub fn wire_type(&self) -> Value {
        let simple = match self {
            DeclaredType::Untyped => "STRING",
            DeclaredType::Typed(t) => t.wire_name(),
        };
        json!({ "simple": simple })
    }

    /// Tag written into a task's `config` map, read back by the runner and by
    /// reference resolution.
    pub fn config_tag(&self) -> &'static str {
        match self {
            DeclaredType::Untyped => "untyped",
            DeclaredType::Typed(t) => t.name(),
        }
    }
}

impl From<LiteralType> for DeclaredType {
    fn from(value: LiteralType) -> Self {
        DeclaredType::Typed(value)
    }
}

/// A type as written in task or workflow options; names are resolved against
/// the table when the descriptor is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Literal(LiteralType),
    Named(String),
}

impl TypeRef {
    pub fn resolve(&self) -> Option<LiteralType> {
        match self {
            TypeRef::Literal(t) => Some(*t),
            TypeRef::Named(name) => LiteralType::lookup(name),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Literal(t) => write!(f, "{t}"),
            TypeRef::Named(name) => f.write_str(name),
        }
    }
}

impl From<LiteralType> for TypeRef {
    fn from(value: LiteralType) -> Self {
        TypeRef::Literal(value)
    }
}

impl From<&str> for TypeRef {
    fn from(value: &str) -> Self {
        TypeRef::Named(value.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(value: String) -> Self {
        TypeRef::Named(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators() {
        assert!(LiteralType::Float.validate(&json!(1.5)).is_ok());
        assert!(LiteralType::Float.validate(&json!(2)).is_ok());
        assert!(LiteralType::Text.validate(&json!("hi")).is_ok());
        assert!(LiteralType::Boolean.validate(&json!(false)).is_ok());
        assert!(LiteralType::Integer.validate(&json!(42)).is_ok());
        assert!(LiteralType::Integer.validate(&json!(3.0)).is_ok());

        assert!(matches!(
            LiteralType::Integer.validate(&json!(3.5)),
            Err(Error::TypeMismatch { expected: LiteralType::Integer, .. })
        ));
        assert!(LiteralType::Text.validate(&json!(1)).is_err());
        assert!(LiteralType::Boolean.validate(&json!("true")).is_err());
    }

    #[test]
    fn test_integer_bounds() {
        assert!(LiteralType::Integer.validate(&json!(i64::MAX)).is_ok());
        assert!(LiteralType::Integer.validate(&json!(i64::MIN)).is_ok());
        assert!(LiteralType::Integer.validate(&json!(-9.0e18)).is_ok());

        assert!(LiteralType::Integer.validate(&json!(1e30)).is_err());
        assert!(LiteralType::Integer.validate(&json!(9.3e18)).is_err());
        assert!(LiteralType::Integer.validate(&json!(i64::MAX as u64 + 1)).is_err());
        assert!(LiteralType::Integer.validate(&json!(u64::MAX)).is_err());

        assert_eq!(
            LiteralType::Integer.primitive(&json!(-9.0e18)),
            json!({ "integer": -9_000_000_000_000_000_000i64 })
        );
        assert_eq!(
            LiteralType::Integer.primitive(&json!(i64::MAX)),
            json!({ "integer": i64::MAX })
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(LiteralType::lookup("integer"), Some(LiteralType::Integer));
        assert_eq!(LiteralType::lookup("Text"), Some(LiteralType::Text));
        assert_eq!(LiteralType::lookup("FLOAT"), Some(LiteralType::Float));
        assert_eq!(LiteralType::lookup("Double"), None);

        assert_eq!(
            LiteralType::lookup_by_wire_name("STRING"),
            Some(LiteralType::Text)
        );
        assert_eq!(LiteralType::lookup_by_wire_name("text"), None);
    }

    #[test]
    fn test_untyped_skips_validation() {
        let loose = DeclaredType::Untyped;
        assert!(loose.validate(&json!([1, "two", false])).is_ok());
        assert_eq!(loose.wire_type(), json!({ "simple": "STRING" }));
        assert_eq!(loose.config_tag(), "untyped");
    }

    #[test]
    fn test_primitive_rendering() {
        assert_eq!(
            LiteralType::Integer.primitive(&json!(42)),
            json!({ "integer": 42 })
        );
        assert_eq!(
            LiteralType::Integer.primitive(&json!(7.0)),
            json!({ "integer": 7 })
        );
        assert_eq!(
            LiteralType::Text.primitive(&json!("hi")),
            json!({ "string_value": "hi" })
        );
    }
}
