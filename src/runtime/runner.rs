//! Runs a single task inside its container.
//!
//! Each declared input is read from a file named after the input; the result
//! is written to one file named after the output. Text values are stored raw,
//! everything else as JSON.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::core::registry::Registry;
use crate::core::task::TaskDescriptor;
use crate::core::types::{DeclaredType, LiteralType};
use crate::error::{Error, Result};

/// Parses one input file's contents according to its declared type.
pub fn decode_input(raw: &str, ty: &DeclaredType) -> Result<Value> {
    match ty {
        DeclaredType::Typed(LiteralType::Text) => Ok(Value::String(raw.to_string())),
        DeclaredType::Typed(literal) => {
            let value: Value = serde_json::from_str(raw.trim())?;
            literal.validate(&value)?;
            Ok(value)
        }
        DeclaredType::Untyped => Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))),
    }
}

/// Renders a task result for the output file.
pub fn encode_output(value: &Value, ty: &DeclaredType) -> Result<String> {
    ty.validate(value)?;
    match (ty, value) {
        (DeclaredType::Typed(LiteralType::Text), Value::String(text)) => Ok(text.clone()),
        _ => Ok(serde_json::to_string(value)?),
    }
}

pub async fn read_inputs(task: &TaskDescriptor, input_dir: &Path) -> Result<Vec<Value>> {
    let mut inputs = Vec::with_capacity(task.interface.inputs.len());
    for input in &task.interface.inputs {
        let path = input_dir.join(&input.name);
        let raw = tokio::fs::read_to_string(&path).await.map_err(|err| {
            Error::Runtime(format!("cannot read input `{}` from {}: {}", input.name, path.display(), err))
        })?;
        inputs.push(decode_input(&raw, &input.ty)?);
    }
    Ok(inputs)
}

pub async fn write_output(task: &TaskDescriptor, value: &Value, output_dir: &Path) -> Result<PathBuf> {
    let output = &task.interface.output;
    let contents = encode_output(value, &output.ty)?;
    let path = output_dir.join(&output.name);
    tokio::fs::write(&path, contents).await?;
    Ok(path)
}

/// Reads the inputs of task `name`, runs its body once and writes the output.
pub async fn run_task(registry: &Registry, name: &str, input_dir: &Path, output_dir: &Path) -> Result<Value> {
    let task = registry
        .task(name)
        .ok_or_else(|| Error::Runtime(format!("no task named `{name}` is registered")))?;
    let inputs = read_inputs(&task.descriptor, input_dir).await?;
    log::info!("running task {} with {} inputs", name, inputs.len());

    let output = task.body.invoke(inputs).await?;
    let path = write_output(&task.descriptor, &output, output_dir).await?;
    log::debug!("wrote {}", path.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerTemplate;
    use crate::core::identifier::Scope;
    use crate::core::interface::Signature;
    use crate::core::task::{TaskBody, TaskOptions, build_task};
    use serde_json::json;

    #[test]
    fn test_decode_input() {
        let text = DeclaredType::Typed(LiteralType::Text);
        assert_eq!(decode_input("\"quoted\"", &text).unwrap(), json!("\"quoted\""));
        assert_eq!(decode_input("7\n", &LiteralType::Integer.into()).unwrap(), json!(7));
        assert!(decode_input("seven", &LiteralType::Integer.into()).is_err());
        assert!(decode_input("1.5", &LiteralType::Boolean.into()).is_err());
        assert_eq!(decode_input("[1, 2]", &DeclaredType::Untyped).unwrap(), json!([1, 2]));
        assert_eq!(decode_input("plain words", &DeclaredType::Untyped).unwrap(), json!("plain words"));
    }

    #[test]
    fn test_encode_output() {
        let text = DeclaredType::Typed(LiteralType::Text);
        assert_eq!(encode_output(&json!("hi"), &text).unwrap(), "hi");
        assert!(encode_output(&json!(3), &text).is_err());
        assert_eq!(encode_output(&json!("hi"), &DeclaredType::Untyped).unwrap(), "\"hi\"");
        assert_eq!(encode_output(&json!(2.5), &LiteralType::Float.into()).unwrap(), "2.5");
    }

    #[tokio::test]
    async fn test_run_task_round_trip() {
        let mut registry = Registry::new();
        let options = TaskOptions::new()
            .param_names(["greeting", "times"])
            .param_types([LiteralType::Text, LiteralType::Integer])
            .output_name("shout")
            .output_type(LiteralType::Text);
        let task = build_task(
            &Signature::new("shout", 2),
            &options,
            &Scope::new("p", "d", "v"),
            &ContainerTemplate::new("image"),
        )
        .unwrap();
        registry
            .register_task(
                task,
                TaskBody::new(|inputs| {
                    let greeting = inputs[0].as_str().unwrap_or_default().to_uppercase();
                    let times = inputs[1].as_u64().unwrap_or(1) as usize;
                    Ok(json!(greeting.repeat(times)))
                }),
            )
            .unwrap();

        let inputs = tempfile::tempdir().unwrap();
        let outputs = tempfile::tempdir().unwrap();
        std::fs::write(inputs.path().join("greeting"), "hey").unwrap();
        std::fs::write(inputs.path().join("times"), "2").unwrap();

        let result = run_task(&registry, "shout", inputs.path(), outputs.path()).await.unwrap();
        assert_eq!(result, json!("HEYHEY"));
        assert_eq!(std::fs::read_to_string(outputs.path().join("shout")).unwrap(), "HEYHEY");
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let mut registry = Registry::new();
        let task = build_task(
            &Signature::new("echo", 1),
            &TaskOptions::new(),
            &Scope::new("p", "d", "v"),
            &ContainerTemplate::new("image"),
        )
        .unwrap();
        registry
            .register_task(task, TaskBody::new(|inputs| Ok(inputs[0].clone())))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = run_task(&registry, "echo", dir.path(), dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("input0"));
        assert!(matches!(
            run_task(&registry, "missing", dir.path(), dir.path()).await,
            Err(Error::Runtime(_))
        ));
    }
}
