//! A complete example: two tasks composed into a workflow, then compiled and registered.
//!
//! This example demonstrates:
//! - Declaring tasks with explicit signatures
//! - Composing them in a workflow body that is traced once
//! - Printing the assembled graph
//! - Registering against an admin endpoint, or running one task as the container would
//!
//! ```text
//! cargo run --example sum_of_squares                       # print the graph
//! GRAPHWRIGHT_ENDPOINT=localhost:30081 cargo run --example sum_of_squares
//! cargo run --example sum_of_squares -- --task square --inputdir in --outputdir out
//! ```

use graphwright::prelude::*;
use graphwright::runtime::runner::run_task;
use serde_json::{Value, json};
use std::path::Path;

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap_or_default()
}

// ============================================================================
// Declarations
// ============================================================================

fn build() -> Result<Compilation> {
    let config = RegistrationConfig::new("flytesnacks", "development", "v1")
        .endpoint(std::env::var("GRAPHWRIGHT_ENDPOINT").unwrap_or_else(|_| "localhost:30081".into()))
        .container(
            ContainerTemplate::new("ghcr.io/acme/sum-of-squares:v1")
                .command(["/usr/local/bin/sum_of_squares"]),
        );
    let mut unit = Compilation::new(config)?;

    let square = unit.task(
        Signature::new("square", 1),
        TaskOptions::new().param_names(["z"]),
        |inputs| Ok(json!(number(&inputs[0]) * number(&inputs[0]))),
    )?;
    let sum = unit.task(
        Signature::new("sum", 2),
        TaskOptions::new().param_names(["x", "y"]),
        |inputs| Ok(json!(number(&inputs[0]) + number(&inputs[1]))),
    )?;

    unit.workflow(
        Signature::new("sumOfSquares", 2),
        WorkflowOptions::new().param_names(["left", "right"]),
        move |cx, inputs| {
            let left = square.call(cx, [&inputs[0]])?;
            let right = square.call(cx, [&inputs[1]])?;
            Ok(sum.call(cx, [left, right])?.into())
        },
    )?;
    Ok(unit)
}

// ============================================================================
// Entry point
// ============================================================================

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut unit = build()?;

    if let Some(task) = flag(&args, "--task") {
        let input_dir = flag(&args, "--inputdir").unwrap_or("/var/inputs");
        let output_dir = flag(&args, "--outputdir").unwrap_or("/var/outputs");
        let output = run_task(unit.registry(), task, Path::new(input_dir), Path::new(output_dir)).await?;
        println!("{task} -> {output}");
        return Ok(());
    }

    if std::env::var("GRAPHWRIGHT_ENDPOINT").is_ok() {
        let client = unit.client();
        let report = unit.register(&client).await?;
        for status in report.statuses() {
            println!("{status}");
        }
        return Ok(());
    }

    let compiled = unit.compile().await?;
    for graph in &compiled.workflows {
        println!("{}", serde_json::to_string_pretty(&graph.to_wire())?);
    }
    Ok(())
}
