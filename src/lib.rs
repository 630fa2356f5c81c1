//! # Graphwright
//!
//! Trace ordinary Rust workflow code into declarative task graphs and register
//! them with a remote workflow orchestrator.
//!
//! ## Features
//!
//! - **Explicit Declarations**: Tasks and workflows carry their name, parameter names and types
//! - **Trace-Based Graphs**: A workflow body runs once; every task call it makes becomes a node
//! - **Remote References**: Use tasks and launch plans registered elsewhere by identity
//! - **Idempotent Registration**: Re-registering the same version is reported, not failed
//! - **Optional HTTP Client**: The `reqwest`-backed admin client sits behind the `remote` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graphwright::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> graphwright::Result<()> {
//! let config = RegistrationConfig::new("flytesnacks", "development", "v1")
//!     .endpoint("localhost:30081")
//!     .container(ContainerTemplate::new("ghcr.io/acme/workflows:v1").command(["/bin/workflows"]));
//! let mut unit = Compilation::new(config)?;
//!
//! let square = unit.task(Signature::new("square", 1), TaskOptions::new(), |inputs| {
//!     let z = inputs[0].as_f64().unwrap_or_default();
//!     Ok(json!(z * z))
//! })?;
//! let sum = unit.task(Signature::new("sum", 2), TaskOptions::new(), |inputs| {
//!     Ok(json!(inputs[0].as_f64().unwrap_or_default() + inputs[1].as_f64().unwrap_or_default()))
//! })?;
//!
//! unit.workflow(
//!     Signature::new("sumOfSquares", 2),
//!     WorkflowOptions::new().param_names(["left", "right"]),
//!     move |cx, inputs| {
//!         let left = square.call(cx, [&inputs[0]])?;
//!         let right = square.call(cx, [&inputs[1]])?;
//!         Ok(sum.call(cx, [left, right])?.into())
//!     },
//! )?;
//!
//! let client = unit.client();
//! let report = unit.register(&client).await?;
//! for status in report.statuses() {
//!     println!("{status}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`](crate::core): Bindings, types, descriptors, call capture, tracing and graph assembly
//! - [`remote`]: Reference resolution and upload against the admin API
//! - [`runtime`]: Running one task inside its container and reading its secrets
//! - [`prelude`]: Commonly used types (import with `use graphwright::prelude::*`)

// ============================================================================
// Modules
// ============================================================================

pub mod compile;
pub mod config;
pub mod core;
pub mod error;
pub mod remote;
pub mod runtime;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Declarations
pub use crate::core::interface::{InterfaceOptions, Signature, WorkflowOptions};
pub use crate::core::task::{Secret, SecretMountType, TaskDescriptor, TaskOptions, WorkflowDescriptor};
pub use crate::core::types::{DeclaredType, LiteralType};

// Tracing
pub use crate::core::binding::{Argument, Binding};
pub use crate::core::proxy::{AsyncTaskHandle, CallArgs, ReferenceHandle, TaskHandle};
pub use crate::core::trace::{CallLog, TraceContext};

// Output
pub use crate::core::assemble::{GraphSpec, LaunchPlan};
pub use crate::core::identifier::{Identifier, ResourceType};

// Pipeline
pub use crate::compile::{Compilation, CompiledUnit, RegistrationReport};
pub use crate::config::{ContainerTemplate, RegistrationConfig};
pub use crate::error::{Error, Result};
pub use crate::remote::upload::{UploadOutcome, UploadStatus};
pub use crate::remote::{AdminApi, ApiResponse};

// Runtime
pub use crate::runtime::secret::SecretStore;

#[cfg(feature = "remote")]
pub use crate::remote::AdminClient;

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// Imports everything needed to declare, compile and register workflows.
///
/// # Example
/// ```rust
/// use graphwright::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        AdminApi,
        // Tracing
        Argument,
        AsyncTaskHandle,
        Binding,
        CallArgs,
        // Pipeline
        Compilation,
        ContainerTemplate,
        DeclaredType,
        Error,
        LiteralType,
        ReferenceHandle,
        RegistrationConfig,
        Result,
        // Declarations
        Secret,
        SecretMountType,
        Signature,
        TaskHandle,
        TaskOptions,
        TraceContext,
        WorkflowOptions,
    };

    #[cfg(feature = "remote")]
    pub use super::AdminClient;
}

// ============================================================================
// Re-export commonly used external types for convenience
// ============================================================================

pub use serde_json::Value as JsonValue;

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
