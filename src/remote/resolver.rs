//! Fetches the interfaces of referenced tasks and launch plans before tracing.

use futures::future::try_join_all;

use crate::core::reference::{ReferenceDescriptor, ReferenceInterface, ReferenceKind};
use crate::core::registry::Registry;
use crate::error::{Error, Result};
use crate::remote::AdminApi;

/// Reads the remote interface of one reference without touching it.
pub async fn fetch_interface<A>(api: &A, reference: &ReferenceDescriptor) -> Result<ReferenceInterface>
where
    A: AdminApi + ?Sized,
{
    let missing = |detail: String| Error::MissingReference {
        id: reference.id.to_string(),
        detail,
    };

    let response = api.fetch(&reference.metadata_path()).await?;
    if let Some(message) = response.error_message() {
        log::error!("error while retrieving {}: {}", reference.id, response.body);
        return Err(missing(message.to_string()));
    }
    if !response.is_success() {
        return Err(missing(format!("HTTP {}", response.status)));
    }

    match reference.kind {
        ReferenceKind::Task => {
            let template = response
                .body
                .pointer("/closure/compiled_task/template")
                .ok_or_else(|| missing("response carries no compiled task template".to_string()))?;
            ReferenceInterface::from_task_template(template)
        }
        ReferenceKind::LaunchPlan => {
            let closure = response
                .body
                .get("closure")
                .ok_or_else(|| missing("response carries no launch plan closure".to_string()))?;
            ReferenceInterface::from_launch_plan_closure(closure)
        }
    }
}

/// Fetches and stores the interface of `reference`.
pub async fn resolve<A>(api: &A, reference: &mut ReferenceDescriptor) -> Result<()>
where
    A: AdminApi + ?Sized,
{
    let interface = fetch_interface(api, reference).await?;
    log::debug!(
        "resolved {} with inputs [{}]",
        reference.id,
        interface.interface.input_names().join(", ")
    );
    reference.populate(interface)
}

/// Resolves every unresolved reference in `registry` concurrently. The first
/// failure is returned once observed. Returns how many were resolved.
pub async fn resolve_all<A>(api: &A, registry: &mut Registry) -> Result<usize>
where
    A: AdminApi + ?Sized,
{
    let pending: Vec<_> = registry
        .unresolved_references_mut()
        .map(|reference| resolve(api, reference))
        .collect();
    let resolved = try_join_all(pending).await?;
    Ok(resolved.len())
}
