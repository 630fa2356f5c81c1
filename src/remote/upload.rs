//! Idempotent registration of tasks, workflows and launch plans.

use futures::future::join_all;
use serde_json::Value;
use std::fmt;

use crate::core::assemble::{GraphSpec, LaunchPlan};
use crate::core::identifier::Identifier;
use crate::core::task::TaskDescriptor;
use crate::error::{Error, Result};
use crate::remote::{AdminApi, ApiResponse};

/// Admin gRPC status code for `ALREADY_EXISTS`.
const ALREADY_EXISTS_CODE: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tasks,
    Workflows,
    LaunchPlans,
}

impl Collection {
    pub fn path(self) -> &'static str {
        match self {
            Collection::Tasks => "api/v1/tasks",
            Collection::Workflows => "api/v1/workflows",
            Collection::LaunchPlans => "api/v1/launch_plans",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Workflows => "workflows",
            Collection::LaunchPlans => "launch plans",
        }
    }
}

/// Anything that can be posted to the admin API.
pub trait Registrable: Sync {
    fn id(&self) -> &Identifier;
    fn to_wire(&self) -> Value;
}

impl Registrable for TaskDescriptor {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn to_wire(&self) -> Value {
        TaskDescriptor::to_wire(self)
    }
}

impl Registrable for GraphSpec {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn to_wire(&self) -> Value {
        GraphSpec::to_wire(self)
    }
}

impl Registrable for LaunchPlan {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn to_wire(&self) -> Value {
        LaunchPlan::to_wire(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Registered,
    AlreadyRegistered,
    Failed(String),
}

impl UploadOutcome {
    pub fn classify(response: &ApiResponse) -> Self {
        let already_exists = response.status == 409
            || (response.body.get("code").and_then(Value::as_i64) == Some(ALREADY_EXISTS_CODE)
                && response
                    .error_message()
                    .is_some_and(|message| message.contains("already exists")));
        if already_exists {
            return UploadOutcome::AlreadyRegistered;
        }
        let empty_object = response.body.as_object().is_some_and(|body| body.is_empty());
        if response.is_success() && empty_object {
            return UploadOutcome::Registered;
        }
        UploadOutcome::Failed(format!("HTTP {}: {}", response.status, response.body))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UploadOutcome::Failed(_))
    }
}

/// The outcome of one object's upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStatus {
    pub id: Identifier,
    pub outcome: UploadOutcome,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            UploadOutcome::Registered => write!(f, "Registered {}", self.id),
            UploadOutcome::AlreadyRegistered => write!(f, "{} already registered", self.id),
            UploadOutcome::Failed(reason) => write!(f, "Error while registering {}: {}", self.id, reason),
        }
    }
}

async fn upload_one<A, T>(api: &A, collection: Collection, spec: &T) -> UploadStatus
where
    A: AdminApi + ?Sized,
    T: Registrable,
{
    let outcome = match api.submit(collection.path(), &spec.to_wire()).await {
        Ok(response) => UploadOutcome::classify(&response),
        Err(err) => UploadOutcome::Failed(err.to_string()),
    };
    let status = UploadStatus {
        id: spec.id().clone(),
        outcome,
    };
    if status.outcome.is_failure() {
        log::error!("{}", status);
    } else {
        log::info!("{}", status);
    }
    status
}

/// Posts every spec of one collection concurrently.
///
/// All requests run to completion; if any failed, the error lists every
/// failure. Already-registered objects count as success.
pub async fn upload<A, T>(api: &A, collection: Collection, specs: &[T]) -> Result<Vec<UploadStatus>>
where
    A: AdminApi + ?Sized,
    T: Registrable,
{
    let statuses = join_all(specs.iter().map(|spec| upload_one(api, collection, spec))).await;
    let failures: Vec<String> = statuses
        .iter()
        .filter(|status| status.outcome.is_failure())
        .map(ToString::to_string)
        .collect();
    if !failures.is_empty() {
        return Err(Error::Registration {
            kind: collection.describe().to_string(),
            failures,
        });
    }
    Ok(statuses)
}
