//! Lifecycle traits the host dispatches to.
//!
//! State crosses this boundary as `serde_json::Value` keyed by attribute name.

use crate::diagnostics::Diagnostics;
use crate::schema::Schema;
use async_trait::async_trait;
use karpor_client::KarporClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// What applying a plan will do to the remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    Replace,
    NoOp,
}

/// Planned changes for a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedChange {
    pub action: PlanAction,

    /// The planned state after apply
    pub planned_state: Value,

    /// Attributes that require resource replacement
    pub requires_replace: Vec<String>,
}

/// A managed resource type
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Hand the configured API client to the resource
    fn configure(&mut self, client: Arc<KarporClient>);

    fn plan(&self, prior_state: Option<Value>, proposed_state: Value) -> Result<PlannedChange, Diagnostics>;

    async fn create(&self, planned_state: Value) -> Result<Value, Diagnostics>;

    async fn read(&self, current_state: Value) -> Result<Value, Diagnostics>;

    async fn update(&self, prior_state: Value, planned_state: Value) -> Result<Value, Diagnostics>;

    async fn delete(&self, current_state: Value) -> Result<(), Diagnostics>;

    /// Build state for an existing remote object from its import id
    async fn import_state(&self, id: &str) -> Result<Value, Diagnostics>;
}

/// A read-only data source type
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn configure(&mut self, client: Arc<KarporClient>);

    async fn read(&self, config: Value) -> Result<Value, Diagnostics>;
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Diagnostics> {
    serde_json::from_value(value).map_err(|e| {
        Diagnostics::error(
            "Value Conversion Error",
            format!("Could not convert state into the provider model: {}", e),
        )
    })
}

pub(crate) fn encode<T: Serialize>(model: &T) -> Result<Value, Diagnostics> {
    serde_json::to_value(model).map_err(|e| {
        Diagnostics::error(
            "Value Conversion Error",
            format!("Could not convert the provider model into state: {}", e),
        )
    })
}

/// Error returned by any lifecycle call made before `configure`
pub(crate) fn unconfigured() -> Diagnostics {
    Diagnostics::error(
        "Unconfigured Karpor client",
        "Expected a configured Karpor client. Please report this issue to the provider developers.",
    )
}
