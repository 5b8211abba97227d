//! `karpor_cluster_registration` リソース

use crate::diagnostics::Diagnostics;
use crate::lifecycle::{self, PlanAction, PlannedChange, Resource};
use crate::schema::{Attribute, PlanModifier, Schema};
use async_trait::async_trait;
use chrono::Utc;
use karpor_client::{KarporClient, RegisterCluster, UpdateCluster};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub const CLUSTER_REGISTRATION_TYPE_NAME: &str = "karpor_cluster_registration";

/// RFC 850 layout, e.g. `Monday, 02-Jan-06 15:04:05 UTC`
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S %Z";

/// State of one cluster registration
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRegistrationModel {
    pub cluster_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl ClusterRegistrationModel {
    pub fn new(cluster_name: &str) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_credentials(mut self, credentials: &str) -> Self {
        self.credentials = Some(credentials.to_string());
        self
    }

    /// Display name as the API sees it; unset means the cluster name
    pub fn effective_display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.cluster_name)
    }

    fn effective_description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for ClusterRegistrationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterRegistrationModel")
            .field("cluster_name", &self.cluster_name)
            .field("display_name", &self.display_name)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("description", &self.description)
            .field("id", &self.id)
            .field("last_updated", &self.last_updated)
            .finish()
    }
}

/// Typed plan produced by [`ClusterRegistrationResource::plan_change`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPlan {
    pub action: PlanAction,
    pub planned: ClusterRegistrationModel,
    pub requires_replace: Vec<String>,
}

pub(crate) fn rfc850_now() -> String {
    Utc::now().format(RFC850_FORMAT).to_string()
}

/// Resource adapter between provider state and the Karpor API
#[derive(Debug, Clone, Default)]
pub struct ClusterRegistrationResource {
    client: Option<Arc<KarporClient>>,
}

impl ClusterRegistrationResource {
    pub fn new() -> Self {
        Self { client: None }
    }

    pub fn with_client(client: Arc<KarporClient>) -> Self {
        Self { client: Some(client) }
    }

    fn client(&self) -> Result<&KarporClient, Diagnostics> {
        self.client.as_deref().ok_or_else(lifecycle::unconfigured)
    }

    pub fn registration_schema() -> Schema {
        Schema::new("Manage cluster registration")
            .with_attribute(
                "cluster_name",
                Attribute::required_string("Unique name for the cluster")
                    .with_plan_modifier(PlanModifier::RequiresReplace),
            )
            .with_attribute(
                "display_name",
                Attribute::optional_string("Human-readable display name"),
            )
            .with_attribute(
                "credentials",
                Attribute::optional_string("Kubeconfig content used to register the cluster")
                    .sensitive()
                    .with_plan_modifier(PlanModifier::RequiresReplace),
            )
            .with_attribute(
                "description",
                Attribute::optional_string("Human-readable description"),
            )
            .with_attribute(
                "id",
                Attribute::computed_string("Unique identifier")
                    .with_plan_modifier(PlanModifier::UseStateForUnknown),
            )
            .with_attribute(
                "last_updated",
                Attribute::computed_string("Last updated timestamp"),
            )
    }

    /// Decide how to reach `proposed` from `prior`.
    ///
    /// `cluster_name` and `credentials` cannot change in place. `id` keeps its
    /// prior value; `last_updated` is left unknown whenever apply will write it.
    pub fn plan_change(
        &self,
        prior: Option<&ClusterRegistrationModel>,
        mut proposed: ClusterRegistrationModel,
    ) -> RegistrationPlan {
        let Some(prior) = prior else {
            proposed.id = None;
            proposed.last_updated = None;
            return RegistrationPlan {
                action: PlanAction::Create,
                planned: proposed,
                requires_replace: Vec::new(),
            };
        };

        let mut requires_replace = Vec::new();
        if prior.cluster_name != proposed.cluster_name {
            requires_replace.push("cluster_name".to_string());
        }
        if prior.credentials != proposed.credentials {
            requires_replace.push("credentials".to_string());
        }

        if !requires_replace.is_empty() {
            proposed.id = None;
            proposed.last_updated = None;
            return RegistrationPlan {
                action: PlanAction::Replace,
                planned: proposed,
                requires_replace,
            };
        }

        proposed.id = prior.id.clone();
        let changed = prior.effective_display_name() != proposed.effective_display_name()
            || prior.effective_description() != proposed.effective_description();

        let action = if changed {
            proposed.last_updated = None;
            PlanAction::Update
        } else {
            proposed.last_updated = prior.last_updated.clone();
            PlanAction::NoOp
        };

        RegistrationPlan { action, planned: proposed, requires_replace }
    }

    /// Validate the kubeconfig, then register the cluster
    pub async fn create_registration(
        &self,
        mut plan: ClusterRegistrationModel,
    ) -> Result<ClusterRegistrationModel, Diagnostics> {
        let client = self.client()?;
        let kube_config = plan.credentials.clone().unwrap_or_default();

        client
            .validate_cluster_config(&kube_config)
            .await
            .map_err(|e| Diagnostics::error("Invalid kubeconfig file", e.to_string()))?;
        info!(cluster = %plan.cluster_name, "Valid kubeconfig file");

        let display_name = plan.effective_display_name().to_string();
        let mut request =
            RegisterCluster::new(&plan.cluster_name, &kube_config).with_display_name(&display_name);
        if let Some(description) = plan.description.as_deref() {
            request = request.with_description(description);
        }

        let uid = client
            .register_cluster(&request)
            .await
            .map_err(|e| Diagnostics::error("Failed to register cluster", e.to_string()))?;
        info!(cluster = %plan.cluster_name, id = %uid, "Registered cluster");

        plan.display_name = Some(display_name);
        plan.id = Some(uid);
        plan.last_updated = Some(rfc850_now());
        Ok(plan)
    }

    /// Refresh from the server. Server values replace local ones field for field.
    pub async fn read_registration(
        &self,
        mut state: ClusterRegistrationModel,
    ) -> Result<ClusterRegistrationModel, Diagnostics> {
        let client = self.client()?;

        let remote = client.get_cluster(&state.cluster_name).await.map_err(|e| {
            Diagnostics::error(
                "Error Reading Karpor Cluster",
                format!("Could not read Karpor cluster {}: {}", state.cluster_name, e),
            )
        })?;
        debug!(cluster = %remote.name, id = %remote.uid, "Refreshed cluster");

        state.cluster_name = remote.name;
        state.display_name = Some(remote.display_name);
        state.description = Some(remote.description);
        state.id = Some(remote.uid);
        Ok(state)
    }

    /// Push the mutable fields, then read back what the server stored
    pub async fn update_registration(
        &self,
        prior: &ClusterRegistrationModel,
        mut plan: ClusterRegistrationModel,
    ) -> Result<ClusterRegistrationModel, Diagnostics> {
        let client = self.client()?;

        let update = UpdateCluster::new(plan.effective_display_name(), plan.effective_description());
        client
            .update_cluster(&plan.cluster_name, &update)
            .await
            .map_err(|e| Diagnostics::error("Failed to update cluster", e.to_string()))?;

        let remote = client.get_cluster(&plan.cluster_name).await.map_err(|e| {
            Diagnostics::error(
                "Error Reading Karpor Cluster",
                format!("Could not read Karpor cluster {}: {}", plan.cluster_name, e),
            )
        })?;
        info!(cluster = %plan.cluster_name, "Updated cluster");

        plan.display_name = Some(remote.display_name);
        plan.description = Some(remote.description);
        if plan.id.is_none() {
            plan.id = prior.id.clone();
        }
        plan.last_updated = Some(rfc850_now());
        Ok(plan)
    }

    pub async fn delete_registration(&self, state: &ClusterRegistrationModel) -> Result<(), Diagnostics> {
        let client = self.client()?;

        client.delete_cluster(&state.cluster_name).await.map_err(|e| {
            Diagnostics::error(
                "Error Deleting Karpor Cluster",
                format!("Could not delete cluster, unexpected error: {}", e),
            )
        })?;
        info!(cluster = %state.cluster_name, "Deleted cluster");
        Ok(())
    }

    /// The import id is the cluster name; the rest comes from a read
    pub async fn import_registration(&self, id: &str) -> Result<ClusterRegistrationModel, Diagnostics> {
        if id.trim().is_empty() {
            return Err(Diagnostics::error(
                "Invalid Import Identifier",
                "Expected a cluster name as the import identifier, got an empty string.",
            ));
        }
        self.read_registration(ClusterRegistrationModel::new(id)).await
    }
}

#[async_trait]
impl Resource for ClusterRegistrationResource {
    fn type_name(&self) -> &'static str {
        CLUSTER_REGISTRATION_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::registration_schema()
    }

    fn configure(&mut self, client: Arc<KarporClient>) {
        self.client = Some(client);
    }

    fn plan(&self, prior_state: Option<Value>, proposed_state: Value) -> Result<PlannedChange, Diagnostics> {
        let prior = prior_state
            .map(lifecycle::decode::<ClusterRegistrationModel>)
            .transpose()?;
        let proposed: ClusterRegistrationModel = lifecycle::decode(proposed_state)?;

        let plan = self.plan_change(prior.as_ref(), proposed);
        Ok(PlannedChange {
            action: plan.action,
            planned_state: lifecycle::encode(&plan.planned)?,
            requires_replace: plan.requires_replace,
        })
    }

    async fn create(&self, planned_state: Value) -> Result<Value, Diagnostics> {
        let plan = lifecycle::decode(planned_state)?;
        lifecycle::encode(&self.create_registration(plan).await?)
    }

    async fn read(&self, current_state: Value) -> Result<Value, Diagnostics> {
        let state = lifecycle::decode(current_state)?;
        lifecycle::encode(&self.read_registration(state).await?)
    }

    async fn update(&self, prior_state: Value, planned_state: Value) -> Result<Value, Diagnostics> {
        let prior: ClusterRegistrationModel = lifecycle::decode(prior_state)?;
        let plan = lifecycle::decode(planned_state)?;
        lifecycle::encode(&self.update_registration(&prior, plan).await?)
    }

    async fn delete(&self, current_state: Value) -> Result<(), Diagnostics> {
        let state: ClusterRegistrationModel = lifecycle::decode(current_state)?;
        self.delete_registration(&state).await
    }

    async fn import_state(&self, id: &str) -> Result<Value, Diagnostics> {
        lifecycle::encode(&self.import_registration(id).await?)
    }
}
