//! `karpor_cluster` data source

use crate::diagnostics::Diagnostics;
use crate::lifecycle::{self, DataSource};
use crate::schema::{Attribute, Schema};
use async_trait::async_trait;
use karpor_client::KarporClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const CLUSTER_TYPE_NAME: &str = "karpor_cluster";

/// Lookup by cluster name; everything else is filled from the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLookup {
    pub cluster_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl ClusterLookup {
    pub fn new(cluster_name: &str) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClusterDataSource {
    client: Option<Arc<KarporClient>>,
}

impl ClusterDataSource {
    pub fn new() -> Self {
        Self { client: None }
    }

    pub fn with_client(client: Arc<KarporClient>) -> Self {
        Self { client: Some(client) }
    }

    pub fn lookup_schema() -> Schema {
        Schema::new("Get cluster information")
            .with_attribute("cluster_name", Attribute::required_string("Name of the cluster"))
            .with_attribute("display_name", Attribute::computed_string("Human-readable display name"))
            .with_attribute("description", Attribute::computed_string("Human-readable description"))
            .with_attribute("id", Attribute::computed_string("Unique identifier"))
    }

    pub async fn read_cluster(&self, lookup: ClusterLookup) -> Result<ClusterLookup, Diagnostics> {
        let client = self.client.as_deref().ok_or_else(lifecycle::unconfigured)?;

        let cluster = client
            .get_cluster(&lookup.cluster_name)
            .await
            .map_err(|e| Diagnostics::error("Failed to get cluster", e.to_string()))?;
        debug!(cluster = %lookup.cluster_name, id = %cluster.uid, "Read cluster data source");

        Ok(ClusterLookup {
            cluster_name: lookup.cluster_name,
            display_name: Some(cluster.display_name),
            description: Some(cluster.description),
            id: Some(cluster.uid),
        })
    }
}

#[async_trait]
impl DataSource for ClusterDataSource {
    fn type_name(&self) -> &'static str {
        CLUSTER_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::lookup_schema()
    }

    fn configure(&mut self, client: Arc<KarporClient>) {
        self.client = Some(client);
    }

    async fn read(&self, config: Value) -> Result<Value, Diagnostics> {
        let lookup = lifecycle::decode(config)?;
        lifecycle::encode(&self.read_cluster(lookup).await?)
    }
}
