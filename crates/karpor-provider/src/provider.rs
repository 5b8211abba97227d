//! Provider root: metadata, schema, configuration

use crate::config::{mask_secret, EnvSource, ProcessEnv, ProviderConfig};
use crate::data_source::{ClusterDataSource, CLUSTER_TYPE_NAME};
use crate::diagnostics::Diagnostics;
use crate::lifecycle::{DataSource, Resource};
use crate::resource::{ClusterRegistrationResource, CLUSTER_REGISTRATION_TYPE_NAME};
use crate::schema::{Attribute, ProviderSchema, Schema};
use karpor_client::KarporClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const PROVIDER_TYPE_NAME: &str = "karpor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub type_name: String,
    pub version: String,
}

/// Client built by [`KarporProvider::configure`] and the warnings raised while building it
#[derive(Debug, Clone)]
pub struct Configured {
    pub client: Arc<KarporClient>,
    pub warnings: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct KarporProvider {
    version: String,
}

impl KarporProvider {
    pub fn new(version: &str) -> Self {
        Self { version: version.to_string() }
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: self.version.clone(),
        }
    }

    /// Schema of the `provider "karpor"` block
    pub fn schema(&self) -> Schema {
        Schema::new("Manage Kubernetes cluster registrations in Karpor")
            .with_attribute(
                "api_endpoint",
                Attribute::optional_string("Karpor API endpoint URL"),
            )
            .with_attribute(
                "api_key",
                Attribute::optional_string("API key for authentication").sensitive(),
            )
            .with_attribute(
                "skip_tls_verify",
                Attribute::optional_bool("Skip TLS certificate verification"),
            )
    }

    pub fn full_schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema {
            provider: self.schema(),
            ..ProviderSchema::default()
        };
        for resource in self.resources() {
            schema.resources.insert(resource.type_name().to_string(), resource.schema());
        }
        for data_source in self.data_sources() {
            schema.data_sources.insert(data_source.type_name().to_string(), data_source.schema());
        }
        schema
    }

    /// Build the API client from the block and the process environment
    pub fn configure(&self, config: &ProviderConfig) -> Result<Configured, Diagnostics> {
        self.configure_with_env(config, &ProcessEnv)
    }

    pub fn configure_with_env(
        &self,
        config: &ProviderConfig,
        env: &dyn EnvSource,
    ) -> Result<Configured, Diagnostics> {
        let client_config = config.resolve(env)?;

        info!(
            api_endpoint = %client_config.endpoint,
            api_key = mask_secret(&client_config.api_key),
            skip_tls_verify = client_config.skip_tls_verify,
            "Creating Karpor client"
        );
        let mut warnings = Diagnostics::new();
        if client_config.skip_tls_verify {
            warnings.add_warning(
                "Insecure Karpor API Connection",
                "TLS certificate verification is disabled; the API server's identity is not checked.",
            );
        }

        let client = KarporClient::new(client_config).map_err(|e| {
            Diagnostics::error(
                "Unable to Create Karpor API Client",
                format!("An unexpected error occurred when creating the Karpor API client: {}", e),
            )
        })?;

        info!(warnings = warnings.len(), "Configured Karpor client");
        Ok(Configured { client: Arc::new(client), warnings })
    }

    pub fn resources(&self) -> Vec<Box<dyn Resource>> {
        vec![Box::new(ClusterRegistrationResource::new())]
    }

    pub fn data_sources(&self) -> Vec<Box<dyn DataSource>> {
        vec![Box::new(ClusterDataSource::new())]
    }

    /// Resource by type name, already handed the client
    pub fn resource(&self, type_name: &str, client: Arc<KarporClient>) -> Option<Box<dyn Resource>> {
        match type_name {
            CLUSTER_REGISTRATION_TYPE_NAME => Some(Box::new(ClusterRegistrationResource::with_client(client))),
            _ => None,
        }
    }

    pub fn data_source(&self, type_name: &str, client: Arc<KarporClient>) -> Option<Box<dyn DataSource>> {
        match type_name {
            CLUSTER_TYPE_NAME => Some(Box::new(ClusterDataSource::with_client(client))),
            _ => None,
        }
    }
}

impl Default for KarporProvider {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}
