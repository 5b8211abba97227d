//! Karpor クラスタ API クライアント

use crate::models::{
    ClusterData, Envelope, RegisterClusterRequest, UpdateClusterRequest, ValidateConfigRequest,
};
use crate::{ClientConfig, Cluster, KarporError, KarporResult, RegisterCluster, UpdateCluster};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Url};
use std::time::Duration;
use tracing::debug;

const CLUSTER_SEGMENTS: [&str; 3] = ["rest-api", "v1", "cluster"];
const VALIDATE_SEGMENTS: [&str; 2] = ["config", "validate"];

/// Client for the Karpor cluster registration API.
///
/// One `reqwest::Client` is built at construction and reused for every call.
/// Configuration is fixed after construction.
#[derive(Debug, Clone)]
pub struct KarporClient {
    config: ClientConfig,
    base_url: Url,
    client: Client,
}

impl KarporClient {
    /// Create new Karpor client
    pub fn new(mut config: ClientConfig) -> KarporResult<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(KarporError::Config("API endpoint must not be empty".to_string()));
        }
        if config.api_key.is_empty() {
            return Err(KarporError::Config("API key must not be empty".to_string()));
        }
        let base_url = Url::parse(&endpoint)
            .map_err(|e| KarporError::Config(format!("invalid API endpoint {:?}: {}", endpoint, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(KarporError::Config(format!("API endpoint {:?} cannot carry a path", endpoint)));
        }
        config.endpoint = endpoint;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .map_err(|e| KarporError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, base_url, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Endpoint joined with path segments. Each segment is percent-encoded,
    /// so `/`, `?` and `#` in a cluster name stay inside that segment.
    fn url(&self, segments: &[&str]) -> KarporResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| KarporError::Config("API endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(CLUSTER_SEGMENTS)
            .extend(segments);
        Ok(url)
    }

    fn cluster_url(&self, name: &str) -> KarporResult<Url> {
        // Dot segments are dropped by the URL builder and would address the collection
        if name.is_empty() || name == "." || name == ".." {
            return Err(KarporError::Config(format!("invalid cluster name {:?}", name)));
        }
        self.url(&[name])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> KarporResult<Envelope> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Karpor API responded");

        if !status.is_success() {
            return Err(KarporError::Status { status: status.as_u16(), body });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Ask the API whether a kubeconfig is usable for registration
    pub async fn validate_cluster_config(&self, kube_config: &str) -> KarporResult<()> {
        let url = self.url(&VALIDATE_SEGMENTS)?;
        debug!(path = url.path(), "validating cluster config");

        let request = self
            .request(Method::POST, url)
            .json(&ValidateConfigRequest { kube_config });

        self.send(request).await?.into_data()?;
        Ok(())
    }

    /// Register a cluster and return the server-assigned uid
    pub async fn register_cluster(&self, cluster: &RegisterCluster) -> KarporResult<String> {
        let url = self.cluster_url(&cluster.name)?;
        debug!(cluster = %cluster.name, "registering cluster");

        let request = self.request(Method::POST, url).json(&RegisterClusterRequest {
            display_name: cluster.display_name(),
            description: cluster.description.as_deref().unwrap_or_default(),
            kube_config: &cluster.kube_config,
        });

        let data = self.send(request).await?.into_data()?;
        ClusterData::into_uid(data)
    }

    pub async fn get_cluster(&self, name: &str) -> KarporResult<Cluster> {
        let url = self.cluster_url(name)?;
        debug!(cluster = %name, "fetching cluster");

        let data = self.send(self.request(Method::GET, url)).await?.into_data()?;
        ClusterData::into_cluster(data)
    }

    /// Update display name and description. The response carries no data;
    /// call [`KarporClient::get_cluster`] to observe the stored values.
    pub async fn update_cluster(&self, name: &str, update: &UpdateCluster) -> KarporResult<()> {
        let url = self.cluster_url(name)?;
        debug!(cluster = %name, "updating cluster");

        let request = self.request(Method::PUT, url).json(&UpdateClusterRequest {
            display_name: &update.display_name,
            description: &update.description,
        });

        self.send(request).await?.into_data()?;
        Ok(())
    }

    pub async fn delete_cluster(&self, name: &str) -> KarporResult<()> {
        let url = self.cluster_url(name)?;
        debug!(cluster = %name, "deleting cluster");

        self.send(self.request(Method::DELETE, url)).await?.into_data()?;
        Ok(())
    }
}
