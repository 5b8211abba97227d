//! Karpor REST API クライアント
//!
//! このクレートは Karpor 管理 API に対するクラスタ登録操作を提供します:
//! - kubeconfig の検証
//! - クラスタの登録・取得・更新・削除

pub mod client;
pub mod models;

pub use client::KarporClient;
pub use models::{Cluster, RegisterCluster, UpdateCluster};

use std::fmt;

/// Default request timeout applied to every call
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Message used when the API rejects a call without saying why
pub const EMPTY_API_MESSAGE: &str = "Karpor API reported failure without a message";

/// Karpor client configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub skip_tls_verify: bool,
    pub timeout_seconds: u64,
}

impl ClientConfig {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            skip_tls_verify: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Karpor operation result type
pub type KarporResult<T> = Result<T, KarporError>;

/// Karpor client error types
#[derive(thiserror::Error, Debug)]
pub enum KarporError {
    /// Transport failure: DNS, refused connection, timeout
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("status: {status}, body: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope carried `success: false`
    #[error("{message}")]
    Api { message: String },

    /// `field` is the dotted path inside the envelope, e.g. `data.metadata.uid`
    #[error("missing or invalid {field} field in response")]
    MissingField { field: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KarporError {
    pub(crate) fn api(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| EMPTY_API_MESSAGE.to_string());
        KarporError::Api { message }
    }

    /// HTTP status code, when the failure was a non-success response
    pub fn status(&self) -> Option<u16> {
        match self {
            KarporError::Status { status, .. } => Some(*status),
            KarporError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, KarporError::Http(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("https://karpor.example.com", "secret");
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert!(!config.skip_tls_verify);

        let config = config.with_skip_tls_verify(true).with_timeout(3);
        assert!(config.skip_tls_verify);
        assert_eq!(config.timeout_seconds, 3);
    }

    #[test]
    fn test_client_config_debug_masks_api_key() {
        let config = ClientConfig::new("https://karpor.example.com", "super-secret-key");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("https://karpor.example.com"));
    }

    #[test]
    fn test_api_error_message() {
        let err = KarporError::api(Some("not found".to_string()));
        assert_eq!(err.to_string(), "not found");

        let err = KarporError::api(None);
        assert_eq!(err.to_string(), EMPTY_API_MESSAGE);

        let err = KarporError::api(Some(String::new()));
        assert_eq!(err.to_string(), EMPTY_API_MESSAGE);
    }

    #[test]
    fn test_status_error_display() {
        let err = KarporError::Status { status: 502, body: "bad gateway".to_string() };
        assert_eq!(err.to_string(), "status: 502, body: bad gateway");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_missing_field_display() {
        let err = KarporError::MissingField { field: "data.metadata.uid" };
        assert_eq!(err.to_string(), "missing or invalid data.metadata.uid field in response");
        assert_eq!(err.status(), None);
    }
}
