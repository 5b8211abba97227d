//! Provider configuration block and environment fallback

use crate::diagnostics::Diagnostics;
use karpor_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const ENV_API_ENDPOINT: &str = "KARPOR_API_ENDPOINT";
pub const ENV_API_KEY: &str = "KARPOR_API_KEY";
pub const ENV_SKIP_TLS_VERIFY: &str = "KARPOR_SKIP_TLS_VERIFY";

/// Source of environment variables
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// `provider "karpor" { ... }` block. Unset values fall back to the environment.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub skip_tls_verify: Option<bool>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_endpoint(mut self, endpoint: &str) -> Self {
        self.api_endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = Some(skip);
        self
    }

    /// Merge the block with the environment into a client configuration.
    /// Values set in the block win over environment variables.
    pub fn resolve(&self, env: &dyn EnvSource) -> Result<ClientConfig, Diagnostics> {
        let mut diags = Diagnostics::new();

        let endpoint = pick(self.api_endpoint.as_deref(), env.var(ENV_API_ENDPOINT));
        if endpoint.is_none() {
            diags.add_attribute_error(
                "api_endpoint",
                "Missing Karpor API Endpoint",
                format!(
                    "The provider cannot create the Karpor API client as there is a missing or empty value for the Karpor API endpoint. \
                     Set the api_endpoint value in the configuration or use the {} environment variable.",
                    ENV_API_ENDPOINT
                ),
            );
        }

        let api_key = pick(self.api_key.as_deref(), env.var(ENV_API_KEY));
        if api_key.is_none() {
            diags.add_attribute_error(
                "api_key",
                "Missing Karpor API Key",
                format!(
                    "The provider cannot create the Karpor API client as there is a missing or empty value for the Karpor API key. \
                     Set the api_key value in the configuration or use the {} environment variable.",
                    ENV_API_KEY
                ),
            );
        }

        let skip_tls_verify = match self.skip_tls_verify {
            Some(skip) => skip,
            None => match env.var(ENV_SKIP_TLS_VERIFY).filter(|v| !v.trim().is_empty()) {
                None => false,
                Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                    diags.add_attribute_error(
                        "skip_tls_verify",
                        "Invalid Karpor TLS Setting",
                        format!(
                            "The {} environment variable must be one of true, false, 1 or 0, got {:?}.",
                            ENV_SKIP_TLS_VERIFY, raw
                        ),
                    );
                    false
                }),
            },
        };

        match (endpoint, api_key) {
            (Some(endpoint), Some(api_key)) if !diags.has_error() => {
                Ok(ClientConfig::new(&endpoint, &api_key).with_skip_tls_verify(skip_tls_verify))
            }
            _ => Err(diags),
        }
    }
}

fn pick(configured: Option<&str>, from_env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| from_env.filter(|v| !v.trim().is_empty()))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Replacement text for secrets in logs and debug output
pub fn mask_secret(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "***"
    }
}
