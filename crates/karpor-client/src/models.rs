//! Karpor API のワイヤ型とクラスタモデル

use crate::{KarporError, KarporResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A cluster as reported by the Karpor API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Server-assigned identifier (`metadata.uid`)
    pub uid: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// Registration request for a new cluster
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterCluster {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub kube_config: String,
}

impl RegisterCluster {
    pub fn new(name: &str, kube_config: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: None,
            description: None,
            kube_config: kube_config.to_string(),
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

    /// Display name sent to the API; falls back to the cluster name
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for RegisterCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCluster")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("description", &self.description)
            .field("kube_config", &"<redacted>")
            .finish()
    }
}

/// Mutable fields of a registered cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCluster {
    pub display_name: String,
    pub description: String,
}

impl UpdateCluster {
    pub fn new(display_name: &str, description: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValidateConfigRequest<'a> {
    pub kube_config: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterClusterRequest<'a> {
    pub display_name: &'a str,
    pub description: &'a str,
    pub kube_config: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateClusterRequest<'a> {
    pub display_name: &'a str,
    pub description: &'a str,
}

/// Response envelope shared by every endpoint.
///
/// Fields of the wrong JSON type decode as absent so that shape problems are
/// reported by field path instead of as a JSON error.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub data: Option<ClusterData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClusterData {
    #[serde(default, deserialize_with = "lenient_object")]
    pub metadata: Option<ClusterMetadata>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub spec: Option<ClusterSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClusterMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClusterSpec {
    #[serde(default, rename = "displayName", deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

impl Envelope {
    /// Fails with the API message when `success` is not true
    pub(crate) fn into_data(self) -> KarporResult<Option<ClusterData>> {
        if !self.success {
            return Err(KarporError::api(self.message));
        }
        Ok(self.data)
    }
}

impl ClusterData {
    pub(crate) fn into_uid(data: Option<Self>) -> KarporResult<String> {
        let data = require(data, "data")?;
        let metadata = require(data.metadata, "data.metadata")?;
        require(metadata.uid, "data.metadata.uid")
    }

    pub(crate) fn into_cluster(data: Option<Self>) -> KarporResult<Cluster> {
        let data = require(data, "data")?;
        let metadata = require(data.metadata, "data.metadata")?;
        let uid = require(metadata.uid, "data.metadata.uid")?;
        let name = require(metadata.name, "data.metadata.name")?;
        let spec = require(data.spec, "data.spec")?;
        let display_name = require(spec.display_name, "data.spec.displayName")?;
        let description = require(spec.description, "data.spec.description")?;

        Ok(Cluster { uid, name, display_name, description })
    }
}

fn require<T>(value: Option<T>, field: &'static str) -> KarporResult<T> {
    value.ok_or(KarporError::MissingField { field })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or(false))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_envelope_success_defaults_to_false() {
        let env = envelope(json!({}));
        assert!(!env.success);
        assert!(env.message.is_none());

        let env = envelope(json!({"success": "yes", "message": 42}));
        assert!(!env.success);
        assert!(env.message.is_none());
    }

    #[test]
    fn test_envelope_failure_uses_message() {
        let err = envelope(json!({"success": false, "message": "not found"}))
            .into_data()
            .unwrap_err();
        assert!(matches!(err, KarporError::Api { ref message } if message == "not found"));
    }

    #[test]
    fn test_uid_extraction() {
        let data = envelope(json!({
            "success": true,
            "data": {"metadata": {"uid": "abc-123"}}
        }))
        .into_data()
        .unwrap();

        assert_eq!(ClusterData::into_uid(data).unwrap(), "abc-123");
    }

    #[test]
    fn test_uid_missing_at_each_level() {
        let cases = [
            (json!({"success": true}), "data"),
            (json!({"success": true, "data": "nope"}), "data"),
            (json!({"success": true, "data": {}}), "data.metadata"),
            (json!({"success": true, "data": {"metadata": []}}), "data.metadata"),
            (json!({"success": true, "data": {"metadata": {}}}), "data.metadata.uid"),
            (json!({"success": true, "data": {"metadata": {"uid": 7}}}), "data.metadata.uid"),
        ];

        for (body, expected) in cases {
            let data = envelope(body).into_data().unwrap();
            match ClusterData::into_uid(data) {
                Err(KarporError::MissingField { field }) => assert_eq!(field, expected),
                other => panic!("expected missing {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_cluster_extraction() {
        let data = envelope(json!({
            "success": true,
            "data": {
                "metadata": {"uid": "abc-123", "name": "test-cluster"},
                "spec": {"displayName": "Test", "description": "desc"}
            }
        }))
        .into_data()
        .unwrap();

        let cluster = ClusterData::into_cluster(data).unwrap();
        assert_eq!(
            cluster,
            Cluster {
                uid: "abc-123".to_string(),
                name: "test-cluster".to_string(),
                display_name: "Test".to_string(),
                description: "desc".to_string(),
            }
        );
    }

    #[test]
    fn test_cluster_missing_spec_fields() {
        let base = |spec: Value| {
            json!({
                "success": true,
                "data": {"metadata": {"uid": "u", "name": "n"}, "spec": spec}
            })
        };

        let cases = [
            (json!({"success": true, "data": {"metadata": {"uid": "u"}}}), "data.metadata.name"),
            (json!({"success": true, "data": {"metadata": {"uid": "u", "name": "n"}}}), "data.spec"),
            (base(json!({"description": "d"})), "data.spec.displayName"),
            (base(json!({"displayName": "D", "description": null})), "data.spec.description"),
        ];

        for (body, expected) in cases {
            let data = envelope(body).into_data().unwrap();
            match ClusterData::into_cluster(data) {
                Err(KarporError::MissingField { field }) => assert_eq!(field, expected),
                other => panic!("expected missing {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_register_cluster_display_name_default() {
        let request = RegisterCluster::new("prod", "apiVersion: v1");
        assert_eq!(request.display_name(), "prod");

        let request = request.with_display_name("Production");
        assert_eq!(request.display_name(), "Production");
    }

    #[test]
    fn test_register_cluster_debug_redacts_kubeconfig() {
        let request = RegisterCluster::new("prod", "client-key-data: c2VjcmV0");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("c2VjcmV0"));
    }

    #[test]
    fn test_request_bodies_use_camel_case() {
        let body = serde_json::to_value(RegisterClusterRequest {
            display_name: "Test",
            description: "desc",
            kube_config: "cfg",
        })
        .unwrap();
        assert_eq!(body, json!({"displayName": "Test", "description": "desc", "kubeConfig": "cfg"}));
    }
}
