//! Tests for the karpor-cli crate

use clap::Parser;
use karpor_cli::{Cli, CommandExecutor, Commands, OutputFormat};
use karpor_provider::ProviderConfig;
use mockito::Server;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

fn executor_for(server: &Server) -> CommandExecutor {
    CommandExecutor::with_env(
        ProviderConfig::new()
            .with_api_endpoint(&server.url())
            .with_api_key("test-api-key"),
        HashMap::<String, String>::new(),
    )
}

fn kubeconfig_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_cli_parsing_schema() {
    let cli = Cli::try_parse_from(["karpor", "schema"]).unwrap();
    assert_eq!(cli.command, Commands::Schema);
    assert_eq!(cli.format, OutputFormat::Text);
}

#[test]
fn test_cli_parsing_register() {
    let args = [
        "karpor",
        "register",
        "--name",
        "test-cluster",
        "--kubeconfig",
        "config.yaml",
        "--display-name",
        "Test",
        "--format",
        "json",
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    match cli.command {
        Commands::Register { name, kubeconfig, display_name, description } => {
            assert_eq!(name, "test-cluster");
            assert_eq!(kubeconfig, PathBuf::from("config.yaml"));
            assert_eq!(display_name.as_deref(), Some("Test"));
            assert!(description.is_none());
        }
        other => panic!("Expected Register command, got {:?}", other),
    }
    assert_eq!(cli.format, OutputFormat::Json);
}

#[test]
fn test_cli_register_requires_kubeconfig() {
    assert!(Cli::try_parse_from(["karpor", "register", "--name", "x"]).is_err());
}

#[test]
fn test_cli_global_connection_flags() {
    let args = [
        "karpor",
        "get",
        "test-cluster",
        "--api-endpoint",
        "https://127.0.0.1:7443",
        "--api-key",
        "secret",
        "--skip-tls-verify",
    ];
    let cli = Cli::try_parse_from(args).unwrap();
    let config = cli.provider_config();

    assert_eq!(config.api_endpoint.as_deref(), Some("https://127.0.0.1:7443"));
    assert_eq!(config.api_key.as_deref(), Some("secret"));
    assert_eq!(config.skip_tls_verify, Some(true));
    assert_eq!(cli.command, Commands::Get { name: "test-cluster".to_string() });
}

#[test]
fn test_cli_unset_tls_flag_defers_to_env() {
    let cli = Cli::try_parse_from(["karpor", "delete", "test-cluster"]).unwrap();
    assert_eq!(cli.provider_config().skip_tls_verify, None);
}

#[test]
fn test_cli_tls_flag_can_be_disabled_explicitly() {
    let cli = Cli::try_parse_from(["karpor", "delete", "test-cluster", "--skip-tls-verify=false"]).unwrap();
    assert_eq!(cli.provider_config().skip_tls_verify, Some(false));

    let cli = Cli::try_parse_from(["karpor", "get", "--skip-tls-verify", "test-cluster"]).unwrap();
    assert_eq!(cli.provider_config().skip_tls_verify, Some(true));
    assert_eq!(cli.command, Commands::Get { name: "test-cluster".to_string() });

    assert!(Cli::try_parse_from(["karpor", "get", "x", "--skip-tls-verify=maybe"]).is_err());
}

#[tokio::test]
async fn test_schema_needs_no_connection() {
    let executor = CommandExecutor::new(ProviderConfig::new());
    let result = executor.execute(Commands::Schema).await.unwrap();

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["metadata"]["type_name"], "karpor");
    assert!(data["schema"]["resources"]["karpor_cluster_registration"].is_object());
    assert!(data["schema"]["data_sources"]["karpor_cluster"].is_object());
}

#[tokio::test]
async fn test_register_command() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rest-api/v1/cluster/config/validate")
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/rest-api/v1/cluster/test-cluster")
        .with_status(200)
        .with_body(r#"{"success":true,"data":{"metadata":{"uid":"abc-123"}}}"#)
        .create_async()
        .await;

    let kubeconfig = kubeconfig_file("apiVersion: v1\nclient-key-data: c2VjcmV0\n");
    let result = executor_for(&server)
        .execute(Commands::Register {
            name: "test-cluster".to_string(),
            kubeconfig: kubeconfig.path().to_path_buf(),
            display_name: None,
            description: Some("desc".to_string()),
        })
        .await
        .unwrap();

    assert!(result.success, "{}", result.message);
    let data = result.data.as_ref().unwrap();
    assert_eq!(data["id"], "abc-123");
    assert_eq!(data["display_name"], "test-cluster");
    assert!(data.get("credentials").is_none());

    let rendered = result.render(&OutputFormat::Json).unwrap();
    assert!(!rendered.contains("c2VjcmV0"));
}

#[tokio::test]
async fn test_get_command_failure_reports_diagnostic() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest-api/v1/cluster/test-cluster")
        .with_status(200)
        .with_body(r#"{"success":false,"message":"not found"}"#)
        .create_async()
        .await;

    let result = executor_for(&server)
        .execute(Commands::Get { name: "test-cluster".to_string() })
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.message, "Error: Failed to get cluster: not found");
    assert_eq!(result.render(&OutputFormat::Text).unwrap(), result.message);
}

#[tokio::test]
async fn test_update_command_keeps_unset_fields() {
    let mut server = Server::new_async().await;
    let current = json!({
        "success": true,
        "data": {
            "metadata": {"uid": "abc-123", "name": "test-cluster"},
            "spec": {"displayName": "Test", "description": "old"}
        }
    });
    let updated = json!({
        "success": true,
        "data": {
            "metadata": {"uid": "abc-123", "name": "test-cluster"},
            "spec": {"displayName": "Test", "description": "new"}
        }
    });
    server
        .mock("GET", "/rest-api/v1/cluster/test-cluster")
        .with_status(200)
        .with_body(current.to_string())
        .expect(1)
        .create_async()
        .await;
    // Matched once the first GET has used up its single expected hit
    server
        .mock("GET", "/rest-api/v1/cluster/test-cluster")
        .with_status(200)
        .with_body(updated.to_string())
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/rest-api/v1/cluster/test-cluster")
        .match_body(mockito::Matcher::Json(json!({"displayName": "Test", "description": "new"})))
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;

    let result = executor_for(&server)
        .execute(Commands::Update {
            name: "test-cluster".to_string(),
            display_name: None,
            description: Some("new".to_string()),
        })
        .await
        .unwrap();
    assert!(result.success, "{}", result.message);
    assert_eq!(result.data.unwrap()["description"], "new");
    put.assert_async().await;
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn test_missing_connection_settings() {
    let executor = CommandExecutor::with_env(
        ProviderConfig::new().with_api_endpoint("https://karpor"),
        env(&[]),
    );
    let result = executor
        .execute(Commands::Delete { name: "test-cluster".to_string() })
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.message.contains("Missing Karpor API Key"));
    assert!(!result.message.contains("Missing Karpor API Endpoint"));
}

#[tokio::test]
async fn test_settings_fall_back_to_env() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/rest-api/v1/cluster/test-cluster")
        .match_header("authorization", "Bearer env-key")
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;

    let url = server.url();
    let executor = CommandExecutor::with_env(
        ProviderConfig::new(),
        env(&[("KARPOR_API_ENDPOINT", url.as_str()), ("KARPOR_API_KEY", "env-key")]),
    );
    let result = executor
        .execute(Commands::Delete { name: "test-cluster".to_string() })
        .await
        .unwrap();

    assert!(result.success, "{}", result.message);
    assert!(result.warnings.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_skip_tls_verify_reports_warning() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/rest-api/v1/cluster/test-cluster")
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;

    let executor = CommandExecutor::with_env(
        ProviderConfig::new()
            .with_api_endpoint(&server.url())
            .with_api_key("test-api-key")
            .with_skip_tls_verify(true),
        env(&[]),
    );
    let result = executor
        .execute(Commands::Delete { name: "test-cluster".to_string() })
        .await
        .unwrap();

    assert!(result.success, "{}", result.message);
    assert_eq!(result.warnings.len(), 1);
    assert!(!result.warnings.has_error());

    let rendered: serde_json::Value =
        serde_json::from_str(&result.render(&OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(rendered["deleted"], true);
    assert_eq!(rendered["warnings"][0]["severity"], "warning");
    assert_eq!(rendered["warnings"][0]["summary"], "Insecure Karpor API Connection");
}

#[tokio::test]
async fn test_validate_missing_file_is_error() {
    let server = Server::new_async().await;
    let result = executor_for(&server)
        .execute(Commands::Validate { kubeconfig: PathBuf::from("/nonexistent/kubeconfig") })
        .await;
    assert!(result.is_err());
}
