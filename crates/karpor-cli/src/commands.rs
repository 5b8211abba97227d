//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use karpor_client::KarporClient;
use karpor_provider::{
    ClusterDataSource, ClusterLookup, ClusterRegistrationModel, ClusterRegistrationResource,
    Configured, Diagnostics, EnvSource, KarporProvider, PlanAction, ProcessEnv, ProviderConfig,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "karpor")]
#[command(about = "Manage Kubernetes cluster registrations in Karpor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Karpor API endpoint URL [env: KARPOR_API_ENDPOINT]
    #[arg(long, global = true)]
    pub api_endpoint: Option<String>,

    /// API key for authentication [env: KARPOR_API_KEY]
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Skip TLS certificate verification; `--skip-tls-verify=false` overrides the environment
    /// [env: KARPOR_SKIP_TLS_VERIFY]
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub skip_tls_verify: Option<bool>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Flags as a provider block; anything unset falls back to the environment
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_endpoint: self.api_endpoint.clone(),
            api_key: self.api_key.clone(),
            skip_tls_verify: self.skip_tls_verify,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Print the provider, resource and data source schemas
    Schema,

    /// Check a kubeconfig with the Karpor API
    Validate {
        /// Kubeconfig file
        #[arg(short, long)]
        kubeconfig: PathBuf,
    },

    /// Register a cluster
    Register {
        /// Unique cluster name
        #[arg(short, long)]
        name: String,

        /// Kubeconfig file
        #[arg(short, long)]
        kubeconfig: PathBuf,

        /// Display name (defaults to the cluster name)
        #[arg(long)]
        display_name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Look up a registered cluster
    Get {
        name: String,
    },

    /// Change display name and/or description
    Update {
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        display_name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a cluster registration
    Delete {
        name: String,
    },

    /// Read full registration state for an existing cluster
    Import {
        name: String,
    },
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

/// Command execution result
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    /// Non-fatal diagnostics, e.g. from provider configuration
    pub warnings: Diagnostics,
}

impl CommandResult {
    fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            warnings: Diagnostics::new(),
        }
    }

    fn failed(diags: Diagnostics) -> Self {
        Self {
            success: false,
            message: diags.to_string(),
            data: serde_json::to_value(&diags).ok(),
            warnings: Diagnostics::new(),
        }
    }

    /// Render for stdout in the requested format
    pub fn render(&self, format: &OutputFormat) -> Result<String> {
        let rendered = match format {
            OutputFormat::Text => match &self.data {
                Some(Value::Object(map)) if self.success => {
                    let mut out = String::new();
                    for (key, value) in map {
                        match value {
                            Value::Null => continue,
                            Value::String(s) => out.push_str(&format!("{}: {}\n", key, s)),
                            other => out.push_str(&format!("{}: {}\n", key, other)),
                        }
                    }
                    if out.is_empty() {
                        self.message.clone()
                    } else {
                        out.trim_end().to_string()
                    }
                }
                _ => self.message.clone(),
            },
            OutputFormat::Json => serde_json::to_string(&self.output_value())?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&self.output_value())?,
        };
        Ok(rendered)
    }

    fn output_value(&self) -> Value {
        let mut value = if self.success {
            self.data.clone().unwrap_or_else(|| serde_json::json!({ "message": self.message }))
        } else {
            serde_json::json!({ "message": self.message, "diagnostics": self.data })
        };
        if !self.warnings.is_empty() {
            if let Value::Object(map) = &mut value {
                let warnings = serde_json::to_value(&self.warnings).unwrap_or_default();
                map.insert("warnings".to_string(), warnings);
            }
        }
        value
    }
}

/// State as shown to the user; kubeconfig content is never echoed
fn registration_output(model: &ClusterRegistrationModel) -> Result<Value> {
    let mut value = serde_json::to_value(model)?;
    if let Value::Object(map) = &mut value {
        map.remove("credentials");
    }
    Ok(value)
}

fn read_kubeconfig(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read kubeconfig {}", path.display()))
}

/// Execute CLI commands
pub struct CommandExecutor {
    provider: KarporProvider,
    config: ProviderConfig,
    env: Box<dyn EnvSource + Send + Sync>,
}

impl CommandExecutor {
    /// Executor whose unset settings fall back to the process environment
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_env(config, ProcessEnv)
    }

    pub fn with_env(config: ProviderConfig, env: impl EnvSource + Send + Sync + 'static) -> Self {
        Self {
            provider: KarporProvider::default(),
            config,
            env: Box::new(env),
        }
    }

    fn configure(&self) -> Result<Configured, Diagnostics> {
        self.provider.configure_with_env(&self.config, self.env.as_ref())
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: Commands) -> Result<CommandResult> {
        if matches!(command, Commands::Schema) {
            return self.execute_schema();
        }

        let Configured { client, warnings } = match self.configure() {
            Ok(configured) => configured,
            Err(diags) => return Ok(CommandResult::failed(diags)),
        };

        let mut result = match command {
            Commands::Schema => self.execute_schema(),
            Commands::Validate { kubeconfig } => self.execute_validate(client, &kubeconfig).await,
            Commands::Register { name, kubeconfig, display_name, description } => {
                self.execute_register(client, name, &kubeconfig, display_name, description).await
            }
            Commands::Get { name } => self.execute_get(client, name).await,
            Commands::Update { name, display_name, description } => {
                self.execute_update(client, name, display_name, description).await
            }
            Commands::Delete { name } => self.execute_delete(client, name).await,
            Commands::Import { name } => self.execute_import(client, name).await,
        }?;
        result.warnings.extend(warnings);
        Ok(result)
    }

    fn execute_schema(&self) -> Result<CommandResult> {
        let schema = self.provider.full_schema();
        let metadata = self.provider.metadata();

        Ok(CommandResult::ok(
            format!("{} provider {}", metadata.type_name, metadata.version),
            serde_json::json!({ "metadata": metadata, "schema": schema }),
        ))
    }

    async fn execute_validate(&self, client: Arc<KarporClient>, kubeconfig: &Path) -> Result<CommandResult> {
        let content = read_kubeconfig(kubeconfig)?;

        match client.validate_cluster_config(&content).await {
            Ok(()) => Ok(CommandResult::ok(
                "Valid kubeconfig file",
                serde_json::json!({ "valid": true }),
            )),
            Err(e) => Ok(CommandResult::failed(Diagnostics::error("Invalid kubeconfig file", e.to_string()))),
        }
    }

    async fn execute_register(
        &self,
        client: Arc<KarporClient>,
        name: String,
        kubeconfig: &Path,
        display_name: Option<String>,
        description: Option<String>,
    ) -> Result<CommandResult> {
        let credentials = read_kubeconfig(kubeconfig)?;
        let resource = ClusterRegistrationResource::with_client(client);

        let proposed = ClusterRegistrationModel {
            cluster_name: name,
            display_name,
            description,
            credentials: Some(credentials),
            ..ClusterRegistrationModel::default()
        };
        let plan = resource.plan_change(None, proposed);

        match resource.create_registration(plan.planned).await {
            Ok(state) => Ok(CommandResult::ok(
                format!("Registered cluster {}", state.cluster_name),
                registration_output(&state)?,
            )),
            Err(diags) => Ok(CommandResult::failed(diags)),
        }
    }

    async fn execute_get(&self, client: Arc<KarporClient>, name: String) -> Result<CommandResult> {
        let data_source = ClusterDataSource::with_client(client);

        match data_source.read_cluster(ClusterLookup::new(&name)).await {
            Ok(lookup) => Ok(CommandResult::ok(
                format!("Cluster {}", lookup.cluster_name),
                serde_json::to_value(&lookup)?,
            )),
            Err(diags) => Ok(CommandResult::failed(diags)),
        }
    }

    async fn execute_update(
        &self,
        client: Arc<KarporClient>,
        name: String,
        display_name: Option<String>,
        description: Option<String>,
    ) -> Result<CommandResult> {
        let resource = ClusterRegistrationResource::with_client(client);

        let prior = match resource.import_registration(&name).await {
            Ok(state) => state,
            Err(diags) => return Ok(CommandResult::failed(diags)),
        };

        let mut proposed = prior.clone();
        if display_name.is_some() {
            proposed.display_name = display_name;
        }
        if description.is_some() {
            proposed.description = description;
        }

        let plan = resource.plan_change(Some(&prior), proposed);
        debug!(action = ?plan.action, cluster = %name, "Planned update");
        if plan.action == PlanAction::NoOp {
            return Ok(CommandResult::ok(
                format!("Cluster {} is up to date", name),
                registration_output(&prior)?,
            ));
        }

        match resource.update_registration(&prior, plan.planned).await {
            Ok(state) => Ok(CommandResult::ok(
                format!("Updated cluster {}", state.cluster_name),
                registration_output(&state)?,
            )),
            Err(diags) => Ok(CommandResult::failed(diags)),
        }
    }

    async fn execute_delete(&self, client: Arc<KarporClient>, name: String) -> Result<CommandResult> {
        let resource = ClusterRegistrationResource::with_client(client);

        match resource.delete_registration(&ClusterRegistrationModel::new(&name)).await {
            Ok(()) => Ok(CommandResult::ok(
                format!("Deleted cluster {}", name),
                serde_json::json!({ "cluster_name": name, "deleted": true }),
            )),
            Err(diags) => Ok(CommandResult::failed(diags)),
        }
    }

    async fn execute_import(&self, client: Arc<KarporClient>, name: String) -> Result<CommandResult> {
        let resource = ClusterRegistrationResource::with_client(client);

        match resource.import_registration(&name).await {
            Ok(state) => Ok(CommandResult::ok(
                format!("Imported cluster {}", state.cluster_name),
                registration_output(&state)?,
            )),
            Err(diags) => Ok(CommandResult::failed(diags)),
        }
    }
}
