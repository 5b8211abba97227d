//! # Karpor Provider
//!
//! Karpor のクラスタ登録を宣言的に管理するプロバイダ
//!
//! - `karpor_cluster_registration` リソース (create/read/update/delete/import)
//! - `karpor_cluster` データソース (読み取り専用)
//!
//! The host runtime that speaks the plugin protocol is not part of this crate.
//! It dispatches to the [`Resource`] and [`DataSource`] traits with JSON state.

pub mod config;
pub mod data_source;
pub mod diagnostics;
pub mod lifecycle;
pub mod provider;
pub mod resource;
pub mod schema;

pub use config::{EnvSource, ProcessEnv, ProviderConfig};
pub use data_source::{ClusterDataSource, ClusterLookup};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use lifecycle::{DataSource, PlanAction, PlannedChange, Resource};
pub use provider::{Configured, KarporProvider, ProviderMetadata};
pub use resource::{ClusterRegistrationModel, ClusterRegistrationResource};
pub use schema::{Attribute, AttributeType, PlanModifier, ProviderSchema, Schema};

pub use karpor_client::{KarporClient, KarporError};
