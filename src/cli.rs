//! Command-line interface parsing for the KubeGraf console
//!
//! This module handles parsing of CLI arguments using clap. Flags override the
//! environment configuration loaded by [`crate::config`].

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::Config;
use crate::resources::ResourceKind;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified view name is not a known resource kind
    #[error("Invalid view: '{0}'. Valid views: sts, sa, roles, rb, cr, crb, pv, pvc, sc, certs, crds")]
    InvalidView(String),
}

/// KubeGraf console - browse and manage cluster resources from the terminal
#[derive(Parser, Debug)]
#[command(name = "kubegraf-tui")]
#[command(about = "Terminal console for KubeGraf-managed Kubernetes clusters")]
#[command(version)]
pub struct Cli {
    /// KubeGraf backend URL (overrides KUBEGRAF_URL)
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Cluster name used to scope cached data (overrides KUBEGRAF_CLUSTER)
    #[arg(long, value_name = "NAME")]
    pub cluster: Option<String>,

    /// Namespace to show; repeat for several. Omit for all namespaces
    #[arg(short = 'n', long = "namespace", value_name = "NAMESPACE")]
    pub namespaces: Vec<String>,

    /// Cache time-to-live in milliseconds (overrides KUBEGRAF_CACHE_TTL_MS)
    #[arg(long, value_name = "MILLIS")]
    pub ttl: Option<u64>,

    /// Block on refetch instead of serving stale data while refreshing
    #[arg(long)]
    pub no_background_refresh: bool,

    /// Resource view to open first
    ///
    /// Examples:
    ///   kubegraf-tui --view sts     # StatefulSets
    ///   kubegraf-tui --view pvc     # PersistentVolumeClaims
    #[arg(long, value_name = "VIEW")]
    pub view: Option<String>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Resource kind to show first (if specified)
    pub initial_kind: Option<ResourceKind>,
}

/// Parses a view argument into a ResourceKind.
pub fn parse_view_arg(s: &str) -> Result<ResourceKind, CliError> {
    ResourceKind::from_str(s).ok_or_else(|| CliError::InvalidView(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let initial_kind = cli.view.as_deref().map(parse_view_arg).transpose()?;
        Ok(StartupConfig { initial_kind })
    }
}

impl Cli {
    /// Applies flag overrides on top of the environment configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref server) = self.server {
            config.base_url = server.clone();
        }
        if let Some(ref cluster) = self.cluster {
            config.cluster = cluster.clone();
        }
        if !self.namespaces.is_empty() {
            config.namespaces = self
                .namespaces
                .iter()
                .flat_map(|ns| crate::config::split_list(ns))
                .collect();
        }
        if let Some(ttl) = self.ttl {
            config.cache_ttl = Duration::from_millis(ttl);
        }
        if self.no_background_refresh {
            config.background_refresh = false;
        }
    }
}
