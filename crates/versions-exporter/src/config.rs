//! Configuration for versions-exporter
//!
//! Layered as defaults, then an optional file, then `VERSIONS_EXPORTER_*`
//! environment variables. Keys are flat so each variable maps onto one field.

use crate::error::{ExporterError, ExporterResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use versions_exporter_types::WorkloadKind;

/// Prefix of every environment variable read by the exporter
pub const ENV_PREFIX: &str = "VERSIONS_EXPORTER";

/// Main exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Period between two reconciliation cycles (humantime syntax, e.g. `1h`)
    #[serde(default = "default_refresh_interval", with = "duration_str")]
    pub refresh_interval: Duration,

    /// Annotation naming a workload's upstream project
    #[serde(default = "default_annotation_name")]
    pub annotation_name: String,

    /// Prefix of per-container annotations (`<prefix><container-name>`)
    #[serde(default = "default_container_annotation_prefix")]
    pub container_annotation_prefix: String,

    /// Metrics port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the metrics server binds to
    #[serde(default = "default_listen_host")]
    pub listen_host: IpAddr,

    /// Log level (`panic|fatal|error|warn|info|debug|trace`)
    #[serde(default = "default_log_level")]
    pub loglevel: String,

    /// JSON log output
    #[serde(default)]
    pub log_json: bool,

    /// Use a kubeconfig instead of the in-cluster service account
    #[serde(default)]
    pub out_of_cluster: bool,

    /// Explicit kubeconfig path (out-of-cluster only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,

    /// Comma-separated workload kinds to scan
    #[serde(default = "default_workload_kinds")]
    pub workload_kinds: String,

    /// Base URL of the GitHub REST API
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Token for authenticated GitHub requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Timeout of one upstream release request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout of one workload list call, in seconds
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,

    /// Upstream lookups allowed in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_resolutions: usize,

    /// Resolve each upstream project once per cycle
    #[serde(default)]
    pub cache_per_cycle: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            annotation_name: default_annotation_name(),
            container_annotation_prefix: default_container_annotation_prefix(),
            port: default_port(),
            listen_host: default_listen_host(),
            loglevel: default_log_level(),
            log_json: false,
            out_of_cluster: false,
            kubeconfig: None,
            workload_kinds: default_workload_kinds(),
            github_api_url: default_github_api_url(),
            github_token: None,
            request_timeout_secs: default_request_timeout(),
            list_timeout_secs: default_list_timeout(),
            max_concurrent_resolutions: default_max_concurrent(),
            cache_per_cycle: false,
        }
    }
}

// Default value helpers
fn default_refresh_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_annotation_name() -> String {
    "versions-exporter/githubRepo".to_string()
}

fn default_container_annotation_prefix() -> String {
    "versions-exporter/".to_string()
}

fn default_port() -> u16 {
    8083
}

fn default_listen_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_workload_kinds() -> String {
    "pods".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_list_timeout() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    1
}

impl ExporterConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&str>) -> ExporterResult<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&ExporterConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with VERSIONS_EXPORTER_ prefix
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: ExporterConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the exporter cannot run with
    pub fn validate(&self) -> ExporterResult<()> {
        if self.refresh_interval.is_zero() {
            return Err(ExporterError::Config(
                "refresh_interval must be greater than zero".to_string(),
            ));
        }
        if self.annotation_name.trim().is_empty() {
            return Err(ExporterError::Config(
                "annotation_name must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ExporterError::Config("port must not be 0".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ExporterError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.list_timeout_secs == 0 {
            return Err(ExporterError::Config(
                "list_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_resolutions == 0 {
            return Err(ExporterError::Config(
                "max_concurrent_resolutions must be at least 1".to_string(),
            ));
        }
        self.kinds()?;
        Ok(())
    }

    /// Workload kinds to scan, deduplicated, in scan order
    pub fn kinds(&self) -> ExporterResult<Vec<WorkloadKind>> {
        let mut kinds = Vec::new();
        for raw in self.workload_kinds.split(',').filter(|s| !s.trim().is_empty()) {
            let kind: WorkloadKind = raw
                .parse()
                .map_err(|e: versions_exporter_types::ParseWorkloadKindError| {
                    ExporterError::Config(e.to_string())
                })?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Err(ExporterError::Config(
                "workload_kinds must name at least one kind".to_string(),
            ));
        }
        kinds.sort();
        Ok(kinds)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn annotation_name(&self) -> &str {
        &self.annotation_name
    }

    pub fn listen_port(&self) -> u16 {
        self.port
    }

    pub fn out_of_cluster(&self) -> bool {
        self.out_of_cluster
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }
}

/// Serde adapter for humantime durations (`1h`, `30m`, `1h 30m`)
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim())
            .map_err(|e| serde::de::Error::custom(format!("invalid duration '{}': {}", raw, e)))
    }
}
