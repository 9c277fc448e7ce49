//! versions-exporter library
//!
//! Watches annotated Kubernetes workloads, looks up the latest release of the
//! upstream project each one tracks, and publishes running vs latest versions
//! as the `application_info` Prometheus gauge.
//!
//! This module provides the core components of the exporter:
//! - Workload inventory and annotation scanning
//! - Upstream release resolution
//! - Scheduler, reconciliation and publication
//! - HTTP server lifecycle

pub mod api;
pub mod config;
pub mod error;
pub mod inventory;
pub mod scheduler;
pub mod server;
pub mod upstream;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::ExporterConfig;
pub use error::{ExporterError, ExporterResult, InventoryError, ResolveError};
pub use inventory::{InventoryClient, KubeInventory};
pub use scheduler::{MetricsPublisher, Reconciler, Scheduler};
pub use server::Server;
pub use upstream::{GitHubReleaseClient, ReleaseClient, VersionResolver};
