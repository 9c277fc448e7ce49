//! versions-exporter Types - Core types for workload version tracking
//!
//! The exporter compares what a cluster is running against what upstream
//! projects have published. These types are shared by the inventory scanner,
//! the version resolver and the metrics publisher.
//!
//! ## Key Concepts
//!
//! - **Workload**: A pod, deployment or daemonset and its containers
//! - **UpstreamProject**: An `owner/repo` project whose releases are tracked
//! - **ScanTarget**: One annotated container waiting for version resolution
//! - **VersionRecord**: Current vs latest version for one application
//! - **VersionRecordSet**: Everything observed during one reconciliation cycle

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod record;
pub mod upstream;
pub mod workload;

pub use record::{ScanTarget, VersionRecord, VersionRecordSet};
pub use upstream::{UpstreamProject, UpstreamProjectError};
pub use workload::{image_tag, ContainerSpec, ParseWorkloadKindError, Workload, WorkloadKind};
