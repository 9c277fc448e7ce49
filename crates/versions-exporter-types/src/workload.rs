//! Workload types
//!
//! A `Workload` is the inventory view of a pod, deployment or daemonset:
//! just the metadata and container images the scanner needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Label used as the application name when present.
pub const APP_LABEL: &str = "app";

/// Kind of workload listed from the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Pod,
    Deployment,
    DaemonSet,
}

impl WorkloadKind {
    /// Every supported kind, in scan order.
    pub const ALL: [WorkloadKind; 3] = [
        WorkloadKind::Pod,
        WorkloadKind::Deployment,
        WorkloadKind::DaemonSet,
    ];

    /// Plural resource name, as used in metric labels and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Pod => "pods",
            WorkloadKind::Deployment => "deployments",
            WorkloadKind::DaemonSet => "daemonsets",
        }
    }
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workload kind '{0}' (expected pods, deployments or daemonsets)")]
pub struct ParseWorkloadKindError(pub String);

impl std::str::FromStr for WorkloadKind {
    type Err = ParseWorkloadKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pod" | "pods" => Ok(WorkloadKind::Pod),
            "deployment" | "deployments" | "deploy" => Ok(WorkloadKind::Deployment),
            "daemonset" | "daemonsets" | "ds" => Ok(WorkloadKind::DaemonSet),
            other => Err(ParseWorkloadKindError(other.to_string())),
        }
    }
}

/// A container and the image it runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,

    /// Image reference, normally `repository:tag`
    pub image: String,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }

    /// Tag of this container's image, if the reference carries one.
    pub fn tag(&self) -> Option<&str> {
        image_tag(&self.image)
    }
}

/// A workload as seen by the inventory scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub kind: WorkloadKind,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

impl Workload {
    pub fn new(kind: WorkloadKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            containers: Vec::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_container(mut self, name: impl Into<String>, image: impl Into<String>) -> Self {
        self.containers.push(ContainerSpec::new(name, image));
        self
    }

    /// `namespace/name`, for log fields.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn first_container(&self) -> Option<&ContainerSpec> {
        self.containers.first()
    }

    pub fn container(&self, name: &str) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// Application name: the `app` label, else the workload's own name.
    pub fn application_name(&self) -> Option<&str> {
        self.labels
            .get(APP_LABEL)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .or_else(|| Some(self.name.as_str()).filter(|n| !n.is_empty()))
    }
}

/// Extract the tag from an image reference.
///
/// Any `@digest` suffix is ignored. The tag is what follows the last `:`;
/// a remainder containing `/` is a registry port, not a tag.
pub fn image_tag(image: &str) -> Option<&str> {
    let reference = image.split('@').next().unwrap_or(image);
    let (_, tag) = reference.rsplit_once(':')?;

    if tag.is_empty() || tag.contains('/') {
        return None;
    }
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_tag() {
        assert_eq!(image_tag("myrepo/app:1.2.3"), Some("1.2.3"));
        assert_eq!(image_tag("img:4.5.6"), Some("4.5.6"));
        assert_eq!(image_tag("registry.local:5000/team/app:v2"), Some("v2"));
        assert_eq!(image_tag("app:1.0@sha256:abcdef"), Some("1.0"));
    }

    #[test]
    fn test_image_tag_missing() {
        assert_eq!(image_tag("nginx"), None);
        assert_eq!(image_tag("registry.local:5000/team/app"), None);
        assert_eq!(image_tag("app:"), None);
        assert_eq!(image_tag("app@sha256:abcdef"), None);
    }

    #[test]
    fn test_application_name_precedence() {
        let w = Workload::new(WorkloadKind::Deployment, "default", "web-7c9f")
            .with_label("app", "web");
        assert_eq!(w.application_name(), Some("web"));

        let w = Workload::new(WorkloadKind::Deployment, "default", "web-7c9f");
        assert_eq!(w.application_name(), Some("web-7c9f"));

        let w = Workload::new(WorkloadKind::Pod, "default", "").with_label("app", "");
        assert_eq!(w.application_name(), None);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("pods".parse::<WorkloadKind>().unwrap(), WorkloadKind::Pod);
        assert_eq!(" Deployment ".parse::<WorkloadKind>().unwrap(), WorkloadKind::Deployment);
        assert_eq!("ds".parse::<WorkloadKind>().unwrap(), WorkloadKind::DaemonSet);
        assert!("statefulsets".parse::<WorkloadKind>().is_err());
    }

    #[test]
    fn test_container_lookup() {
        let w = Workload::new(WorkloadKind::Pod, "ns", "p")
            .with_container("main", "app:1")
            .with_container("worker", "img:4.5.6");
        assert_eq!(w.first_container().map(|c| c.name.as_str()), Some("main"));
        assert_eq!(w.container("worker").and_then(|c| c.tag()), Some("4.5.6"));
        assert!(w.container("missing").is_none());
    }
}
