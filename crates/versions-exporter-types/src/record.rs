//! Version records produced by a reconciliation cycle
//!
//! A `VersionRecordSet` is rebuilt from scratch on every cycle, published once
//! and then dropped. Nothing carries over between cycles.

use serde::{Deserialize, Serialize};

/// An annotated container found by the inventory scanner, before its
/// upstream project has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    /// Name the record will be published under (never empty)
    pub application_name: String,

    /// Tag of the running image, empty when it could not be determined
    pub current_version: String,

    /// Upstream project identifier as written in the annotation (`owner/repo`)
    pub upstream: String,
}

impl ScanTarget {
    pub fn new(
        application_name: impl Into<String>,
        current_version: impl Into<String>,
        upstream: impl Into<String>,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            current_version: current_version.into(),
            upstream: upstream.into(),
        }
    }

    /// Complete the target with the resolved latest version.
    pub fn into_record(self, latest_version: impl Into<String>) -> VersionRecord {
        VersionRecord {
            application_name: self.application_name,
            current_version: self.current_version,
            latest_version: latest_version.into(),
        }
    }
}

/// Current vs latest version of one tracked application.
///
/// An empty `latest_version` means resolution failed; records are only ever
/// created for workloads that declare an upstream project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRecord {
    pub application_name: String,
    pub current_version: String,
    pub latest_version: String,
}

impl VersionRecord {
    pub fn new(
        application_name: impl Into<String>,
        current_version: impl Into<String>,
        latest_version: impl Into<String>,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            current_version: current_version.into(),
            latest_version: latest_version.into(),
        }
    }

    /// Whether the running version matches the latest release.
    ///
    /// Plain string equality; an unresolved side is never up to date.
    pub fn is_up_to_date(&self) -> bool {
        !self.latest_version.is_empty() && self.current_version == self.latest_version
    }

    /// Label values in publication order.
    pub fn label_values(&self) -> [&str; 3] {
        [
            self.application_name.as_str(),
            self.current_version.as_str(),
            self.latest_version.as_str(),
        ]
    }
}

/// Ordered records of one reconciliation cycle.
///
/// Keeps scan order and duplicates: two workloads with the same application
/// name produce two records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRecordSet(Vec<VersionRecord>);

impl VersionRecordSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, record: VersionRecord) {
        self.0.push(record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VersionRecord> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[VersionRecord] {
        &self.0
    }

    /// Number of records whose latest version could not be resolved.
    pub fn unresolved(&self) -> usize {
        self.0.iter().filter(|r| r.latest_version.is_empty()).count()
    }
}

impl From<Vec<VersionRecord>> for VersionRecordSet {
    fn from(records: Vec<VersionRecord>) -> Self {
        Self(records)
    }
}

impl FromIterator<VersionRecord> for VersionRecordSet {
    fn from_iter<I: IntoIterator<Item = VersionRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for VersionRecordSet {
    type Item = VersionRecord;
    type IntoIter = std::vec::IntoIter<VersionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a VersionRecordSet {
    type Item = &'a VersionRecord;
    type IntoIter = std::slice::Iter<'a, VersionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
