//! Upstream project identifiers

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A source-hosted project in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpstreamProject {
    pub owner: String,
    pub repo: String,
}

/// Malformed project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid upstream project '{0}': expected owner/repo")]
pub struct UpstreamProjectError(pub String);

impl UpstreamProject {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse an `owner/repo` identifier.
    ///
    /// Exactly two non-empty segments are accepted; surrounding whitespace is
    /// ignored.
    pub fn parse(identifier: &str) -> Result<Self, UpstreamProjectError> {
        let trimmed = identifier.trim();
        let mut parts = trimmed.split('/');

        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(UpstreamProjectError(identifier.to_string())),
        }
    }
}

impl std::str::FromStr for UpstreamProject {
    type Err = UpstreamProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for UpstreamProject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
