use reltrack_api::{ReleaseNode, RepositoryDetailsNode, RepositoryNode};
use serde::{Deserialize, Serialize};

/// A tracked repository as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Opaque backend identifier, stable across refreshes
    pub id: String,
    /// `owner/repo`
    pub name: String,
    pub latest_release: Option<Release>,
}

/// A published version of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    /// Raw date string from the backend; see [`crate::date`] for display
    pub published_at: Option<String>,
    /// Once true it stays true; nothing in this client unmarks a release
    pub seen: bool,
    /// Only filled in by the details query
    pub release_notes: Option<String>,
}

/// Detail view of a single repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDetails {
    pub name: String,
    pub stars: u64,
    pub forks: u64,
    pub latest_release: Option<Release>,
}

impl Repository {
    /// The mark-as-seen control is off only when there is a release and it
    /// has already been seen. No release means the control stays enabled.
    pub fn mark_seen_disabled(&self) -> bool {
        self.latest_release.as_ref().is_some_and(|r| r.seen)
    }

    /// `v1.2.3` or "No releases"
    pub fn release_badge(&self) -> String {
        match &self.latest_release {
            Some(release) => format!("v{}", release.version),
            None => "No releases".to_string(),
        }
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}", self.name)
    }
}

impl From<ReleaseNode> for Release {
    fn from(node: ReleaseNode) -> Self {
        Self {
            version: node.version,
            published_at: node.published_at,
            seen: node.seen.unwrap_or(false),
            release_notes: node.release_notes,
        }
    }
}

impl From<RepositoryNode> for Repository {
    fn from(node: RepositoryNode) -> Self {
        Self {
            id: node.id,
            name: node.name,
            latest_release: node.latest_release.map(Release::from),
        }
    }
}

impl From<RepositoryDetailsNode> for RepositoryDetails {
    fn from(node: RepositoryDetailsNode) -> Self {
        Self {
            name: node.name,
            stars: node.stars,
            forks: node.forks,
            latest_release: node.latest_release.map(Release::from),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn release(version: &str, seen: bool) -> Release {
        Release {
            version: version.to_string(),
            published_at: Some("2024-03-05T00:00:00Z".to_string()),
            seen,
            release_notes: None,
        }
    }

    pub fn repo(id: &str, name: &str, release: Option<Release>) -> Repository {
        Repository {
            id: id.to_string(),
            name: name.to_string(),
            latest_release: release,
        }
    }

    pub fn details(name: &str) -> RepositoryDetails {
        RepositoryDetails {
            name: name.to_string(),
            stars: 1200,
            forks: 80,
            latest_release: Some(Release {
                release_notes: Some("## Fixes\n- everything".to_string()),
                ..release("1.0.0", false)
            }),
        }
    }
}
