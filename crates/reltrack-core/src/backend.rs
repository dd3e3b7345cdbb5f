// Tracker backend seam - the controller only ever talks to this trait
use async_trait::async_trait;
use reltrack_api::{
    AddRepository, GatewayClient, GetRepositoryDetails, ListRepositories, MarkReleaseAsSeen,
    NameVariables, NamesVariables, NoVariables, Operation, RefreshRepositories,
    ReleaseIdVariables,
};
use reltrack_cache::CacheManager;
use serde::Serialize;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    models::{Repository, RepositoryDetails},
    Result,
};

/// Whether a read may be answered from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Serve a cached result when there is one
    #[default]
    CacheFirst,
    /// Always go to the backend, then refresh the cache
    NetworkOnly,
}

/// Everything the tracker can ask of its backend
///
/// Implemented over GraphQL by [`GraphQlBackend`]; tests swap in a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerBackend: Send + Sync {
    async fn list_repositories(&self, policy: FetchPolicy) -> Result<Vec<Repository>>;
    /// `None` when the backend does not know the name
    async fn repository_details(&self, name: &str) -> Result<Option<RepositoryDetails>>;
    async fn add_repository(&self, name: &str) -> Result<Repository>;
    async fn mark_release_as_seen(&self, release_id: i64) -> Result<bool>;
    async fn refresh_repositories(&self, names: &[String]) -> Result<bool>;
}

/// Gateway = GraphQL client + session cache
///
/// Cache policy: list reads honor [`FetchPolicy`], detail reads always hit
/// the network, and any successful mutation drops the cached list. There is
/// no per-entity invalidation; callers re-fetch the whole list after a
/// mutation.
pub struct GraphQlBackend {
    client: GatewayClient,
    cache: Arc<CacheManager>,
}

impl GraphQlBackend {
    pub fn new(client: GatewayClient, cache: Arc<CacheManager>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    fn cache_key<V: Serialize>(variables: &V) -> Result<String> {
        Ok(serde_json::to_string(variables)?)
    }

    fn cached<O: Operation, T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(O::NAME, key) {
            Ok(hit) => hit,
            Err(e) => {
                debug!("Cache error: {}", e);
                None
            }
        }
    }

    fn store<O: Operation, T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(O::NAME, key, value) {
            debug!("Failed to cache {}: {}", O::NAME, e);
        }
    }

    fn invalidate_list(&self) {
        if let Err(e) = self.cache.invalidate(ListRepositories::NAME) {
            debug!("Failed to invalidate cached list: {}", e);
        }
    }
}

#[async_trait]
impl TrackerBackend for GraphQlBackend {
    async fn list_repositories(&self, policy: FetchPolicy) -> Result<Vec<Repository>> {
        let variables = NoVariables {};
        let key = Self::cache_key(&variables)?;

        if policy == FetchPolicy::CacheFirst {
            if let Some(repos) = self.cached::<ListRepositories, Vec<Repository>>(&key) {
                let age = self
                    .cache
                    .cached_at(ListRepositories::NAME, &key)
                    .ok()
                    .flatten()
                    .map(|at| (Utc::now() - at).num_seconds());
                debug!("Serving {} repositories from cache (age {:?}s)", repos.len(), age);
                return Ok(repos);
            }
        }

        let data = self.client.execute::<ListRepositories>(&variables).await?;
        let repos: Vec<Repository> = data.repositories.into_iter().map(Repository::from).collect();
        info!("Fetched {} tracked repositories", repos.len());

        self.store::<ListRepositories, _>(&key, &repos);
        Ok(repos)
    }

    async fn repository_details(&self, name: &str) -> Result<Option<RepositoryDetails>> {
        let variables = NameVariables {
            name: name.to_string(),
        };

        let data = self.client.execute::<GetRepositoryDetails>(&variables).await?;
        let details = data.repository_details.map(RepositoryDetails::from);

        if details.is_none() {
            warn!("Backend has no details for {}", name);
        }

        Ok(details)
    }

    async fn add_repository(&self, name: &str) -> Result<Repository> {
        let data = self
            .client
            .execute::<AddRepository>(&NameVariables {
                name: name.to_string(),
            })
            .await?;

        self.invalidate_list();
        let repo = Repository::from(data.add_repository);
        info!("Now tracking {} (id {})", repo.name, repo.id);
        Ok(repo)
    }

    async fn mark_release_as_seen(&self, release_id: i64) -> Result<bool> {
        let data = self
            .client
            .execute::<MarkReleaseAsSeen>(&ReleaseIdVariables { release_id })
            .await?;

        self.invalidate_list();
        Ok(data.mark_release_as_seen)
    }

    async fn refresh_repositories(&self, names: &[String]) -> Result<bool> {
        let data = self
            .client
            .execute::<RefreshRepositories>(&NamesVariables {
                names: names.to_vec(),
            })
            .await?;

        self.invalidate_list();
        Ok(data.refresh_repositories)
    }
}
