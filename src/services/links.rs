// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::RepositoryError;
use crate::models::link::{Link, LinkUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Link persistence used by the HTTP handlers and by probe write-back.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn insert(&self, link: &Link) -> RepositoryResult<()>;

    async fn get(&self, id: Uuid) -> RepositoryResult<Option<Link>>;

    /// All links ordered by position.
    async fn list(&self) -> RepositoryResult<Vec<Link>>;

    /// Position for a newly appended link: one past the current maximum, or 0.
    async fn next_position(&self) -> RepositoryResult<i32>;

    /// Persist the user-editable fields of `link` (title, url, description, icon).
    async fn save_details(&self, link: &Link) -> RepositoryResult<Link>;

    /// Write probe results. Fields unset in `update` are left as they are.
    async fn update_by_id(&self, id: Uuid, update: &LinkUpdate) -> RepositoryResult<()>;

    /// Increment the click counter and return the updated link.
    async fn record_click(&self, id: Uuid) -> RepositoryResult<Option<Link>>;

    /// Delete a link and close the gap it leaves in the ordering.
    /// Returns the removed link, if it existed.
    async fn delete(&self, id: Uuid) -> RepositoryResult<Option<Link>>;
}

/// Process-local repository, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryLinkRepository {
    links: RwLock<HashMap<Uuid, Link>>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn insert(&self, link: &Link) -> RepositoryResult<()> {
        self.links.write().await.insert(link.id, link.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Option<Link>> {
        Ok(self.links.read().await.get(&id).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Link>> {
        let mut links: Vec<Link> = self.links.read().await.values().cloned().collect();
        links.sort_by_key(|l| (l.order, l.created_at));
        Ok(links)
    }

    async fn next_position(&self) -> RepositoryResult<i32> {
        Ok(self
            .links
            .read()
            .await
            .values()
            .map(|l| l.order + 1)
            .max()
            .unwrap_or(0))
    }

    async fn save_details(&self, link: &Link) -> RepositoryResult<Link> {
        let mut links = self.links.write().await;
        let stored = links
            .get_mut(&link.id)
            .ok_or(RepositoryError::NotFound(link.id))?;
        stored.title = link.title.clone();
        stored.url = link.url.clone();
        stored.description = link.description.clone();
        stored.icon = link.icon.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn update_by_id(&self, id: Uuid, update: &LinkUpdate) -> RepositoryResult<()> {
        let mut links = self.links.write().await;
        let stored = links.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        stored.apply(update);
        Ok(())
    }

    async fn record_click(&self, id: Uuid) -> RepositoryResult<Option<Link>> {
        let mut links = self.links.write().await;
        Ok(links.get_mut(&id).map(|stored| {
            stored.clicks += 1;
            stored.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<Option<Link>> {
        let mut links = self.links.write().await;
        let Some(removed) = links.remove(&id) else {
            return Ok(None);
        };

        let mut remaining: Vec<&mut Link> = links.values_mut().collect();
        remaining.sort_by_key(|l| (l.order, l.created_at));
        for (position, link) in remaining.into_iter().enumerate() {
            link.order = i32::try_from(position).unwrap_or(i32::MAX);
        }
        Ok(Some(removed))
    }
}
