// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::RepositoryError;
use crate::models::link::{Link, LinkUpdate};
use crate::models::probe::ReachabilityStatus;
use crate::services::links::{LinkRepository, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

const LINK_COLUMNS: &str = "id, title, url, description, icon, position, clicks, status, \
     last_checked_at, response_time_ms, screenshot_url, lighthouse_performance, \
     lighthouse_accessibility, lighthouse_best_practices, lighthouse_seo, \
     lighthouse_checked_at, created_at, updated_at";

/// Postgres-backed link storage
#[derive(Clone)]
pub struct PgLinkRepository {
    pool: PgPool,
}

impl PgLinkRepository {
    /// Connect and apply pending migrations
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("link database ready");

        Ok(Self { pool })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: Uuid,
    title: String,
    url: String,
    description: Option<String>,
    icon: Option<String>,
    position: i32,
    clicks: i64,
    status: Option<String>,
    last_checked_at: Option<DateTime<Utc>>,
    response_time_ms: Option<i64>,
    screenshot_url: Option<String>,
    lighthouse_performance: Option<i16>,
    lighthouse_accessibility: Option<i16>,
    lighthouse_best_practices: Option<i16>,
    lighthouse_seo: Option<i16>,
    lighthouse_checked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for Link {
    type Error = RepositoryError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .as_deref()
            .map(|s| {
                ReachabilityStatus::parse(s)
                    .ok_or_else(|| RepositoryError::CorruptRow(format!("unknown status {s:?}")))
            })
            .transpose()?;

        Ok(Link {
            id: row.id,
            title: row.title,
            url: row.url,
            description: row.description,
            icon: row.icon,
            order: row.position,
            clicks: row.clicks,
            status,
            last_checked_at: row.last_checked_at,
            response_time_ms: row.response_time_ms.and_then(|v| u64::try_from(v).ok()),
            screenshot_url: row.screenshot_url,
            lighthouse_performance: score(row.lighthouse_performance)?,
            lighthouse_accessibility: score(row.lighthouse_accessibility)?,
            lighthouse_best_practices: score(row.lighthouse_best_practices)?,
            lighthouse_seo: score(row.lighthouse_seo)?,
            lighthouse_checked_at: row.lighthouse_checked_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn score(value: Option<i16>) -> RepositoryResult<Option<u8>> {
    value
        .map(|v| {
            u8::try_from(v).map_err(|_| RepositoryError::CorruptRow(format!("score {v} out of range")))
        })
        .transpose()
}

fn into_links(rows: Vec<LinkRow>) -> RepositoryResult<Vec<Link>> {
    rows.into_iter().map(Link::try_from).collect()
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, link: &Link) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO links (id, title, url, description, icon, position, clicks, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(link.id)
        .bind(&link.title)
        .bind(&link.url)
        .bind(&link.description)
        .bind(&link.icon)
        .bind(link.order)
        .bind(link.clicks)
        .bind(link.created_at)
        .bind(link.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Option<Link>> {
        let row: Option<LinkRow> =
            sqlx::query_as(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Link::try_from).transpose()
    }

    async fn list(&self) -> RepositoryResult<Vec<Link>> {
        let rows: Vec<LinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM links ORDER BY position, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        into_links(rows)
    }

    async fn next_position(&self) -> RepositoryResult<i32> {
        let (next,): (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(position) + 1, 0) FROM links")
                .fetch_one(&self.pool)
                .await?;
        Ok(next)
    }

    async fn save_details(&self, link: &Link) -> RepositoryResult<Link> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            "UPDATE links
             SET title = $2, url = $3, description = $4, icon = $5, updated_at = now()
             WHERE id = $1
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(link.id)
        .bind(&link.title)
        .bind(&link.url)
        .bind(&link.description)
        .bind(&link.icon)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound(link.id))?.try_into()
    }

    async fn update_by_id(&self, id: Uuid, update: &LinkUpdate) -> RepositoryResult<()> {
        let quality = update.quality.as_ref();
        let result = sqlx::query(
            "UPDATE links SET
                status = COALESCE($2, status),
                last_checked_at = COALESCE($3, last_checked_at),
                response_time_ms = CASE WHEN $2 IS NOT NULL THEN $4 ELSE response_time_ms END,
                screenshot_url = COALESCE($5, screenshot_url),
                lighthouse_performance = COALESCE($6, lighthouse_performance),
                lighthouse_accessibility = COALESCE($7, lighthouse_accessibility),
                lighthouse_best_practices = COALESCE($8, lighthouse_best_practices),
                lighthouse_seo = COALESCE($9, lighthouse_seo),
                lighthouse_checked_at = COALESCE($10, lighthouse_checked_at),
                updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.last_checked_at)
        .bind(
            update
                .response_time_ms
                .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX)),
        )
        .bind(&update.screenshot_url)
        .bind(quality.map(|q| i16::from(q.performance)))
        .bind(quality.map(|q| i16::from(q.accessibility)))
        .bind(quality.map(|q| i16::from(q.best_practices)))
        .bind(quality.map(|q| i16::from(q.seo)))
        .bind(quality.map(|q| q.audited_at))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn record_click(&self, id: Uuid) -> RepositoryResult<Option<Link>> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            "UPDATE links SET clicks = clicks + 1 WHERE id = $1 RETURNING {LINK_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Link::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<Option<Link>> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<LinkRow> = sqlx::query_as(&format!(
            "DELETE FROM links WHERE id = $1 RETURNING {LINK_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if removed.is_some() {
            sqlx::query(
                "UPDATE links SET position = ranked.rn - 1
                 FROM (SELECT id, ROW_NUMBER() OVER (ORDER BY position, created_at) AS rn FROM links) ranked
                 WHERE links.id = ranked.id AND links.position <> ranked.rn - 1",
            )
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        removed.map(Link::try_from).transpose()
    }
}
