//! Webhook 事件仓储
//!
//! 只追加；delivery_id 唯一约束拦截重复投递

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::WebhookEventRepositoryTrait;
use crate::error::Result;
use crate::models::{NewWebhookEvent, WebhookEventRecord};

/// Webhook 事件仓储
pub struct WebhookEventRepository {
    pool: PgPool,
}

impl WebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 记录一次投递，重复的 delivery_id 返回 None
    pub async fn record(&self, event: &NewWebhookEvent) -> Result<Option<WebhookEventRecord>> {
        let record = sqlx::query_as::<_, WebhookEventRecord>(
            r#"
            INSERT INTO webhook_events (
                delivery_id, event_type, action, repository_github_id, repository_full_name,
                sender_login, sender_github_id, user_id, payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (delivery_id) DO NOTHING
            RETURNING id, delivery_id, event_type, action, repository_github_id,
                      repository_full_name, sender_login, sender_github_id, user_id,
                      payload, received_at
            "#,
        )
        .bind(&event.delivery_id)
        .bind(&event.event_type)
        .bind(&event.action)
        .bind(event.repository_github_id)
        .bind(&event.repository_full_name)
        .bind(&event.sender_login)
        .bind(event.sender_github_id)
        .bind(event.user_id)
        .bind(&event.payload)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

#[async_trait]
impl WebhookEventRepositoryTrait for WebhookEventRepository {
    async fn record(&self, event: &NewWebhookEvent) -> Result<Option<WebhookEventRecord>> {
        self.record(event).await
    }
}
