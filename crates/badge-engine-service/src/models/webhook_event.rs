//! Webhook 投递审计记录（只追加）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 已记录的 Webhook 事件
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEventRecord {
    pub id: i64,
    /// 上游投递 ID（唯一）
    pub delivery_id: String,
    pub event_type: String,
    #[sqlx(default)]
    pub action: Option<String>,
    #[sqlx(default)]
    pub repository_github_id: Option<i64>,
    #[sqlx(default)]
    pub repository_full_name: Option<String>,
    #[sqlx(default)]
    pub sender_login: Option<String>,
    #[sqlx(default)]
    pub sender_github_id: Option<i64>,
    /// 尽力解析出的本地用户
    #[sqlx(default)]
    pub user_id: Option<i64>,
    /// 原始请求体，用于回放排查
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

/// 新 Webhook 事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebhookEvent {
    pub delivery_id: String,
    pub event_type: String,
    pub action: Option<String>,
    pub repository_github_id: Option<i64>,
    pub repository_full_name: Option<String>,
    pub sender_login: Option<String>,
    pub sender_github_id: Option<i64>,
    pub user_id: Option<i64>,
    pub payload: serde_json::Value,
}
