//! 请求与响应 DTO

use badge_engine::models::RepositorySnapshot;
use badge_engine::statistics::StatisticsSource;
use serde::{Deserialize, Serialize};

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }
}

/// Webhook 应答
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    /// processed / duplicate
    pub status: String,
    pub delivery_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    pub dispatched: bool,
}

/// 仓库导入请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRepositoriesRequest {
    pub user_id: i64,
    pub repositories: Vec<RepositorySnapshot>,
}

/// 进度查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    pub source: Option<StatisticsSource>,
}

/// 确认授予记录请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub user_id: i64,
}
