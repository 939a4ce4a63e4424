//! 徽章授予记录
//!
//! (user_id, badge_id) 唯一；创建后只允许修改 acknowledged 标记

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AwardedBy;

/// 授予记录（user_badges 表）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub id: i64,
    pub user_id: i64,
    pub badge_id: i64,
    /// 从徽章冗余，便于按仓库查询
    pub repository_id: i64,
    pub awarded_at: DateTime<Utc>,
    /// 授予时满足阈值的指标值
    pub actual_value: i64,
    pub awarded_by: AwardedBy,
    /// 触发事件 ID 等附加信息
    pub metadata: serde_json::Value,
    pub acknowledged: bool,
}

/// 新建授予参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAward {
    pub user_id: i64,
    pub badge_id: i64,
    pub repository_id: i64,
    pub actual_value: i64,
    pub awarded_by: AwardedBy,
    pub metadata: serde_json::Value,
}
