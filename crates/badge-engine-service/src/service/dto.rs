//! 服务层数据传输对象
//!
//! 定义引擎对外暴露的五个操作的输入选项与结果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BadgeError;
use crate::models::{AwardedBy, Badge, ContributorStatistics, CriteriaType, MembershipRole};
use crate::statistics::StatisticsSource;

/// 授予触发来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AwardTrigger {
    /// Webhook 实时路径，携带投递 ID
    #[serde(rename_all = "camelCase")]
    Webhook { delivery_id: String },
    /// 人工触发
    Manual,
    /// 批量评估或内部调用
    System,
}

impl AwardTrigger {
    pub fn awarded_by(&self) -> AwardedBy {
        match self {
            Self::Webhook { .. } => AwardedBy::Webhook,
            Self::Manual => AwardedBy::Manual,
            Self::System => AwardedBy::System,
        }
    }

    /// 写入授予记录的附加信息
    pub fn metadata(&self) -> serde_json::Value {
        match self {
            Self::Webhook { delivery_id } => serde_json::json!({
                "trigger": "webhook",
                "deliveryId": delivery_id,
            }),
            Self::Manual => serde_json::json!({ "trigger": "manual" }),
            Self::System => serde_json::json!({ "trigger": "system" }),
        }
    }
}

/// 授予选项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardOptions {
    /// 跳过已授予集合，对所有徽章重新评估（写入仍由唯一约束去重）
    pub force_recheck: bool,
    /// 统计来源，缺省使用配置值
    pub source: Option<StatisticsSource>,
}

/// 单项错误
///
/// 批量操作中某一项失败时记录，不中断其余项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    /// 出错的条目（徽章 ID、仓库全名等）
    pub item: String,
    pub code: String,
    pub message: String,
}

impl ItemError {
    pub fn new(item: impl Into<String>, error: &BadgeError) -> Self {
        Self {
            item: item.into(),
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// 新授予的徽章
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardedBadge {
    pub award_id: i64,
    pub badge_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub criteria_type: CriteriaType,
    pub criteria_value: i32,
    /// 满足阈值的指标值
    pub actual_value: i64,
    pub awarded_at: DateTime<Utc>,
}

/// 单个用户的授予结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResult {
    pub user_id: i64,
    pub repository_id: i64,
    pub statistics: ContributorStatistics,
    pub newly_awarded: Vec<AwardedBadge>,
    /// 参与评估的徽章数
    pub evaluated_count: usize,
    /// 评估前已持有的徽章数
    pub already_awarded_count: usize,
    pub errors: Vec<ItemError>,
}

impl AwardResult {
    pub fn empty(user_id: i64, repository_id: i64) -> Self {
        Self {
            user_id,
            repository_id,
            ..Default::default()
        }
    }

    pub fn awarded_count(&self) -> usize {
        self.newly_awarded.len()
    }
}

/// 批量授予结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAwardResult {
    pub repository_id: i64,
    pub contributors_evaluated: usize,
    pub total_awarded: usize,
    pub results: Vec<AwardResult>,
    pub errors: Vec<ItemError>,
}

/// 单个徽章的进度
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgress {
    pub badge_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub criteria_type: CriteriaType,
    pub criteria_value: i32,
    pub current_value: i64,
    /// 0-100
    pub percentage: u8,
    pub earned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awarded_at: Option<DateTime<Utc>>,
}

impl BadgeProgress {
    /// 进度百分比，封顶 100；无法计算的指标为 0
    pub fn percentage(badge: &Badge, current_value: i64) -> u8 {
        if !badge.criteria_type.is_evaluable() || badge.criteria_value <= 0 {
            return 0;
        }
        let ratio = current_value.max(0).saturating_mul(100) / i64::from(badge.criteria_value);
        ratio.min(100) as u8
    }
}

/// 用户在仓库中的徽章进度
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgressReport {
    pub user_id: i64,
    pub repository_id: i64,
    pub statistics: ContributorStatistics,
    pub badges: Vec<BadgeProgress>,
    pub earned_count: usize,
}

/// 导入/更新的仓库摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRepository {
    pub repository_id: i64,
    pub github_id: i64,
    pub full_name: String,
    pub role: MembershipRole,
    pub badges_created: usize,
}

/// 批量导入结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub imported: Vec<ImportedRepository>,
    pub updated: Vec<ImportedRepository>,
    pub badges_created: usize,
    pub errors: Vec<ItemError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::badge;

    #[test]
    fn test_trigger_maps_to_awarded_by() {
        let webhook = AwardTrigger::Webhook {
            delivery_id: "d-1".to_string(),
        };
        assert_eq!(webhook.awarded_by(), AwardedBy::Webhook);
        assert_eq!(webhook.metadata()["deliveryId"], "d-1");
        assert_eq!(AwardTrigger::Manual.awarded_by(), AwardedBy::Manual);
        assert_eq!(AwardTrigger::System.awarded_by(), AwardedBy::System);
    }

    #[test]
    fn test_progress_percentage() {
        let prs = badge(1, CriteriaType::Prs, 20);
        assert_eq!(BadgeProgress::percentage(&prs, 0), 0);
        assert_eq!(BadgeProgress::percentage(&prs, 5), 25);
        assert_eq!(BadgeProgress::percentage(&prs, 20), 100);
        assert_eq!(BadgeProgress::percentage(&prs, 57), 100);

        let stars = badge(2, CriteriaType::Stars, 10);
        assert_eq!(BadgeProgress::percentage(&stars, 10), 0);
    }

    #[test]
    fn test_award_options_deserialize_defaults() {
        let options: AwardOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.force_recheck);
        assert!(options.source.is_none());

        let options: AwardOptions =
            serde_json::from_str(r#"{"forceRecheck":true,"source":"upstream"}"#).unwrap();
        assert!(options.force_recheck);
        assert_eq!(options.source, Some(StatisticsSource::Upstream));
    }
}
