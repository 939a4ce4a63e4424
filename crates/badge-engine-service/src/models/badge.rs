//! 徽章定义实体
//!
//! 徽章作用域为单个仓库，(criteria_type, criteria_value) 在仓库内唯一

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::CriteriaType;

/// 徽章定义
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    pub repository_id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub icon: Option<String>,
    pub criteria_type: CriteriaType,
    /// 正整数阈值
    pub criteria_value: i32,
    pub active: bool,
    /// 系统播种的默认徽章
    pub is_default: bool,
    #[sqlx(default)]
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建徽章参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub criteria_type: CriteriaType,
    pub criteria_value: i32,
    pub is_default: bool,
}

impl NewBadge {
    fn default_badge(
        name: &str,
        description: &str,
        icon: &str,
        criteria_type: CriteriaType,
        criteria_value: i32,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            criteria_type,
            criteria_value,
            is_default: true,
        }
    }
}

/// 默认徽章集合
///
/// 内容固定，按阈值从低到高排列
pub fn default_badge_set() -> Vec<NewBadge> {
    vec![
        NewBadge::default_badge(
            "First Contribution",
            "首个 PR 被合并",
            "seedling",
            CriteriaType::Prs,
            1,
        ),
        NewBadge::default_badge(
            "Regular Contributor",
            "累计 5 个 PR 被合并",
            "star",
            CriteriaType::Prs,
            5,
        ),
        NewBadge::default_badge(
            "Core Contributor",
            "累计 20 个 PR 被合并",
            "trophy",
            CriteriaType::Prs,
            20,
        ),
        NewBadge::default_badge(
            "Commit Champion",
            "累计 50 次提交",
            "fire",
            CriteriaType::Commits,
            50,
        ),
    ]
}
