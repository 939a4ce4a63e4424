//! 贡献者统计
//!
//! 派生数据，不单独持久化；账本聚合和上游拉取两种策略产出相同结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个用户在单个仓库中的贡献统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorStatistics {
    pub total_prs: i64,
    pub merged_prs: i64,
    pub total_commits: i64,
    pub total_additions: i64,
    pub total_deletions: i64,
    pub first_contribution: Option<DateTime<Utc>>,
    pub last_contribution: Option<DateTime<Utc>>,
}

impl ContributorStatistics {
    /// 空统计（无任何贡献）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 是否存在任何贡献活动
    pub fn has_activity(&self) -> bool {
        self.total_prs > 0 || self.total_commits > 0
    }

    /// 把一个贡献时间点并入首末时间
    pub fn observe(&mut self, at: DateTime<Utc>) {
        self.first_contribution = Some(self.first_contribution.map_or(at, |t| t.min(at)));
        self.last_contribution = Some(self.last_contribution.map_or(at, |t| t.max(at)));
    }
}
