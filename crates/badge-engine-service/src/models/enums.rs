//! 徽章引擎枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 徽章判定指标
///
/// 只有 `Prs` 与 `Commits` 能被当前统计数据计算，其余为预留扩展点，
/// 评估时恒为不满足
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum CriteriaType {
    /// 已合并 PR 数
    Prs,
    /// 提交数
    Commits,
    Issues,
    Reviews,
    Stars,
    Forks,
}

impl CriteriaType {
    /// 当前引擎是否能计算该指标
    pub fn is_evaluable(&self) -> bool {
        matches!(self, Self::Prs | Self::Commits)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prs => "prs",
            Self::Commits => "commits",
            Self::Issues => "issues",
            Self::Reviews => "reviews",
            Self::Stars => "stars",
            Self::Forks => "forks",
        }
    }
}

/// 授予来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum AwardedBy {
    /// 批量评估或内部调用
    #[default]
    System,
    /// 人工触发
    Manual,
    /// Webhook 实时路径
    Webhook,
}

impl AwardedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Manual => "manual",
            Self::Webhook => "webhook",
        }
    }
}

/// 成员角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum MembershipRole {
    /// 仓库所有者，拥有徽章管理权限
    Owner,
    #[default]
    Contributor,
}

/// 只读权限
pub const PERMISSION_READ: &str = "read";
/// 徽章管理权限
pub const PERMISSION_MANAGE_BADGES: &str = "manage_badges";
/// 手动同步权限
pub const PERMISSION_SYNC: &str = "sync";

impl MembershipRole {
    /// 由角色派生的权限集合
    pub fn permissions(&self) -> Vec<String> {
        let perms: &[&str] = match self {
            Self::Owner => &[PERMISSION_READ, PERMISSION_MANAGE_BADGES, PERMISSION_SYNC],
            Self::Contributor => &[PERMISSION_READ],
        };
        perms.iter().map(|p| p.to_string()).collect()
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_type_serde() {
        let json = serde_json::to_string(&CriteriaType::Prs).unwrap();
        assert_eq!(json, "\"prs\"");

        let parsed: CriteriaType = serde_json::from_str("\"commits\"").unwrap();
        assert_eq!(parsed, CriteriaType::Commits);
    }

    #[test]
    fn test_only_prs_and_commits_are_evaluable() {
        assert!(CriteriaType::Prs.is_evaluable());
        assert!(CriteriaType::Commits.is_evaluable());
        for inert in [
            CriteriaType::Issues,
            CriteriaType::Reviews,
            CriteriaType::Stars,
            CriteriaType::Forks,
        ] {
            assert!(!inert.is_evaluable());
        }
    }

    #[test]
    fn test_role_permissions() {
        let owner = MembershipRole::Owner.permissions();
        assert!(owner.contains(&PERMISSION_MANAGE_BADGES.to_string()));
        assert!(owner.contains(&PERMISSION_SYNC.to_string()));

        let contributor = MembershipRole::Contributor.permissions();
        assert_eq!(contributor, vec![PERMISSION_READ.to_string()]);
    }
}
