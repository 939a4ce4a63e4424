//! 仓库相关实体定义
//!
//! 包含本地仓库记录、上游快照以及成员关系

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::MembershipRole;
use super::user::User;

/// 已导入的仓库
///
/// 由首次导入创建，只由同步更新快照字段，不做物理删除
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: i64,
    /// 上游数字 ID（不可变、唯一）
    pub github_id: i64,
    pub name: String,
    pub full_name: String,
    pub owner_login: String,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub language: Option<String>,
    /// public / private
    pub visibility: String,
    pub stars_count: i32,
    pub forks_count: i32,
    pub default_branch: String,
    pub topics: Vec<String>,
    #[sqlx(default)]
    pub html_url: Option<String>,
    /// 所属本地用户
    pub owner_id: i64,
    /// 软删除标记
    pub active: bool,
    pub last_sync_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 快照中的仓库所有者
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOwner {
    pub login: String,
    pub id: i64,
}

/// 快照中当前令牌持有者的权限
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// 上游仓库快照
///
/// 字段与上游 REST API 的仓库对象保持一致，导入与同步都以它为输入
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RepositorySnapshot {
    #[validate(range(min = 1, message = "上游仓库 ID 必须为正数"))]
    pub id: i64,
    #[validate(length(min = 1, max = 255, message = "仓库名不能为空"))]
    pub name: String,
    #[validate(length(min = 1, max = 512, message = "仓库全名不能为空"))]
    pub full_name: String,
    pub owner: SnapshotOwner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub stargazers_count: i32,
    #[serde(default)]
    pub forks_count: i32,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub permissions: Option<SnapshotPermissions>,
}

fn default_branch() -> String {
    "main".to_string()
}

impl RepositorySnapshot {
    pub fn visibility(&self) -> &'static str {
        if self.private { "private" } else { "public" }
    }

    /// 导入用户对该仓库的角色
    ///
    /// 快照所有者就是该用户，或快照授予其 admin 权限时为 owner，否则为 contributor
    pub fn role_for(&self, user: &User) -> MembershipRole {
        let is_admin = self.permissions.as_ref().is_some_and(|p| p.admin);
        if self.owner.id == user.github_id || is_admin {
            MembershipRole::Owner
        } else {
            MembershipRole::Contributor
        }
    }
}

/// 用户与仓库的成员关系
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRepositoryMembership {
    pub id: i64,
    pub user_id: i64,
    pub repository_id: i64,
    pub role: MembershipRole,
    /// 由角色派生
    pub permissions: Vec<String>,
    pub active: bool,
    pub last_accessed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRepositoryMembership {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.active && self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::PERMISSION_MANAGE_BADGES;

    fn snapshot(owner_id: i64, admin: bool) -> RepositorySnapshot {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "widgets",
            "full_name": "acme/widgets",
            "owner": { "login": "acme", "id": owner_id },
            "stargazers_count": 12,
            "permissions": { "admin": admin, "push": true, "pull": true }
        }))
        .unwrap()
    }

    fn user(github_id: i64) -> User {
        User {
            id: 1,
            github_id,
            username: "octocat".to_string(),
            access_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_defaults() {
        let snap = snapshot(7, false);
        assert_eq!(snap.default_branch, "main");
        assert_eq!(snap.visibility(), "public");
        assert!(snap.topics.is_empty());
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn test_role_for_owner_by_identity() {
        assert_eq!(snapshot(1001, false).role_for(&user(1001)), MembershipRole::Owner);
    }

    #[test]
    fn test_role_for_owner_by_admin_permission() {
        assert_eq!(snapshot(7, true).role_for(&user(1001)), MembershipRole::Owner);
    }

    #[test]
    fn test_role_for_contributor() {
        assert_eq!(
            snapshot(7, false).role_for(&user(1001)),
            MembershipRole::Contributor
        );
    }

    #[test]
    fn test_snapshot_validation_rejects_empty_name() {
        let mut snap = snapshot(7, false);
        snap.name = String::new();
        assert!(snap.validate().is_err());

        let mut snap = snapshot(7, false);
        snap.id = 0;
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_membership_permission_requires_active() {
        let mut membership = UserRepositoryMembership {
            id: 1,
            user_id: 1,
            repository_id: 1,
            role: MembershipRole::Owner,
            permissions: MembershipRole::Owner.permissions(),
            active: true,
            last_accessed_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(membership.has_permission(PERMISSION_MANAGE_BADGES));
        membership.active = false;
        assert!(!membership.has_permission(PERMISSION_MANAGE_BADGES));
    }
}
