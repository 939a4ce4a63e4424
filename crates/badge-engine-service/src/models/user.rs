//! 用户实体
//!
//! 用户由注册/会话系统维护，这里只读取引擎需要的身份与凭证字段

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 本地用户
#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// 上游平台的数字 ID
    pub github_id: i64,
    pub username: String,
    /// 上游 API 访问令牌，不对外序列化
    #[serde(skip_serializing, default)]
    #[sqlx(default)]
    pub access_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 是否持有可用于上游 API 的令牌
    pub fn has_credential(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

// 避免令牌出现在日志中
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("github_id", &self.github_id)
            .field("username", &self.username)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(token: Option<&str>) -> User {
        User {
            id: 1,
            github_id: 1001,
            username: "octocat".to_string(),
            access_token: token.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_credential() {
        assert!(user(Some("gho_abc")).has_credential());
        assert!(!user(Some("")).has_credential());
        assert!(!user(None).has_credential());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", user(Some("gho_secret")));
        assert!(!rendered.contains("gho_secret"));
        assert!(rendered.contains("***"));
    }
}
