//! Webhook 事件载荷
//!
//! 按事件类型头分派的标签联合：已知的贡献类事件使用严格结构，
//! 其余已知类型只解析仓库/发送者等公共字段，未知类型保留原始载荷以向前兼容。

use serde::{Deserialize, Serialize};

use crate::error::{BadgeError, Result};
use crate::upstream::{UpstreamAccount, UpstreamPullRequest};

/// 载荷中的仓库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRepository {
    pub id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub owner: Option<UpstreamAccount>,
}

/// 所有事件共有的字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub repository: Option<PayloadRepository>,
    #[serde(default)]
    pub sender: Option<UpstreamAccount>,
}

impl EventEnvelope {
    /// 逐字段宽松解析，无法识别的字段置空
    fn lenient(raw: &serde_json::Value) -> Self {
        fn field<T: serde::de::DeserializeOwned>(raw: &serde_json::Value, name: &str) -> Option<T> {
            raw.get(name).and_then(|v| T::deserialize(v).ok())
        }

        Self {
            action: field(raw, "action"),
            repository: field(raw, "repository"),
            sender: field(raw, "sender"),
        }
    }
}

/// pull_request 事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: UpstreamPullRequest,
    pub repository: PayloadRepository,
    pub sender: UpstreamAccount,
}

/// push 事件中的提交作者
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushCommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// push 事件中的提交
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushCommit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<PushCommitAuthor>,
}

/// push 事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    pub repository: PayloadRepository,
    #[serde(default)]
    pub sender: Option<UpstreamAccount>,
}

/// 只记录、不触发评估的已知事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Issues,
    Release,
    Star,
    Fork,
    Create,
    Delete,
    Watch,
    CommitComment,
}

impl ActivityKind {
    fn from_event_type(event_type: &str) -> Option<Self> {
        let kind = match event_type {
            "issues" => Self::Issues,
            "release" => Self::Release,
            "star" => Self::Star,
            "fork" => Self::Fork,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "watch" => Self::Watch,
            "commit_comment" => Self::CommitComment,
            _ => return None,
        };
        Some(kind)
    }
}

/// 已分类的事件
#[derive(Debug, Clone)]
pub enum WebhookPayload {
    PullRequest(Box<PullRequestEvent>),
    Push(PushEvent),
    Activity {
        kind: ActivityKind,
        envelope: EventEnvelope,
    },
    /// 未识别的事件类型，宽松接受
    Unknown {
        event_type: String,
        envelope: EventEnvelope,
    },
}

/// 解析后的事件：分类结果与原始 JSON
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub payload: WebhookPayload,
    pub raw: serde_json::Value,
}

impl ParsedEvent {
    /// 按事件类型解析请求体
    ///
    /// 请求体不是 JSON 对象，或 pull_request/push 不符合其结构时返回 `MalformedPayload`；
    /// 其余类型的公共字段缺失或形状不符时只留空，不拒绝
    pub fn parse(event_type: &str, body: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| BadgeError::MalformedPayload(e.to_string()))?;
        if !raw.is_object() {
            return Err(BadgeError::MalformedPayload("载荷必须是 JSON 对象".to_string()));
        }

        let payload = match event_type {
            "pull_request" => WebhookPayload::PullRequest(Box::new(strict(&raw)?)),
            "push" => WebhookPayload::Push(strict(&raw)?),
            other => {
                let envelope = EventEnvelope::lenient(&raw);
                match ActivityKind::from_event_type(other) {
                    Some(kind) => WebhookPayload::Activity { kind, envelope },
                    None => WebhookPayload::Unknown {
                        event_type: other.to_string(),
                        envelope,
                    },
                }
            }
        };

        Ok(Self { payload, raw })
    }

    /// 用于审计记录的公共字段
    pub fn envelope(&self) -> EventEnvelope {
        match &self.payload {
            WebhookPayload::PullRequest(event) => EventEnvelope {
                action: Some(event.action.clone()),
                repository: Some(event.repository.clone()),
                sender: Some(event.sender.clone()),
            },
            WebhookPayload::Push(event) => EventEnvelope {
                action: None,
                repository: Some(event.repository.clone()),
                sender: event.sender.clone(),
            },
            WebhookPayload::Activity { envelope, .. } | WebhookPayload::Unknown { envelope, .. } => {
                envelope.clone()
            }
        }
    }
}

fn strict<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<T> {
    T::deserialize(raw).map_err(|e| BadgeError::MalformedPayload(e.to_string()))
}
