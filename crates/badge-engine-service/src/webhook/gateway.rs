//! Webhook 接入网关
//!
//! 单次投递的处理流程：
//!
//! ```text
//! received → signature-verified → classified → persisted → dispatched
//! ```
//!
//! 签名校验通过前不解析请求体。事件落库后即视为处理成功，
//! 引擎评估失败只记录日志，不影响对上游的应答。重复投递不再记录，
//! 但 pull_request 事件会重放账本写入，首次投递中失败的写入由上游重投补齐。

use std::sync::Arc;

use contrib_shared::observability::metrics;
use tracing::{debug, info, instrument, warn};

use super::payload::{EventEnvelope, ParsedEvent, PullRequestEvent, WebhookPayload};
use super::signature;
use crate::error::{BadgeError, Result};
use crate::models::{NewWebhookEvent, PullRequestUpsert};
use crate::repository::{
    PullRequestRepositoryTrait, RepoRepositoryTrait, UserRepositoryTrait,
    WebhookEventRepositoryTrait,
};
use crate::service::{AwardTrigger, ContributionAwarder};

pub const SIGNATURE_HEADER: &str = "X-Signature-256";
pub const EVENT_TYPE_HEADER: &str = "X-Event-Type";
pub const DELIVERY_ID_HEADER: &str = "X-Delivery-Id";

/// 一次入站投递
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub event_type: Option<String>,
    pub delivery_id: Option<String>,
    pub signature: Option<String>,
    /// 未经任何处理的原始请求体
    pub body: Vec<u8>,
}

/// 处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// 事件已记录
    Processed {
        event_id: i64,
        event_type: String,
        /// 是否触发了引擎评估
        dispatched: bool,
    },
    /// 投递 ID 已处理过
    Duplicate { delivery_id: String },
}

/// Webhook 网关
pub struct WebhookGateway {
    secret: Option<Vec<u8>>,
    events: Arc<dyn WebhookEventRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    repositories: Arc<dyn RepoRepositoryTrait>,
    pull_requests: Arc<dyn PullRequestRepositoryTrait>,
    awarder: Arc<dyn ContributionAwarder>,
}

impl WebhookGateway {
    pub fn new(
        secret: Option<String>,
        events: Arc<dyn WebhookEventRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        repositories: Arc<dyn RepoRepositoryTrait>,
        pull_requests: Arc<dyn PullRequestRepositoryTrait>,
        awarder: Arc<dyn ContributionAwarder>,
    ) -> Self {
        let secret = secret
            .filter(|s| !s.is_empty())
            .map(String::into_bytes);
        if secret.is_none() {
            warn!("未配置 Webhook 密钥，所有投递都将被拒绝");
        }

        Self {
            secret,
            events,
            users,
            repositories,
            pull_requests,
            awarder,
        }
    }

    /// 处理一次投递
    #[instrument(skip(self, request), fields(
        event_type = request.event_type.as_deref().unwrap_or(""),
        delivery_id = request.delivery_id.as_deref().unwrap_or(""),
    ))]
    pub async fn handle(&self, request: WebhookRequest) -> Result<WebhookOutcome> {
        let event_type_label = request.event_type.as_deref().unwrap_or("unknown").to_string();

        if let Err(e) = self.authenticate(&request) {
            metrics::record_webhook_delivery(&event_type_label, "unauthorized");
            warn!("Webhook 签名校验失败");
            return Err(e);
        }

        let event_type = required(request.event_type.as_deref(), EVENT_TYPE_HEADER)?;
        let delivery_id = required(request.delivery_id.as_deref(), DELIVERY_ID_HEADER)?;

        let event = match ParsedEvent::parse(event_type, &request.body) {
            Ok(event) => event,
            Err(e) => {
                metrics::record_webhook_delivery(event_type, "malformed");
                warn!(error = %e, "Webhook 载荷解析失败");
                return Err(e);
            }
        };

        let envelope = event.envelope();
        let user_id = self.resolve_user(&envelope).await;

        let new_event = NewWebhookEvent {
            delivery_id: delivery_id.to_string(),
            event_type: event_type.to_string(),
            action: envelope.action.clone(),
            repository_github_id: envelope.repository.as_ref().map(|r| r.id),
            repository_full_name: envelope
                .repository
                .as_ref()
                .and_then(|r| r.full_name.clone()),
            sender_login: envelope.sender.as_ref().map(|s| s.login.clone()),
            sender_github_id: envelope.sender.as_ref().map(|s| s.id),
            user_id,
            payload: event.raw.clone(),
        };

        let Some(record) = self.events.record(&new_event).await? else {
            metrics::record_webhook_delivery(event_type, "duplicate");
            // 审计记录只有一条；PR 账本写入与评估都幂等，重放以补上首次投递中失败的写入
            let replayed = matches!(event.payload, WebhookPayload::PullRequest(_))
                && self.dispatch(&event.payload, delivery_id).await;
            info!(replayed, "重复投递，不再记录");
            return Ok(WebhookOutcome::Duplicate {
                delivery_id: delivery_id.to_string(),
            });
        };

        let dispatched = self.dispatch(&event.payload, delivery_id).await;

        metrics::record_webhook_delivery(event_type, "processed");
        info!(event_id = record.id, dispatched, "Webhook 事件已记录");
        Ok(WebhookOutcome::Processed {
            event_id: record.id,
            event_type: event_type.to_string(),
            dispatched,
        })
    }

    fn authenticate(&self, request: &WebhookRequest) -> Result<()> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(BadgeError::AuthenticationFailure)?;
        let header = request
            .signature
            .as_deref()
            .ok_or(BadgeError::AuthenticationFailure)?;

        if signature::verify(secret, &request.body, header) {
            Ok(())
        } else {
            Err(BadgeError::AuthenticationFailure)
        }
    }

    /// 尽力解析关联的本地用户：先发送者，再仓库所有者
    async fn resolve_user(&self, envelope: &EventEnvelope) -> Option<i64> {
        let candidates = [
            envelope.sender.as_ref().map(|s| s.id),
            envelope
                .repository
                .as_ref()
                .and_then(|r| r.owner.as_ref())
                .map(|o| o.id),
        ];

        for github_id in candidates.into_iter().flatten() {
            match self.users.find_by_github_id(github_id).await {
                Ok(Some(user)) => return Some(user.id),
                Ok(None) => {}
                Err(e) => {
                    warn!(github_id, error = %e, "解析 Webhook 关联用户失败");
                    return None;
                }
            }
        }
        None
    }

    /// 将贡献类事件交给引擎；返回是否调用了引擎
    async fn dispatch(&self, payload: &WebhookPayload, delivery_id: &str) -> bool {
        match payload {
            WebhookPayload::PullRequest(event) => {
                match self.handle_pull_request(event, delivery_id).await {
                    Ok(dispatched) => dispatched,
                    Err(e) => {
                        warn!(
                            number = event.pull_request.number,
                            error = %e,
                            "pull_request 事件处理失败"
                        );
                        false
                    }
                }
            }
            WebhookPayload::Push(event) => {
                debug!(
                    repository_github_id = event.repository.id,
                    git_ref = %event.git_ref,
                    commits = event.commits.len(),
                    "收到 push 事件"
                );
                false
            }
            WebhookPayload::Activity { kind, envelope } => {
                debug!(
                    ?kind,
                    repository_github_id = envelope.repository.as_ref().map(|r| r.id),
                    sender = envelope.sender.as_ref().map(|s| s.login.as_str()),
                    "收到仓库活动事件"
                );
                false
            }
            WebhookPayload::Unknown {
                event_type,
                envelope,
            } => {
                info!(
                    event_type = %event_type,
                    repository_github_id = envelope.repository.as_ref().map(|r| r.id),
                    sender = envelope.sender.as_ref().map(|s| s.login.as_str()),
                    "收到未识别的事件类型"
                );
                false
            }
        }
    }

    /// 写入 PR 账本并触发作者的实时评估
    async fn handle_pull_request(&self, event: &PullRequestEvent, delivery_id: &str) -> Result<bool> {
        let Some(repository) = self
            .repositories
            .find_by_github_id(event.repository.id)
            .await?
        else {
            info!(
                repository_github_id = event.repository.id,
                "仓库未导入，跳过评估"
            );
            return Ok(false);
        };

        let pr = &event.pull_request;
        let author = match self.users.find_by_github_id(pr.user.id).await? {
            Some(user) => Some(user),
            None => self.users.find_by_login(&pr.user.login).await?,
        };

        let upsert = PullRequestUpsert {
            repository_id: repository.id,
            user_id: author.as_ref().map(|u| u.id),
            github_id: pr.id,
            number: pr.number,
            title: pr.title.clone(),
            author_login: pr.user.login.clone(),
            author_github_id: Some(pr.user.id),
            state: pr.state.clone(),
            merged: pr.is_merged(),
            commits: pr.commits,
            additions: pr.additions,
            deletions: pr.deletions,
            opened_at: pr.created_at,
            merged_at: pr.merged_at,
            closed_at: pr.closed_at,
        };
        self.pull_requests.upsert(&upsert).await?;

        let Some(author) = author else {
            info!(author = %pr.user.login, "PR 作者不是本地用户，跳过评估");
            return Ok(false);
        };

        let trigger = AwardTrigger::Webhook {
            delivery_id: delivery_id.to_string(),
        };
        match self
            .awarder
            .check_and_award(author.id, repository.id, trigger)
            .await
        {
            Ok(result) => info!(
                user_id = author.id,
                repository_id = repository.id,
                awarded = result.awarded_count(),
                "Webhook 触发评估完成"
            ),
            Err(e) => warn!(
                user_id = author.id,
                repository_id = repository.id,
                error = %e,
                "Webhook 触发评估失败"
            ),
        }
        Ok(true)
    }
}

fn required<'a>(value: Option<&'a str>, header: &'static str) -> Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(BadgeError::MissingHeader(header))
}
