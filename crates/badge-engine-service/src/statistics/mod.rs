//! 贡献者统计提供者
//!
//! 两种策略产出相同结构的 [`ContributorStatistics`]：
//!
//! - `ledger`：聚合本地 PR 账本，确定且廉价，只反映已接收的事件
//! - `upstream`：实时分页拉取上游 API
//!
//! 调用方（授予引擎）不关心使用了哪种策略。

pub(crate) mod ledger;
mod upstream;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BadgeError, Result};
use crate::models::{ContributorStatistics, Repository, User};

pub use ledger::{LedgerStatisticsProvider, aggregate_pull_requests};
pub use upstream::UpstreamStatisticsProvider;

/// 统计提供者接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait StatisticsProvider: Send + Sync {
    /// 单个用户在仓库中的统计
    ///
    /// 失败时返回错误而不是部分聚合的结果
    async fn get_statistics(
        &self,
        repository: &Repository,
        user: &User,
    ) -> Result<ContributorStatistics>;

    /// 仓库内每个可解析到本地用户的贡献者的统计，键为本地用户 ID
    async fn get_repository_statistics(
        &self,
        repository: &Repository,
    ) -> Result<HashMap<i64, ContributorStatistics>>;
}

/// 统计来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsSource {
    #[default]
    Ledger,
    Upstream,
}

impl FromStr for StatisticsSource {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ledger" => Ok(Self::Ledger),
            "upstream" => Ok(Self::Upstream),
            other => Err(BadgeError::Validation(format!("未知的统计来源: {other}"))),
        }
    }
}

/// 按来源选择统计提供者
#[derive(Clone)]
pub struct StatisticsProviders {
    ledger: Arc<dyn StatisticsProvider>,
    upstream: Option<Arc<dyn StatisticsProvider>>,
    default_source: StatisticsSource,
}

impl StatisticsProviders {
    pub fn new(ledger: Arc<dyn StatisticsProvider>) -> Self {
        Self {
            ledger,
            upstream: None,
            default_source: StatisticsSource::Ledger,
        }
    }

    pub fn with_upstream(mut self, upstream: Arc<dyn StatisticsProvider>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn with_default_source(mut self, source: StatisticsSource) -> Self {
        self.default_source = source;
        self
    }

    /// 选择提供者；请求 upstream 但未配置时回退到账本
    pub fn select(&self, requested: Option<StatisticsSource>) -> &Arc<dyn StatisticsProvider> {
        match requested.unwrap_or(self.default_source) {
            StatisticsSource::Ledger => &self.ledger,
            StatisticsSource::Upstream => match &self.upstream {
                Some(provider) => provider,
                None => {
                    warn!("未配置上游统计提供者，回退到账本聚合");
                    &self.ledger
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_source_parse() {
        assert_eq!(
            "ledger".parse::<StatisticsSource>().unwrap(),
            StatisticsSource::Ledger
        );
        assert_eq!(
            " Upstream ".parse::<StatisticsSource>().unwrap(),
            StatisticsSource::Upstream
        );
        assert!("graphql".parse::<StatisticsSource>().is_err());
    }

    #[test]
    fn test_select_falls_back_to_ledger() {
        let ledger: Arc<dyn StatisticsProvider> = Arc::new(MockStatisticsProvider::new());
        let providers = StatisticsProviders::new(ledger.clone())
            .with_default_source(StatisticsSource::Upstream);

        assert!(Arc::ptr_eq(providers.select(None), &ledger));
        assert!(Arc::ptr_eq(
            providers.select(Some(StatisticsSource::Upstream)),
            &ledger
        ));
    }

    #[test]
    fn test_select_upstream_when_configured() {
        let ledger: Arc<dyn StatisticsProvider> = Arc::new(MockStatisticsProvider::new());
        let upstream: Arc<dyn StatisticsProvider> = Arc::new(MockStatisticsProvider::new());
        let providers = StatisticsProviders::new(ledger.clone()).with_upstream(upstream.clone());

        assert!(Arc::ptr_eq(providers.select(None), &ledger));
        assert!(Arc::ptr_eq(
            providers.select(Some(StatisticsSource::Upstream)),
            &upstream
        ));
    }
}
