//! Webhook 网关服务
//!
//! 接收上游 Webhook 投递，并向同一部署内的 CRUD 层暴露徽章引擎操作。

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use badge_engine::repository::{
    AwardRepository, BadgeRepository, MembershipRepository, PullRequestRepository,
    RepoRepository, UserRepository, WebhookEventRepository,
};
use badge_engine::statistics::StatisticsProvider;
use badge_engine::upstream::UpstreamClient;
use badge_engine::{
    AwardService, BadgeCatalog, BadgeQueryService, ContributionAwarder, GithubClient,
    ImportService, LedgerStatisticsProvider, StatisticsProviders, StatisticsSource,
    UpstreamStatisticsProvider, WebhookGateway,
};
use contrib_shared::{config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tracing::{info, warn};
use webhook_gateway::{AppState, build_router};

const SERVICE_NAME: &str = "webhook-gateway-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());

    if config.webhook.secret.is_none() && config.is_production() {
        anyhow::bail!("生产环境必须配置 webhook.secret");
    }

    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }
    let pool = db.pool().clone();

    // 仓储
    let users = Arc::new(UserRepository::new(pool.clone()));
    let repositories = Arc::new(RepoRepository::new(pool.clone()));
    let pull_requests = Arc::new(PullRequestRepository::new(pool.clone()));
    let catalog = Arc::new(BadgeCatalog::new(Arc::new(BadgeRepository::new(pool.clone()))));
    let awards = Arc::new(AwardRepository::new(pool.clone()));

    // 统计来源
    let upstream: Arc<dyn UpstreamClient> = Arc::new(GithubClient::new(&config.upstream)?);
    let ledger: Arc<dyn StatisticsProvider> =
        Arc::new(LedgerStatisticsProvider::new(pull_requests.clone()));
    let upstream_stats: Arc<dyn StatisticsProvider> = Arc::new(UpstreamStatisticsProvider::new(
        upstream.clone(),
        users.clone(),
        config.upstream.max_pages,
    ));
    let default_source = StatisticsSource::from_str(&config.engine.statistics_source)
        .unwrap_or_else(|_| {
            warn!(
                value = %config.engine.statistics_source,
                "未知的统计来源配置，使用 ledger"
            );
            StatisticsSource::Ledger
        });
    let statistics = StatisticsProviders::new(ledger)
        .with_upstream(upstream_stats)
        .with_default_source(default_source);
    info!(?default_source, "统计提供者已初始化");

    // 服务
    let award_service = Arc::new(AwardService::new(
        users.clone(),
        repositories.clone(),
        catalog.clone(),
        awards.clone(),
        Arc::new(MembershipRepository::new(pool.clone())),
        statistics.clone(),
    ));
    let import_service = Arc::new(ImportService::new(
        pool.clone(),
        users.clone(),
        repositories.clone(),
        upstream,
    ));
    let query_service = Arc::new(BadgeQueryService::new(
        users.clone(),
        repositories.clone(),
        catalog,
        awards,
        statistics,
    ));
    let awarder: Arc<dyn ContributionAwarder> = award_service.clone();
    let webhook = Arc::new(WebhookGateway::new(
        config.webhook.secret.clone(),
        Arc::new(WebhookEventRepository::new(pool.clone())),
        users,
        repositories,
        pull_requests,
        awarder,
    ));

    if config.internal_api.token.is_none() {
        warn!("未配置内部接口令牌，/internal 路由将拒绝所有请求");
    }

    let state = AppState {
        db: db.clone(),
        webhook,
        awards: award_service,
        imports: import_service,
        queries: query_service,
        internal_token: config.internal_api.token.clone().map(Arc::from),
    };

    let app = build_router(
        state,
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
