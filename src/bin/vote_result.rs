//! vote-result - 实时计票推送服务
//!
//! 负责：
//! - 连接投票库（失败时重试）
//! - 每秒聚合一次票数
//! - 通过 WebSocket 推送给所有观众

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vote_result::{AppConfig, StoreConnector, Supervisor};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("vote_result=info".parse()?))
        .init();

    tracing::info!("🚀 vote-result v{}", env!("CARGO_PKG_VERSION"));

    // 解析配置
    let config = AppConfig::from_env();
    tracing::info!("Store: {}", config.store.describe());

    let connector = StoreConnector::new(config.store);
    Supervisor::new(config.server, connector).run().await?;

    tracing::info!("👋 vote-result exiting");
    Ok(())
}
