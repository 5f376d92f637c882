//! 启动连接重试
//!
//! 固定间隔、有限次数。次数耗尽视为致命的启动失败。

use std::time::Duration;

use tokio::time::sleep;

use super::Connector;
use crate::error::{Error, Result};

/// 连接重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（0 按 1 处理）
    pub times: u32,
    /// 两次尝试之间的固定间隔
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            times: 1000,
            interval: Duration::from_secs(1),
        }
    }
}

/// 反复尝试连接，直到成功或重试次数耗尽
///
/// 每次失败都会记录日志；最后一次失败后不再等待。
pub async fn connect_with_retry<C: Connector>(
    connector: &mut C,
    policy: &RetryPolicy,
) -> Result<C::Connection> {
    let times = policy.times.max(1);

    for attempt in 1..=times {
        match connector.connect().await {
            Ok(conn) => {
                tracing::info!("✅ Connected to db (attempt {})", attempt);
                return Ok(conn);
            }
            Err(e) => {
                tracing::warn!("⏳ Waiting for db ({}/{}): {}", attempt, times, e);
                if attempt < times {
                    sleep(policy.interval).await;
                }
            }
        }
    }

    tracing::error!("❌ Giving up on db connection after {} attempts", times);
    Err(Error::RetryExhausted { attempts: times })
}
