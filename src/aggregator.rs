//! 计票聚合器
//!
//! 按固定间隔执行聚合查询，把结果规整成快照并推送给广播器。
//! 查询失败只记日志，跳过本轮推送，下一轮照常进行。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::hub::Broadcaster;
use crate::store::VoteSource;
use crate::types::{RawRow, Snapshot};

/// 把原始查询结果规整成快照
///
/// 已知类别缺省为 0；结果中的未知类别原样保留；
/// 无法解析为非负整数的计数按 0 处理。
pub fn normalize(rows: &[RawRow], known_categories: &[String]) -> Snapshot {
    let seeded = known_categories.iter().map(|c| (c.clone(), 0));
    let counted = rows
        .iter()
        .map(|row| (row.category.clone(), parse_count(&row.count)));

    // 后写入的覆盖先写入的
    seeded.chain(counted).collect()
}

fn parse_count(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

/// 轮询聚合器，独占存储连接
pub struct Aggregator<S> {
    source: S,
    broadcaster: Arc<Broadcaster>,
    known_categories: Vec<String>,
    interval: Duration,
}

impl<S: VoteSource> Aggregator<S> {
    pub fn new(
        source: S,
        broadcaster: Arc<Broadcaster>,
        known_categories: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            broadcaster,
            known_categories,
            interval,
        }
    }

    /// 执行一轮：查询 → 规整 → 推送
    ///
    /// 查询失败时返回 `None`，本轮不推送。
    pub async fn tick(&mut self) -> Option<Snapshot> {
        match self.source.fetch_rows().await {
            Ok(rows) => {
                let snapshot = normalize(&rows, &self.known_categories);
                let delivered = self.broadcaster.publish(&snapshot);
                tracing::trace!("📊 Scores published: {:?}, subscribers={}", snapshot, delivered);
                Some(snapshot)
            }
            Err(e) => {
                tracing::error!("Error performing query: {}", e);
                None
            }
        }
    }

    /// 永久轮询；每轮结束后等待一个间隔
    pub async fn run(mut self) {
        tracing::info!("🔁 Polling votes every {:?}", self.interval);
        loop {
            self.tick().await;
            sleep(self.interval).await;
        }
    }
}
