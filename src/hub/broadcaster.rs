//! 快照广播器
//!
//! 维护连接列表与频道成员索引，将快照推送给所有连接

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::protocol::Push;
use crate::types::Snapshot;

/// 连接 ID
pub type ConnId = u64;

/// 消息发送通道
pub type MessageSender = mpsc::Sender<String>;

/// 快照广播器
pub struct Broadcaster {
    /// 连接通道：ConnId → 发送通道
    senders: RwLock<HashMap<ConnId, MessageSender>>,
    /// 频道成员：频道名 → ConnId 集合
    channels: RwLock<HashMap<String, HashSet<ConnId>>>,
    /// 下一个连接 ID
    next_conn_id: AtomicU64,
}

impl Broadcaster {
    /// 创建新的广播器
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 注册新连接，返回连接 ID
    ///
    /// 注册后立即只向该连接发送一条欢迎消息，与轮询周期无关。
    pub fn register(&self, sender: MessageSender, channel: Option<&str>) -> ConnId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        self.senders.write().insert(conn_id, sender.clone());
        if let Some(channel) = channel {
            self.join(conn_id, channel);
        }

        tracing::debug!("📡 Connection registered: conn_id={}", conn_id);

        match Push::welcome().to_frame() {
            Ok(frame) => deliver(conn_id, &sender, frame),
            Err(e) => tracing::error!("Failed to serialize welcome: {}", e),
        }

        conn_id
    }

    /// 加入频道（连接不存在时忽略）
    pub fn join(&self, conn_id: ConnId, channel: &str) -> bool {
        if !self.senders.read().contains_key(&conn_id) {
            return false;
        }

        self.channels
            .write()
            .entry(channel.to_string())
            .or_default()
            .insert(conn_id);
        tracing::debug!("📡 Joined channel: conn_id={}, channel={}", conn_id, channel);
        true
    }

    /// 注销连接（由传输层在断开时调用）
    pub fn unregister(&self, conn_id: ConnId) {
        self.senders.write().remove(&conn_id);
        self.channels.write().retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });
        tracing::debug!("📡 Connection unregistered: conn_id={}", conn_id);
    }

    /// 广播快照给所有连接（不区分频道，非阻塞，fire-and-forget）
    ///
    /// 返回投递尝试次数。
    pub fn publish(&self, snapshot: &Snapshot) -> usize {
        let targets: Vec<(ConnId, MessageSender)> = {
            let senders = self.senders.read();
            senders.iter().map(|(id, s)| (*id, s.clone())).collect()
        };
        self.fan_out(snapshot, targets)
    }

    /// 只广播给某个频道的成员
    pub fn publish_to_channel(&self, channel: &str, snapshot: &Snapshot) -> usize {
        let targets: Vec<(ConnId, MessageSender)> = {
            let channels = self.channels.read();
            let senders = self.senders.read();

            channels
                .get(channel)
                .map(|members| {
                    members
                        .iter()
                        .filter_map(|id| senders.get(id).map(|s| (*id, s.clone())))
                        .collect()
                })
                .unwrap_or_default()
        };
        self.fan_out(snapshot, targets)
    }

    fn fan_out(&self, snapshot: &Snapshot, targets: Vec<(ConnId, MessageSender)>) -> usize {
        if targets.is_empty() {
            tracing::trace!("📡 No subscribers");
            return 0;
        }

        let message = match Push::scores(snapshot).and_then(|push| push.to_frame()) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to serialize scores: {}", e);
                return 0;
            }
        };

        tracing::trace!("📡 Broadcasting scores: subscribers={}", targets.len());

        let attempts = targets.len();
        for (conn_id, sender) in targets {
            deliver(conn_id, &sender, message.clone());
        }
        attempts
    }

    /// 获取当前连接数
    pub fn connection_count(&self) -> usize {
        self.senders.read().len()
    }

    /// 频道当前成员（升序）
    pub fn channel_members(&self, channel: &str) -> Vec<ConnId> {
        let mut members: Vec<ConnId> = self
            .channels
            .read()
            .get(channel)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            next_conn_id: AtomicU64::new(1),
        }
    }
}

/// 非阻塞发送；慢连接丢消息，已关闭的连接等待传输层注销
fn deliver(conn_id: ConnId, sender: &MessageSender, message: String) {
    if let Err(e) = sender.try_send(message) {
        match e {
            TrySendError::Full(_) => {
                tracing::warn!("📡 Channel full, dropping message: conn_id={}", conn_id);
            }
            TrySendError::Closed(_) => {
                tracing::debug!("📡 Channel closed: conn_id={}", conn_id);
            }
        }
    }
}
