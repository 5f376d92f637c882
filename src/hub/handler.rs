//! 客户端事件处理器

use std::sync::Arc;

use super::broadcaster::{Broadcaster, ConnId};
use crate::protocol::ClientEvent;

/// 客户端事件处理器
pub struct Handler {
    broadcaster: Arc<Broadcaster>,
}

impl Handler {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self { broadcaster }
    }

    /// 处理一个文本帧；无法识别的帧只记日志，不回复错误
    pub fn handle_frame(&self, conn_id: ConnId, frame: &str) {
        match serde_json::from_str::<ClientEvent>(frame) {
            Ok(event) => self.handle(conn_id, event),
            Err(e) => {
                tracing::warn!("Ignoring unrecognized frame: conn_id={}, error={}", conn_id, e);
            }
        }
    }

    pub fn handle(&self, conn_id: ConnId, event: ClientEvent) {
        match event {
            ClientEvent::Subscribe { channel } => {
                self.broadcaster.join(conn_id, &channel);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_subscribe_frame_joins_channel() {
        let broadcaster = Broadcaster::new();
        let handler = Handler::new(broadcaster.clone());

        let (tx, _rx) = mpsc::channel(10);
        let conn_id = broadcaster.register(tx, None);

        handler.handle_frame(conn_id, r#"{"event":"subscribe","data":{"channel":"results"}}"#);
        assert_eq!(broadcaster.channel_members("results"), vec![conn_id]);
    }

    #[test]
    fn test_garbage_frame_is_ignored() {
        let broadcaster = Broadcaster::new();
        let handler = Handler::new(broadcaster.clone());

        let (tx, mut rx) = mpsc::channel(10);
        let conn_id = broadcaster.register(tx, None);
        rx.try_recv().unwrap();

        handler.handle_frame(conn_id, "not json");
        handler.handle_frame(conn_id, r#"{"event":"subscribe","data":{}}"#);

        assert!(rx.try_recv().is_err());
        assert_eq!(broadcaster.connection_count(), 1);
    }
}
