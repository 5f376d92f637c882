//! 实时推送协议定义
//!
//! 通信方式：WebSocket 文本帧，每帧一个 JSON 对象：
//! `{"event": "<事件名>", "data": <负载>}`

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Snapshot;

/// 新连接收到的欢迎语
pub const WELCOME_TEXT: &str = "Welcome!";

/// 推送消息（Server → Viewer）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum Push {
    /// 连接建立后的静态问候
    Message { text: String },

    /// 计票快照，负载为快照的 JSON 文本（如 `"{\"a\":3,\"b\":0}"`）
    Scores(String),
}

impl Push {
    pub fn welcome() -> Self {
        Push::Message {
            text: WELCOME_TEXT.to_string(),
        }
    }

    pub fn scores(snapshot: &Snapshot) -> Result<Self> {
        Ok(Push::Scores(snapshot.to_json()?))
    }

    /// 编码为一个文本帧
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 客户端事件（Viewer → Server）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientEvent {
    /// 加入一个频道
    Subscribe { channel: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_frame() {
        let frame = Push::welcome().to_frame().unwrap();
        assert_eq!(frame, r#"{"event":"message","data":{"text":"Welcome!"}}"#);
    }

    #[test]
    fn test_scores_frame_carries_snapshot_text() {
        let snapshot: Snapshot = [("a".to_string(), 3), ("b".to_string(), 0)]
            .into_iter()
            .collect();
        let frame = Push::scores(&snapshot).unwrap().to_frame().unwrap();
        assert_eq!(frame, r#"{"event":"scores","data":"{\"a\":3,\"b\":0}"}"#);

        let parsed: Push = serde_json::from_str(&frame).unwrap();
        let Push::Scores(text) = parsed else {
            panic!("Expected Scores");
        };
        let decoded: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_parse_subscribe() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"subscribe","data":{"channel":"lobby"}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Subscribe {
                channel: "lobby".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"vote","data":{}}"#).is_err());
    }
}
