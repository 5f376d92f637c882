//! WebSocket 服务器
//!
//! 接受观众连接，注册到广播器，并转发推送消息

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;

use super::broadcaster::Broadcaster;
use super::handler::Handler;
use crate::error::Result;

/// 每个连接的待发送队列长度，超出后丢弃
const OUTBOUND_CAPACITY: usize = 100;

/// accept 失败后的等待时间
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// WebSocket 推送服务
pub struct HubServer {
    listener: TcpListener,
    broadcaster: Arc<Broadcaster>,
    handler: Arc<Handler>,
}

impl HubServer {
    /// 绑定监听地址
    pub async fn bind<A: ToSocketAddrs>(addr: A, broadcaster: Arc<Broadcaster>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let handler = Arc::new(Handler::new(broadcaster.clone()));
        Ok(Self {
            listener,
            broadcaster,
            handler,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// 接受连接，直到任务被取消
    pub async fn serve(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let broadcaster = self.broadcaster.clone();
                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(broadcaster, handler, stream, peer).await {
                            tracing::debug!("Connection ended with error: peer={}, error={}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    // 例如 EMFILE，稍等再接受
                    tracing::error!("Failed to accept connection: {}", e);
                    sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }
    }
}

/// 处理单个连接
async fn handle_connection(
    broadcaster: Arc<Broadcaster>,
    handler: Arc<Handler>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut frames) = ws.split();

    // 创建消息发送通道
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);

    // 注册连接（会立即排队一条欢迎消息）
    let conn_id = broadcaster.register(tx, None);
    tracing::debug!("📥 New viewer: conn_id={}, peer={}", conn_id, peer);

    // 启动发送任务
    let write_handle = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(Message::text(msg)).await.is_err() {
                break;
            }
        }
    });

    // 读取客户端事件
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => handler.handle_frame(conn_id, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Read failed: conn_id={}, error={}", conn_id, e);
                break;
            }
        }
    }

    // 清理
    broadcaster.unregister(conn_id);
    write_handle.abort();
    tracing::debug!("📤 Viewer left: conn_id={}", conn_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_error_backoff_is_short_but_nonzero() {
        assert!(ACCEPT_ERROR_BACKOFF > Duration::ZERO);
        assert!(ACCEPT_ERROR_BACKOFF <= Duration::from_secs(1));
    }
}
