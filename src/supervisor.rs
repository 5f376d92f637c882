//! 进程监督器
//!
//! 启动顺序：先开放广播中心接受观众，再连接存储，连接成功后启动轮询。
//!
//! 状态机：`Starting → Connecting → Polling`（稳定态），
//! 或 `Starting → Connecting → Failed`（重试耗尽，继续服务但不再推送快照）。

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::aggregator::Aggregator;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::hub::{Broadcaster, HubServer};
use crate::store::{connect_with_retry, Connector};

/// 进程级状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Starting,
    Connecting,
    Polling,
    Failed,
}

/// 进程监督器，持有连接器与广播器
pub struct Supervisor<C> {
    config: ServerConfig,
    connector: C,
    broadcaster: Arc<Broadcaster>,
    state: watch::Sender<State>,
}

impl<C> Supervisor<C>
where
    C: Connector + 'static,
{
    pub fn new(config: ServerConfig, connector: C) -> Self {
        let (state, _) = watch::channel(State::Starting);
        Self {
            config,
            connector,
            broadcaster: Broadcaster::new(),
            state,
        }
    }

    pub fn broadcaster(&self) -> Arc<Broadcaster> {
        self.broadcaster.clone()
    }

    /// 订阅状态变化
    pub fn state(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// 连接存储；成功则启动轮询任务并返回其句柄
    ///
    /// 重试耗尽时进入 `Failed`，返回 `None`。
    pub async fn start_polling(&mut self) -> Option<JoinHandle<()>> {
        self.state.send_replace(State::Connecting);

        match connect_with_retry(&mut self.connector, &self.config.retry).await {
            Ok(conn) => {
                self.state.send_replace(State::Polling);
                let aggregator = Aggregator::new(
                    conn,
                    self.broadcaster.clone(),
                    self.config.known_categories.clone(),
                    self.config.poll_interval,
                );
                Some(tokio::spawn(aggregator.run()))
            }
            Err(e) => {
                self.state.send_replace(State::Failed);
                tracing::error!("Scores will not be served: {}", e);
                None
            }
        }
    }

    /// 在配置端口上运行，直到收到中断信号
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.port));
        let server = HubServer::bind(addr, self.broadcaster.clone()).await?;
        self.serve(server).await
    }

    /// 使用已绑定的服务器运行，直到收到中断信号
    pub async fn serve(mut self, server: HubServer) -> Result<()> {
        tracing::info!("🚀 App running on {}", server.local_addr()?);

        // 观众可以在存储连上之前接入
        let mut server_handle = tokio::spawn(server.serve());

        let polling = tokio::select! {
            polling = self.start_polling() => polling,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到中断信号，准备退出...");
                server_handle.abort();
                return Ok(());
            }
        };

        let result = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到中断信号，准备退出...");
                Ok(())
            }
            joined = &mut server_handle => match joined {
                Ok(served) => served,
                Err(e) => Err(anyhow::Error::from(e).into()),
            },
        };

        server_handle.abort();
        if let Some(handle) = polling {
            handle.abort();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use crate::error::Error;
    use crate::store::{RetryPolicy, VoteSource};
    use crate::types::RawRow;

    struct FixedRows;

    impl VoteSource for FixedRows {
        async fn fetch_rows(&mut self) -> crate::error::Result<Vec<RawRow>> {
            Ok(vec![RawRow::new("a", "3")])
        }
    }

    struct FlakyConnector {
        failures: u32,
        attempts: Arc<AtomicU32>,
    }

    impl Connector for FlakyConnector {
        type Connection = FixedRows;

        async fn connect(&mut self) -> crate::error::Result<FixedRows> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                Err(Error::Connection("refused".into()))
            } else {
                Ok(FixedRows)
            }
        }
    }

    fn config(times: u32) -> ServerConfig {
        ServerConfig {
            port: 0,
            poll_interval: Duration::from_secs(1),
            retry: RetryPolicy {
                times,
                interval: Duration::from_secs(1),
            },
            known_categories: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_then_polls() {
        let attempts = Arc::new(AtomicU32::new(0));
        let connector = FlakyConnector {
            failures: 2,
            attempts: attempts.clone(),
        };
        let mut supervisor = Supervisor::new(config(10), connector);
        let state = supervisor.state();
        assert_eq!(*state.borrow(), State::Starting);

        // 连接建立之前就可以注册观众
        let (tx, mut rx) = mpsc::channel(10);
        supervisor.broadcaster().register(tx, None);
        assert!(rx.recv().await.unwrap().contains("Welcome!"));

        let handle = supervisor.start_polling().await.unwrap();
        assert_eq!(*state.borrow(), State::Polling);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        let scores = rx.recv().await.unwrap();
        assert_eq!(scores, r#"{"event":"scores","data":"{\"a\":3,\"b\":0}"}"#);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_without_polling() {
        let attempts = Arc::new(AtomicU32::new(0));
        let connector = FlakyConnector {
            failures: u32::MAX,
            attempts: attempts.clone(),
        };
        let mut supervisor = Supervisor::new(config(4), connector);
        let state = supervisor.state();

        let (tx, mut rx) = mpsc::channel(10);
        supervisor.broadcaster().register(tx, None);
        rx.recv().await.unwrap();

        assert!(supervisor.start_polling().await.is_none());
        assert_eq!(*state.borrow(), State::Failed);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);

        // 没有轮询任务，不会有快照
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
