//! 存储连接器
//!
//! 负责与后端存储建立连接（带重试），并对外只暴露一个“执行聚合查询”的能力。
//! 支持两种后端：
//! - 远程 PostgreSQL（`postgres` feature）
//! - 本地 SQLite 文件

use std::future::Future;

use crate::config::{ConnectionMode, StoreConfig};
use crate::error::{Error, Result};
use crate::types::RawRow;

#[cfg(feature = "postgres")]
mod postgres;
mod retry;
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresSource;
pub use retry::{connect_with_retry, RetryPolicy};
pub use sqlite::SqliteSource;

/// 已建立的存储会话：执行固定的聚合查询
pub trait VoteSource: Send {
    /// 执行 `SELECT vote, COUNT(id) ... GROUP BY vote`，返回原始行
    fn fetch_rows(&mut self) -> impl Future<Output = Result<Vec<RawRow>>> + Send;
}

/// 单次连接尝试
///
/// 重试由 [`connect_with_retry`] 负责，实现方只需尝试一次。
pub trait Connector: Send {
    type Connection: VoteSource + 'static;

    fn connect(&mut self) -> impl Future<Output = Result<Self::Connection>> + Send;
}

/// 按配置选择后端的连接器
#[derive(Debug, Clone)]
pub struct StoreConnector {
    config: StoreConfig,
}

impl StoreConnector {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }
}

/// 已连接的后端
pub enum StoreConnection {
    Sqlite(SqliteSource),
    #[cfg(feature = "postgres")]
    Postgres(PostgresSource),
}

impl Connector for StoreConnector {
    type Connection = StoreConnection;

    async fn connect(&mut self) -> Result<StoreConnection> {
        match &self.config.mode {
            ConnectionMode::Local(path) => {
                let path = path.clone();
                let source = tokio::task::spawn_blocking(move || SqliteSource::open(&path))
                    .await
                    .map_err(|e| Error::Connection(format!("SQLite 打开任务失败: {}", e)))??;
                Ok(StoreConnection::Sqlite(source))
            }
            #[cfg(feature = "postgres")]
            ConnectionMode::Remote => {
                let source = PostgresSource::connect(&self.config).await?;
                Ok(StoreConnection::Postgres(source))
            }
            #[cfg(not(feature = "postgres"))]
            ConnectionMode::Remote => Err(Error::Config(
                "远程连接需要启用 postgres feature".into(),
            )),
        }
    }
}

impl VoteSource for StoreConnection {
    async fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        match self {
            StoreConnection::Sqlite(source) => source.fetch_rows().await,
            #[cfg(feature = "postgres")]
            StoreConnection::Postgres(source) => source.fetch_rows().await,
        }
    }
}

#[cfg(all(test, feature = "postgres"))]
mod tests {
    use std::time::Duration;

    use super::*;

    /// 指向没有服务监听的端口
    fn unreachable_postgres() -> StoreConfig {
        StoreConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            password: "s3cret".to_string(),
            ..StoreConfig::from_lookup(|_| None)
        }
    }

    #[test]
    fn test_remote_describe_hides_password() {
        let config = unreachable_postgres();
        assert_eq!(config.mode, ConnectionMode::Remote);
        assert_eq!(config.describe(), "postgres://postgres@127.0.0.1:1/postgres");
        assert!(!config.describe().contains(&config.password));
    }

    #[tokio::test]
    async fn test_remote_connect_refused() {
        let mut connector = StoreConnector::new(unreachable_postgres());

        match connector.connect().await {
            Ok(_) => panic!("Expected connection failure"),
            Err(e) => assert!(matches!(e, Error::Connection(_)), "unexpected error: {}", e),
        }
    }

    #[tokio::test]
    async fn test_remote_retry_exhausted() {
        let mut connector = StoreConnector::new(unreachable_postgres());
        let policy = RetryPolicy {
            times: 2,
            interval: Duration::from_millis(10),
        };

        match connect_with_retry(&mut connector, &policy).await {
            Ok(_) => panic!("Expected retry exhaustion"),
            Err(e) => assert!(matches!(e, Error::RetryExhausted { attempts: 2 })),
        }
    }
}
