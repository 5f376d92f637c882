//! PostgreSQL 后端

use std::time::Duration;

use tokio_postgres::{Client, NoTls};

use super::VoteSource;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::schema::AGGREGATE_QUERY;
use crate::types::RawRow;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// 远程 PostgreSQL 投票库
pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    /// 单次连接尝试；连接驱动在后台任务中运行，进程存活期间不关闭
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(config.host.as_str())
            .port(config.port)
            .dbname(config.database.as_str())
            .user(config.user.as_str())
            .password(config.password.as_bytes())
            .connect_timeout(CONNECT_TIMEOUT);

        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection closed: {}", e);
            }
        });

        tracing::info!("数据库已连接: {}", config.describe());
        Ok(Self { client })
    }
}

impl VoteSource for PostgresSource {
    async fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        let rows = self
            .client
            .query(AGGREGATE_QUERY, &[])
            .await
            .map_err(|e| Error::Query(e.to_string()))?;

        rows.iter()
            .map(|row| -> Result<RawRow> {
                let category: String = row.try_get(0).map_err(|e| Error::Query(e.to_string()))?;
                let count: i64 = row.try_get(1).map_err(|e| Error::Query(e.to_string()))?;
                Ok(RawRow::new(category, count.to_string()))
            })
            .collect()
    }
}
