//! SQLite 后端

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};

use super::VoteSource;
use crate::error::{Error, Result};
use crate::schema::{AGGREGATE_QUERY, UPSERT_VOTE_SQL, VOTES_SCHEMA_SQL};
use crate::types::RawRow;

/// 本地 SQLite 投票库
#[derive(Clone)]
pub struct SqliteSource {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSource {
    /// 打开（必要时创建）数据库文件并初始化 votes 表
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(VOTES_SCHEMA_SQL)?;

        tracing::info!("数据库已连接: {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 记录一票（同一 voter 重复投票时覆盖）
    pub fn record_vote(&self, voter_id: &str, vote: &str) -> Result<()> {
        self.conn.lock().execute(UPSERT_VOTE_SQL, params![voter_id, vote])?;
        Ok(())
    }

    fn query_rows(conn: &Connection) -> rusqlite::Result<Vec<RawRow>> {
        let mut stmt = conn.prepare_cached(AGGREGATE_QUERY)?;
        let rows = stmt.query_map([], |row| {
            let category = value_to_text(row.get_ref(0)?);
            let count = value_to_text(row.get_ref(1)?);
            Ok(RawRow { category, count })
        })?;
        rows.collect()
    }
}

impl VoteSource for SqliteSource {
    async fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || Self::query_rows(&conn.lock()))
            .await
            .map_err(|e| Error::Query(format!("查询任务失败: {}", e)))?
            .map_err(|e| Error::Query(e.to_string()))
    }
}

/// SQLite 是弱类型的，统一转成文本交给上层解析
fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}
